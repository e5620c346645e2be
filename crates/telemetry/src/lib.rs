//! Tracing subscriber bootstrap.

use shelf_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` when set, otherwise the configured level.
fn env_filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global tracing subscriber.
///
/// Returns `false` if a subscriber was already installed (tests, embedding).
pub fn init(settings: &TelemetrySettings) -> bool {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(settings));

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(
            target: "shelf-telemetry",
            format = ?settings.log_format,
            level = %settings.log_level,
            "telemetry initialized"
        );
    }

    installed
}
