use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

/// Operate the shelf book records service
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations and serve HTTP until interrupted
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;

    match cli.command {
        Command::Serve => {
            shelf_telemetry::init(&settings.telemetry);
            shelf_app::run(settings, shelf_http::shutdown_signal()).await
        }
        Command::Migrate => {
            shelf_telemetry::init(&settings.telemetry);
            let app = shelf_app::prepare(settings).await?;
            let applied = app.migrate().await?;
            app.pool.close().await;
            println!("applied {} migration(s)", applied);
            Ok(())
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .with_context(|| "failed to render settings")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}
