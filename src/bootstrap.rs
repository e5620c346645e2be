//! Process bootstrap: database, module registry, migrations, HTTP server.

use std::future::Future;

use anyhow::Context;
use axum::Router;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

use crate::modules;

/// A wired application: settings, the pool, and the registered modules
pub struct App {
    pub settings: Settings,
    pub pool: SqlitePool,
    pub registry: ModuleRegistry,
}

/// Connect to the database and register every module. Nothing is migrated
/// or started yet.
pub async fn prepare(settings: Settings) -> anyhow::Result<App> {
    let pool = shelf_db::connect(&settings.database).await?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &pool).context("failed to register modules")?;

    Ok(App {
        settings,
        pool,
        registry,
    })
}

impl App {
    /// Apply pending module migrations, returning how many ran
    pub async fn migrate(&self) -> anyhow::Result<usize> {
        let migrations = self.registry.collect_migrations();
        shelf_db::migrate(&self.pool, &migrations)
            .await
            .context("failed to apply migrations")
    }

    /// The full HTTP router for this application
    pub fn router(&self) -> Router {
        shelf_http::build_router(&self.registry, &self.settings)
    }
}

/// Run the service until `shutdown` resolves, then stop modules and close
/// the pool.
pub async fn run<F>(settings: Settings, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "shelf bootstrap starting"
    );

    let app = prepare(settings).await?;

    let applied = app.migrate().await?;
    tracing::info!(applied, "migrations complete");

    let ctx = InitCtx {
        settings: &app.settings,
    };
    app.registry.init_all(&ctx).await?;
    app.registry.start_all(&ctx).await?;

    tracing::info!("shelf bootstrap complete");

    let served = shelf_http::start_server(&app.registry, &app.settings, shutdown).await;

    app.registry.stop_all().await?;
    app.pool.close().await;

    served
}
