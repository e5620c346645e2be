use async_trait::async_trait;
use axum::Router;

/// Context handed to modules during initialization and start
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Schema migration contributed by a module
#[derive(Debug, Clone)]
pub struct Migration {
    /// Identifier unique within the owning module, e.g. `001_create_books`
    pub id: &'static str,
    /// SQL applied once; may contain several statements
    pub up: &'static str,
}

/// Lifecycle contract for every application module
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module, also used as its mount path segment
    fn name(&self) -> &'static str;

    /// Called once at startup, after migrations have run
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes mounted under `{api_prefix}/{module_name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment (`paths` and `components.schemas`) merged into the
    /// server-wide document. Paths are relative to the module mount point.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Migrations in the order they must be applied
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Called after every module has been initialized
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called during shutdown, in reverse registration order
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
