pub mod books;

use std::sync::Arc;

use shelf_kernel::ModuleRegistry;
use sqlx::SqlitePool;

/// Register every application module, wired to the shared pool
pub fn register_all(registry: &mut ModuleRegistry, pool: &SqlitePool) -> anyhow::Result<()> {
    let book_store = Arc::new(books::store::SqliteBookStore::new(pool.clone()));
    registry.register(books::create_module(book_store))?;
    Ok(())
}
