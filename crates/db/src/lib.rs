//! SQLite connection pool factory and module migration runner.

use std::str::FromStr;

use anyhow::Context;
use shelf_kernel::{settings::DatabaseSettings, Migration};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _shelf_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Open a connection pool for the configured database.
///
/// File databases are created when missing. In-memory databases live only as
/// long as their connection, so they are pinned to one connection that never
/// idles out.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if is_in_memory(&settings.url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(settings.max_connections.max(1))
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to database '{}'", settings.url))?;

    tracing::info!(target: "shelf-db", url = %settings.url, "database pool ready");

    Ok(pool)
}

/// Apply every migration not yet recorded in `_shelf_migrations`.
///
/// Each migration runs in its own transaction together with its bookkeeping
/// row. Returns the number of migrations applied by this call.
pub async fn migrate(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::query(MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .with_context(|| "failed to create migrations table")?;

    let mut applied = 0;

    for (module, migration) in migrations {
        let already_applied: Option<(String,)> =
            sqlx::query_as("SELECT id FROM _shelf_migrations WHERE module = ? AND id = ?")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(pool)
                .await
                .with_context(|| format!("failed to read migration state for '{}'", module))?;

        if already_applied.is_some() {
            tracing::debug!(
                target: "shelf-db",
                module = %module,
                migration = migration.id,
                "migration already applied"
            );
            continue;
        }

        let mut tx = pool.begin().await?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration '{}/{}' failed", module, migration.id))?;

        sqlx::query("INSERT INTO _shelf_migrations (module, id) VALUES (?, ?)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .with_context(|| format!("failed to commit migration '{}/{}'", module, migration.id))?;

        tracing::info!(
            target: "shelf-db",
            module = %module,
            migration = migration.id,
            "migration applied"
        );
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget_migrations() -> Vec<(String, Migration)> {
        vec![
            (
                "widgets".to_string(),
                Migration {
                    id: "001_init",
                    up: "CREATE TABLE widgets (id TEXT PRIMARY KEY); CREATE INDEX widgets_id ON widgets(id);",
                },
            ),
            (
                "widgets".to_string(),
                Migration {
                    id: "002_name",
                    up: "ALTER TABLE widgets ADD COLUMN name TEXT;",
                },
            ),
        ]
    }

    #[tokio::test]
    async fn test_migrate_applies_pending_once() {
        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();
        let migrations = widget_migrations();

        assert_eq!(migrate(&pool, &migrations).await.unwrap(), 2);
        assert_eq!(migrate(&pool, &migrations).await.unwrap(), 0);

        sqlx::query("INSERT INTO widgets (id, name) VALUES ('w1', 'sprocket')")
            .execute(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_migration_is_not_recorded() {
        let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();
        let broken = vec![(
            "widgets".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE;",
            },
        )];

        assert!(migrate(&pool, &broken).await.is_err());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _shelf_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_memory_urls_are_detected() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file.db?mode=memory"));
        assert!(!is_in_memory("sqlite://shelf.db"));
    }
}
