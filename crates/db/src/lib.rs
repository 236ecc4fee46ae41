//! SQLite connection handle and migration runner for the library service.
//!
//! The [`Database`] handle is built once at startup and passed down to the
//! modules that need it. Tests construct one with [`Database::in_memory`].

use std::str::FromStr;
use std::time::Duration;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    ConnectOptions, Executor,
};
use thiserror::Error;

/// Errors raised by the database layer.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("invalid database url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("migration '{module}/{id}' failed: {source}")]
    Migration {
        module: String,
        id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Query(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Schema change contributed by a module.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Shared handle to the relational store.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool against `url` (e.g. `sqlite://library.db?mode=rwc`).
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|source| DbError::InvalidUrl {
                url: url.to_string(),
                source,
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(30))
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(DbError::Connect)?;

        tracing::info!(target: "library-db", %url, max_connections, "database pool ready");

        Ok(Self { pool })
    }

    /// Private in-memory database, used by tests.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|source| DbError::InvalidUrl {
                url: "sqlite::memory:".to_string(),
                source,
            })?
            .disable_statement_logging();

        // Every connection to `:memory:` opens its own database, so keep exactly one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(DbError::Connect)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply migrations that have not been recorded yet.
    ///
    /// Migrations are tracked in `_migrations` by `module/id`, so running the
    /// same list twice is a no-op. Returns how many were applied.
    pub async fn migrate(&self, migrations: &[(String, Migration)]) -> Result<usize> {
        self.pool
            .execute(
                r#"
                CREATE TABLE IF NOT EXISTS _migrations (
                    name TEXT PRIMARY KEY,
                    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )
                "#,
            )
            .await?;

        let mut applied = 0;
        for (module, migration) in migrations {
            let name = format!("{}/{}", module, migration.id);

            let exists: Option<String> =
                sqlx::query_scalar("SELECT name FROM _migrations WHERE name = ?")
                    .bind(&name)
                    .fetch_optional(&self.pool)
                    .await?;
            if exists.is_some() {
                tracing::debug!(target: "library-db", migration = %name, "already applied");
                continue;
            }

            let wrap = |source| DbError::Migration {
                module: module.clone(),
                id: migration.id.to_string(),
                source,
            };

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(migration.up)
                .execute(&mut *tx)
                .await
                .map_err(wrap)?;
            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(&name)
                .execute(&mut *tx)
                .await
                .map_err(wrap)?;
            tx.commit().await?;

            tracing::info!(target: "library-db", migration = %name, "migration applied");
            applied += 1;
        }

        Ok(applied)
    }

    /// Wait for checked-out connections and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widgets() -> Vec<(String, Migration)> {
        vec![(
            "widgets".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE widgets (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
            },
        )]
    }

    #[tokio::test]
    async fn migrate_applies_once() {
        let db = Database::in_memory().await.unwrap();

        assert_eq!(db.migrate(&widgets()).await.unwrap(), 1);
        assert_eq!(db.migrate(&widgets()).await.unwrap(), 0);

        let recorded: Vec<String> = sqlx::query_scalar("SELECT name FROM _migrations")
            .fetch_all(db.pool())
            .await
            .unwrap();
        assert_eq!(recorded, vec!["widgets/001_init".to_string()]);
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let db = Database::in_memory().await.unwrap();
        let broken = vec![(
            "broken".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE oops (",
            },
        )];

        let err = db.migrate(&broken).await.unwrap_err();
        assert!(matches!(err, DbError::Migration { ref module, .. } if module == "broken"));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
