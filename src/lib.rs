//! Library catalog application
//!
//! Wires settings, the SQLite store, and the application modules into the
//! HTTP server.

pub mod modules;
pub mod utils;

use std::future::Future;

use anyhow::Context;
use library_db::Database;
use library_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Re-export commonly used types
pub use modules::*;

/// Registry with every application module registered
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Apply pending migrations and initialize modules against `db`
pub async fn prepare(
    registry: &ModuleRegistry,
    settings: &Settings,
    db: &Database,
) -> anyhow::Result<()> {
    let applied = db
        .migrate(&registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;
    tracing::info!(applied, "migrations up to date");

    let ctx = InitCtx { settings, db };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;
    Ok(())
}

/// Run the service until `shutdown` resolves
pub async fn run<F>(settings: Settings, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let db = Database::connect(&settings.database.url, settings.database.max_connections)
        .await
        .context("failed to open database")?;

    let registry = registry();
    prepare(&registry, &settings, &db).await?;

    let served = library_http::start_server(&registry, &settings, shutdown).await;

    registry.stop_modules().await?;
    db.close().await;

    served
}
