use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::StoreResult;

/// Schema and seed data, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
    info!(available = MIGRATOR.migrations.len(), "Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}
