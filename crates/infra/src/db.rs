//! Connection pool creation and configuration for SQLite.
//!
//! ```text
//! DbConfig::new(url) ──► Database::connect(config) ──► SqlitePool + migrations
//!                                                        │
//!                     repo::* functions take &mut SqliteConnection
//!                     (a pooled connection or an open transaction)
//! ```

use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::migrations;

/// Database configuration.
///
/// ```rust,ignore
/// let config = DbConfig::new("sqlite://ledgerly.db?mode=rwc").max_connections(5);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite URL. `sqlite::memory:` gives a private, ephemeral database.
    pub url: String,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Time to wait for a free connection.
    /// Default: 30 seconds
    pub acquire_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        DbConfig {
            url: url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    pub fn in_memory() -> Self {
        DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Database handle shared by request handlers.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Creates the connection pool and runs migrations (if enabled).
    ///
    /// Foreign keys are enforced. File databases use WAL journaling.
    /// In-memory databases are pinned to one long-lived connection, since every
    /// new SQLite connection to `:memory:` would see an empty database.
    pub async fn connect(config: DbConfig) -> StoreResult<Self> {
        info!(url = %config.url, "Initializing database connection");

        let in_memory = config.is_in_memory();
        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?
            .foreign_keys(true)
            .create_if_missing(true);
        if !in_memory {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        let max_connections = if in_memory { 1 } else { config.max_connections.max(1) };
        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(config.acquire_timeout);
        if in_memory {
            pool_options = pool_options.min_connections(1).idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections, "Database pool created");

        let db = Database { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    /// Fresh, migrated in-memory database.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect(DbConfig::in_memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// A pooled connection for read paths and single-statement writes.
    pub async fn acquire(&self) -> StoreResult<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    /// Start a transaction for multi-row writes.
    pub async fn begin(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Cheap liveness check.
    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
