//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  Register startup                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path).lock_timeout(..) ← Configure pool settings        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ├── readers run in parallel (WAL)                                │
//! │       └── writers queue on BEGIN IMMEDIATE for up to lock_timeout      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Serialization
//! Every ledger transaction starts with `BEGIN IMMEDIATE`, taking the write
//! lock up front. A second writer waits in SQLite's busy handler for
//! `lock_timeout`, then fails with [`DbError::Busy`](crate::DbError::Busy).
//! Two registers on the same file therefore never interleave writes.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::event::EventRepository;
use crate::repository::ledger::LedgerService;
use crate::repository::product::ProductRepository;
use crate::repository::settings::SettingsRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/stand/stand.db")
///     .max_connections(5)
///     .lock_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5 (sufficient for a local POS app)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// How long a writer waits for the database lock before giving up
    /// with `Busy`. Applied as SQLite's `busy_timeout`.
    /// Default: 5 seconds
    pub lock_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// ## Arguments
    /// * `path` - Path to the SQLite database file. Will be created if it doesn't exist.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = DbConfig::new("./data/stand.db");
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            lock_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the write-lock wait.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let config = DbConfig::in_memory();
    /// let db = Database::new(config).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            lock_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cloning is cheap (the pool is reference counted), so command handlers
/// take the repositories they need by value:
///
/// ```rust,ignore
/// let sale = db.ledger().create_sale(PaymentMethod::Cash, &lines).await?;
/// let snapshot = db.settings().snapshot().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite for optimal POS performance:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled
    ///    - busy_timeout = `lock_timeout`
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    ///
    /// ## Arguments
    /// * `config` - Database configuration
    ///
    /// ## Returns
    /// * `Ok(Database)` - Ready-to-use database handle
    /// * `Err(DbError)` - Connection or migration failed
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = DbConfig::new("./stand.db");
    /// let db = Database::new(config).await?;
    /// ```
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // Build connection options
        // sqlite://path creates file if not exists
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            // WAL mode: Better concurrent read performance
            // Readers don't block writers, writers don't block readers
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL synchronous: Good balance of durability and speed
            // Data is safe from corruption, may lose last transaction on crash
            .synchronous(SqliteSynchronous::Normal)
            // Enable foreign key constraints
            // SQLite has them disabled by default for backwards compatibility
            .foreign_keys(true)
            // Writers wait this long for the lock before SQLITE_BUSY
            .busy_timeout(config.lock_timeout)
            // Create file if it doesn't exist
            .create_if_missing(true);

        debug!("Connection options configured");

        // Build the pool
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            lock_timeout_ms = config.lock_timeout.as_millis() as u64,
            "Database pool created"
        );

        let db = Database { pool };

        // Run migrations if enabled
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations.
    ///
    /// ## What This Does
    /// - Applies all pending migrations in order
    /// - Tracks applied migrations in `_sqlx_migrations` table
    /// - Idempotent: safe to run multiple times
    ///
    /// ## When To Call
    /// - Automatically called by `new()` if `run_migrations` is true
    /// - Manually call when migrations are disabled in config
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// ## Usage
    /// For advanced queries not covered by repositories.
    /// Prefer using repository methods when available.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the product catalog repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the active event lookup.
    pub fn events(&self) -> EventRepository {
        EventRepository::new(self.pool.clone())
    }

    /// Returns the ledger service (sales, deposit refunds, reversals).
    ///
    /// ## Example
    /// ```rust,ignore
    /// let refund_id = db.ledger().refund_deposit(3, 150).await?;
    /// ```
    pub fn ledger(&self) -> LedgerService {
        LedgerService::new(self.pool.clone())
    }

    /// Returns the settings store.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Closes the database connection pool.
    ///
    /// ## When To Call
    /// - On application shutdown
    /// - When switching databases (rare)
    ///
    /// ## Note
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Writes a consistent copy of the database to `target`.
    ///
    /// Runs `VACUUM INTO`, which reads inside one transaction, so a sale
    /// committing meanwhile is either fully in the copy or not at all. The
    /// copy is a plain SQLite file that `DbConfig::new(target)` opens.
    ///
    /// ## Returns
    /// * `Ok(bytes)` - Size of the written file
    /// * `Err(DbError::BackupTargetExists)` - `target` is already there
    pub async fn backup(&self, target: impl AsRef<Path>) -> DbResult<u64> {
        let target = target.as_ref();
        let target_display = target.display().to_string();

        if tokio::fs::try_exists(target)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
        {
            return Err(DbError::BackupTargetExists(target_display));
        }

        sqlx::query("VACUUM INTO ?1")
            .bind(target.to_string_lossy().into_owned())
            .execute(&self.pool)
            .await?;

        let bytes = tokio::fs::metadata(target)
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
            .len();

        info!(path = %target_display, bytes, "Database backup written");
        Ok(bytes)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use stand_core::{CartLine, PaymentMethod, TaxRate};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_backup_copies_ledger() {
        let dir = TempDir::new().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("stand.db")))
            .await
            .unwrap();
        let sale = db
            .ledger()
            .create_sale(
                PaymentMethod::Cash,
                &[CartLine::new("Pommes", 350, 2, TaxRate::from_bps(700))],
            )
            .await
            .unwrap();

        let target = dir.path().join("backup.db");
        let bytes = db.backup(&target).await.unwrap();
        assert!(bytes > 0);

        let copy = Database::new(DbConfig::new(&target)).await.unwrap();
        let order = copy.ledger().get_order(sale.order_id).await.unwrap().unwrap();
        assert_eq!(order.total_cents, 700);
        assert_eq!(copy.ledger().get_items(sale.order_id).await.unwrap().len(), 1);
        copy.close().await;

        assert!(matches!(
            db.backup(&target).await,
            Err(DbError::BackupTargetExists(_))
        ));
    }

    #[tokio::test]
    async fn test_backup_of_in_memory_database() {
        let dir = TempDir::new().unwrap();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let target = dir.path().join("memory.db");
        db.backup(&target).await.unwrap();

        let copy = Database::new(DbConfig::new(&target)).await.unwrap();
        let event = copy.events().active_event().await.unwrap();
        assert_eq!(event.name, stand_core::DEFAULT_EVENT_NAME);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .lock_timeout(Duration::from_millis(250));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.lock_timeout, Duration::from_millis(250));
        assert_eq!(DbConfig::new("x.db").lock_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_migrations_seed_event_and_settings() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let event = db.events().active_event().await.unwrap();
        assert_eq!(event.name, stand_core::DEFAULT_EVENT_NAME);

        let snapshot = db.settings().snapshot().await.unwrap();
        assert_eq!(snapshot, stand_core::SettingsSnapshot::default());

        // Running again is a no-op
        db.run_migrations().await.unwrap();
        let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(events, 1);
    }
}
