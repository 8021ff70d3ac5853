//! # Till Database Handle
//!
//! Opens the SQLite file, applies the schema, and hands out the stores and
//! engines that share one pool and one write gate.
//!
//! ```text
//! DbConfig::new(path).stock_policy(..)
//!     -> Database::new(config).await      open + migrate
//!         pool        shared by readers and the writer
//!         write_gate  one writer at a time
//!
//! db.products() / db.sales() / db.transactions() / db.analytics()
//!     each one clones the pool and the gate
//! ```
//!
//! ## WAL Mode
//! Readers see the last committed state while a sale is being written, so
//! analytics never waits on checkout and never sees half a sale.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::analytics::AnalyticsEngine;
use crate::engine::{StockPolicy, TransactionEngine};
use crate::error::{DbError, DbResult};
use crate::migrations::{self, MigrationStatus};
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::unit_of_work::UnitOfWork;

const MEMORY_PATH: &str = ":memory:";

/// How the till's database is opened.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/tally.db")
///     .max_connections(5)
///     .stock_policy(StockPolicy::RejectOversell);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, or `:memory:` for a private scratch database.
    pub database_path: PathBuf,

    /// Pool ceiling. Default: 5, plenty for one till.
    pub max_connections: u32,

    /// Connections kept open while idle. Default: 1
    pub min_connections: u32,

    /// Wait for a free pooled connection. Default: 30s
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps them forever.
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// Maximum lifetime of a pooled connection. `None` keeps them forever.
    /// Default: 30 minutes
    pub max_lifetime: Option<Duration>,

    /// How long SQLite waits on a lock held by another process before the
    /// statement fails with "database is locked".
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Apply pending schema changes while opening. Default: true
    pub run_migrations: bool,

    /// What a sale does when it would take stock below zero.
    /// Default: [`StockPolicy::AllowNegative`]
    pub stock_policy: StockPolicy,
}

impl DbConfig {
    /// Defaults for a file-backed till database; the file is created on
    /// first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
            stock_policy: StockPolicy::default(),
        }
    }

    /// Pool ceiling.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Idle floor.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the SQLite busy timeout.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Skip or apply migrations in [`Database::new`].
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Sets the stock policy used by the transaction engine.
    pub fn stock_policy(mut self, policy: StockPolicy) -> Self {
        self.stock_policy = policy;
        self
    }

    /// A private in-memory database, mostly for tests.
    ///
    /// An in-memory database lives inside one connection, so the pool holds
    /// exactly one and never recycles it.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            max_lifetime: None,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
            stock_policy: StockPolicy::default(),
        }
    }

    /// True when this config points at a private in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.database_path == Path::new(MEMORY_PATH)
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
        };

        Ok(options
            // Readers don't block the writer, the writer doesn't block readers
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

/// Main database handle providing store and engine access.
///
/// Cloning is cheap; clones share the pool and the write gate. Construct it
/// once at startup and hand it to whatever needs it.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,

    /// Held by every unit of work and every catalog write.
    write_gate: Arc<Mutex<()>>,

    stock_policy: StockPolicy,
}

impl Database {
    /// Opens the pool (WAL, NORMAL synchronous, foreign keys on) and applies
    /// migrations unless the config turns them off.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening till database"
        );

        let connect_options = config.connect_options()?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            stock_policy = ?config.stock_policy,
            "Database pool created"
        );

        let db = Database {
            pool,
            write_gate: Arc::new(Mutex::new(())),
            stock_policy: config.stock_policy,
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies every embedded migration not yet recorded.
    pub async fn run_migrations(&self) -> DbResult<()> {
        debug!("Applying schema migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Schema up to date");
        Ok(())
    }

    /// Returns embedded vs applied migration counts.
    pub async fn migration_status(&self) -> DbResult<MigrationStatus> {
        migrations::migration_status(&self.pool).await
    }

    /// Raw pool. Writes issued here bypass the write gate.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn write_gate(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.write_gate)
    }

    /// Stock policy the transaction engine was configured with.
    pub fn stock_policy(&self) -> StockPolicy {
        self.stock_policy
    }

    /// Catalog store.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone(), Arc::clone(&self.write_gate))
    }

    /// Ledger store.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone(), Arc::clone(&self.write_gate))
    }

    /// Sale and void engine.
    pub fn transactions(&self) -> TransactionEngine {
        TransactionEngine::new(
            self.pool.clone(),
            Arc::clone(&self.write_gate),
            self.stock_policy,
        )
    }

    /// Read-only reporting.
    pub fn analytics(&self) -> AnalyticsEngine {
        AnalyticsEngine::new(self.pool.clone())
    }

    /// Opens a unit of work: waits for the write gate, then begins a
    /// transaction.
    pub async fn unit_of_work(&self) -> DbResult<UnitOfWork> {
        UnitOfWork::begin(&self.pool, Arc::clone(&self.write_gate)).await
    }

    /// Shuts the pool; later store calls fail.
    pub async fn close(&self) {
        info!("Closing till database");
        self.pool.close().await;
    }

    /// True when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
