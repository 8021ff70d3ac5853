//! # tally-db: Database Layer for Tally POS
//!
//! This crate owns the catalog and the sales ledger, and every operation
//! that has to change both at once.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  Bridge command (createSale)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   TransactionEngine ──► UnitOfWork ──┬──► products (stock)      │   │
//! │  │   (sale / void)        (gate + tx)   └──► sales (row, status)   │   │
//! │  │                                                                 │   │
//! │  │   AnalyticsEngine ──► read transaction ──► sales                │   │
//! │  │   ProductRepository / SaleRepository ──► single-table ops       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, write gate and the [`Database`] handle
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog and ledger stores
//! - [`unit_of_work`] - One gated transaction spanning both stores
//! - [`engine`] - Sale creation and voiding
//! - [`analytics`] - Revenue, order counts and ledger listings
//! - [`legacy_import`] - One-off copy of an older till database
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//! use tally_core::{CartItem, Discount};
//!
//! let db = Database::new(DbConfig::new("path/to/tally.db")).await?;
//!
//! let receipt = db
//!     .transactions()
//!     .create_sale(&[CartItem::new(1, "Tea", 250, 2)], Some(Discount::percent(10)))
//!     .await?;
//!
//! let today = db.analytics().today_stats().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod engine;
pub mod error;
pub mod legacy_import;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use analytics::AnalyticsEngine;
pub use engine::{StockPolicy, TransactionEngine};
pub use error::{DbError, DbResult};
pub use legacy_import::ImportSummary;
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
