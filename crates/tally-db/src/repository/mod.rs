//! # Repository Module
//!
//! The two stores behind Tally POS.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductRepository (catalog)        SaleRepository (ledger)            │
//! │  ├── add / update / delete          ├── insert                         │
//! │  ├── get_all / search / count       ├── get_by_id                      │
//! │  └── get_by_id / get_by_barcode     ├── set_status                     │
//! │                                     └── get_all / get_recent           │
//! │                                                                         │
//! │  Row-level helpers (pub(crate)) take any sqlx executor, so the same     │
//! │  SQL runs on the pool or inside a UnitOfWork transaction.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and search
//! - [`SaleRepository`](sale::SaleRepository) - Sale rows and status

pub mod product;
pub mod sale;
