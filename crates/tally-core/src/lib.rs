//! # tally-core: Pure Business Logic for Tally POS
//!
//! Everything in this crate is deterministic: the same cart and discount
//! always price to the same total, the same ledger always flattens to the
//! same export rows. No database, no clock, no network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Presentation process (out of scope)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON lines                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-bridge commands                        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │   types · money · pricing · line_items · calendar · export     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   tally-db: stores, unit of work, transaction + analytics       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, CartItem, Sale, Discount, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Subtotal and discount application
//! - [`line_items`] - Versioned codec for the sale line-item snapshot
//! - [`calendar`] - Local calendar-day bounds and stored timestamp format
//! - [`export`] - Flattening sales into tabular export rows
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::pricing::price_cart;
//! use tally_core::{CartItem, Discount};
//!
//! let cart = vec![
//!     CartItem::new(1, "Cold Brew", 500, 2),
//!     CartItem::new(2, "Bagel", 1000, 1),
//! ];
//!
//! let priced = price_cart(&cart, Some(&Discount::percent(10))).unwrap();
//! assert_eq!(priced.subtotal.cents(), 2000);
//! assert_eq!(priced.total.cents(), 1800);
//! ```

pub mod calendar;
pub mod error;
pub mod export;
pub mod line_items;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum number of lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart line.
///
/// Guards against a scanner repeat or a fat-fingered 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Number of sales returned by the recent-sales listing when the caller
/// does not ask for a specific amount.
pub const DEFAULT_RECENT_LIMIT: u32 = 10;

/// Largest page the catalog search will serve.
pub const MAX_PAGE_SIZE: u32 = 500;
