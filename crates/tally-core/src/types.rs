//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    CartItem     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │──►│  product_id     │──►│  id (i64)       │       │
//! │  │  name           │   │  name (frozen)  │   │  total_cents    │       │
//! │  │  price_cents    │   │  unit_price     │   │  line_items     │       │
//! │  │  stock          │   │  quantity       │   │  discount       │       │
//! │  │  barcode        │   └─────────────────┘   │  status         │       │
//! │  └─────────────────┘                         │  created_at     │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   Discount      │   │   SaleStatus    │                             │
//! │  │  Percent | Fixed│   │  Active → Void  │  (one way)                  │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Ids are SQLite row ids. "Newest first" everywhere means id descending.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Row id of a product.
pub type ProductId = i64;

/// Row id of a sale.
pub type SaleId = i64;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: ProductId,

    /// Display name shown to the cashier and frozen into sales.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Current stock level. May be negative after an oversell.
    pub stock: i64,

    /// Free-form description.
    pub detail: String,

    /// Barcode; unique when non-empty.
    pub barcode: String,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Takes a point-in-time snapshot of this product for a cart.
    pub fn to_cart_item(&self, quantity: i64) -> CartItem {
        CartItem {
            product_id: self.id,
            name: self.name.clone(),
            unit_price_cents: self.price_cents,
            quantity,
        }
    }
}

/// A product that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    #[serde(default = "default_stock")]
    pub stock: i64,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub barcode: String,
}

fn default_stock() -> i64 {
    1
}

impl NewProduct {
    /// Attaches the id assigned by the store.
    pub fn with_id(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            price_cents: self.price_cents,
            stock: self.stock,
            detail: self.detail,
            barcode: self.barcode,
        }
    }
}

/// One page of a catalog search.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Number of products matching the term across all pages.
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

// =============================================================================
// Cart Item
// =============================================================================

/// A frozen copy of a product's name and price plus the quantity requested.
///
/// Never stored on its own: it lives in a checkout request and, once sold,
/// inside the sale's line-item snapshot. Later catalog edits don't touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl CartItem {
    /// Creates a cart line.
    pub fn new(product_id: ProductId, name: impl Into<String>, unit_price_cents: i64, quantity: i64) -> Self {
        CartItem {
            product_id,
            name: name.into(),
            unit_price_cents,
            quantity,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Unit price × quantity, `None` on overflow.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price().checked_mul_quantity(self.quantity)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DiscountKind {
    /// `value` is a whole percentage in `0..=100`.
    Percent,
    /// `value` is an amount in minor units.
    Fixed,
}

/// A whole-cart discount, applied to the subtotal (never per line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    pub kind: DiscountKind,
    pub value: i64,
}

impl Discount {
    /// Percentage discount, e.g. `Discount::percent(10)` for 10% off.
    pub const fn percent(value: i64) -> Self {
        Discount {
            kind: DiscountKind::Percent,
            value,
        }
    }

    /// Fixed discount in cents, e.g. `Discount::fixed(300)` for $3.00 off.
    pub const fn fixed(value: i64) -> Self {
        Discount {
            kind: DiscountKind::Fixed,
            value,
        }
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale. The only transition is Active → Void.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SaleStatus {
    /// Sale counts towards revenue.
    Active,
    /// Sale was reversed; kept for the audit trail.
    Void,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Active
    }
}

impl SaleStatus {
    /// Database / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Active => "active",
            SaleStatus::Void => "void",
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale. Immutable apart from `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: SaleId,
    pub total_cents: i64,
    pub line_items: Vec<CartItem>,
    pub discount: Option<Discount>,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        self.status == SaleStatus::Void
    }
}

/// A sale ready to be written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub total_cents: i64,
    pub line_items: Vec<CartItem>,
    pub discount: Option<Discount>,
    pub created_at: DateTime<Utc>,
}

/// What a successful checkout hands back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleReceipt {
    pub sale_id: SaleId,
    pub final_total_cents: i64,
}

/// Outcome of a successful void.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VoidReceipt {
    pub sale_id: SaleId,
    /// Products whose stock was given back.
    pub restored: Vec<ProductId>,
    /// Products deleted since the sale; their restoration was skipped.
    pub skipped: Vec<ProductId>,
}

// =============================================================================
// Analytics
// =============================================================================

/// Revenue and order count for one calendar day, voided sales excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DayStats {
    pub revenue_cents: i64,
    pub order_count: i64,
}

/// Derived view over the ledger. Recomputed on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AnalyticsSnapshot {
    pub today_revenue_cents: i64,
    pub today_order_count: i64,
    /// Newest first, voided sales included.
    pub recent_sales: Vec<Sale>,
}

// =============================================================================
// Unit Tests
// =============================================================================
