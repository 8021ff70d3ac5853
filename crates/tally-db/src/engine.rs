//! # Transaction Engine
//!
//! Turns a cart into a sale and a sale back into stock, each as one
//! all-or-nothing unit of work over the catalog and the ledger.
//!
//! ## Sale
//! ```text
//! create_sale(cart, discount)
//!     │
//!     ├── price_cart()            validation + subtotal + discount, no I/O
//!     │     └── Err ──► returned, nothing touched
//!     ▼
//! UnitOfWork (write gate + BEGIN)
//!     ├── INSERT sales (status = active, items_blob = snapshot)
//!     ├── for each line: stock -= quantity   (per StockPolicy)
//!     │
//!     ├── all Ok ──► COMMIT ──► SaleReceipt { sale_id, final_total_cents }
//!     └── any Err ─► ROLLBACK ─► error (no sale row, no stock change)
//! ```
//!
//! ## Void
//! ```text
//! void_sale(id)
//!     │
//! UnitOfWork
//!     ├── read sale               missing ──► SaleNotFound
//!     ├── status == void?         yes ──────► AlreadyVoided
//!     ├── status = void
//!     ├── for each line: stock += quantity
//!     │        product deleted since ──► skipped, void continues
//!     └── COMMIT ──► VoidReceipt { restored, skipped }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use tally_core::pricing::price_cart;
use tally_core::{
    CartItem, CoreError, Discount, NewSale, SaleId, SaleReceipt, SaleStatus, VoidReceipt,
};

use crate::error::DbResult;
use crate::unit_of_work::UnitOfWork;

// =============================================================================
// Stock Policy
// =============================================================================

/// What a sale does when a line would take a product's stock below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockPolicy {
    /// Sell anyway; stock goes negative and shows the shortfall.
    #[default]
    AllowNegative,
    /// Fail the whole sale with `InsufficientStock`.
    RejectOversell,
}

impl StockPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockPolicy::AllowNegative => "allow-negative",
            StockPolicy::RejectOversell => "reject-oversell",
        }
    }
}

impl fmt::Display for StockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow-negative" => Ok(StockPolicy::AllowNegative),
            "reject-oversell" => Ok(StockPolicy::RejectOversell),
            other => Err(format!(
                "unknown stock policy '{other}' (expected allow-negative or reject-oversell)"
            )),
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Sale creation and voiding.
///
/// ## Usage
/// ```rust,ignore
/// let engine = db.transactions();
///
/// let receipt = engine
///     .create_sale(&cart, Some(Discount::fixed(300)))
///     .await?;
/// engine.void_sale(receipt.sale_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct TransactionEngine {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
    policy: StockPolicy,
}

impl TransactionEngine {
    pub fn new(pool: SqlitePool, write_gate: Arc<Mutex<()>>, policy: StockPolicy) -> Self {
        TransactionEngine {
            pool,
            write_gate,
            policy,
        }
    }

    pub fn policy(&self) -> StockPolicy {
        self.policy
    }

    /// Opens a unit of work on the same gate this engine uses.
    ///
    /// For callers composing their own multi-store change; a sale or void
    /// started elsewhere waits until it is committed or rolled back.
    pub async fn begin(&self) -> DbResult<UnitOfWork> {
        UnitOfWork::begin(&self.pool, Arc::clone(&self.write_gate)).await
    }

    /// Records a sale and takes its quantities out of stock.
    ///
    /// ## Returns
    /// * `Ok(SaleReceipt)` - committed
    /// * `Err(Domain(EmptyCart | InvalidDiscount | Validation))` - rejected up front
    /// * `Err(Domain(ProductNotFound | InsufficientStock))` - rolled back
    /// * `Err(_)` persistence failure - rolled back
    pub async fn create_sale(
        &self,
        items: &[CartItem],
        discount: Option<Discount>,
    ) -> DbResult<SaleReceipt> {
        let priced = price_cart(items, discount.as_ref())?;

        debug!(
            lines = items.len(),
            subtotal = %priced.subtotal,
            total = %priced.total,
            "Cart priced"
        );

        let mut uow = self.begin().await?;

        // Stamped under the gate so created_at order follows id order
        let new_sale = NewSale {
            total_cents: priced.total.cents(),
            line_items: items.to_vec(),
            discount,
            created_at: Utc::now(),
        };

        match self.write_sale(&mut uow, &new_sale).await {
            Ok(sale_id) => {
                uow.commit().await?;

                info!(
                    sale_id,
                    total = %priced.total,
                    lines = items.len(),
                    "Sale recorded"
                );

                Ok(SaleReceipt {
                    sale_id,
                    final_total_cents: priced.total.cents(),
                })
            }
            Err(err) => {
                abort(uow, "sale").await;
                Err(err)
            }
        }
    }

    /// Marks a sale void and gives its quantities back to stock.
    ///
    /// ## Returns
    /// * `Ok(VoidReceipt)` - committed; `skipped` lists deleted products
    /// * `Err(Domain(SaleNotFound))` - no such sale
    /// * `Err(Domain(AlreadyVoided))` - second void of the same sale
    /// * `Err(_)` persistence failure - rolled back
    pub async fn void_sale(&self, sale_id: SaleId) -> DbResult<VoidReceipt> {
        let mut uow = self.begin().await?;

        match write_void(&mut uow, sale_id).await {
            Ok(receipt) => {
                uow.commit().await?;

                info!(
                    sale_id,
                    restored = receipt.restored.len(),
                    skipped = receipt.skipped.len(),
                    "Sale voided"
                );

                Ok(receipt)
            }
            Err(err) => {
                abort(uow, "void").await;
                Err(err)
            }
        }
    }

    async fn write_sale(&self, uow: &mut UnitOfWork, sale: &NewSale) -> DbResult<SaleId> {
        let sale_id = uow.insert_sale(sale).await?;

        for item in &sale.line_items {
            match self.policy {
                StockPolicy::AllowNegative => {
                    if uow.adjust_stock(item.product_id, -item.quantity).await? == 0 {
                        return Err(CoreError::ProductNotFound(item.product_id).into());
                    }
                }
                StockPolicy::RejectOversell => {
                    if !uow.take_stock(item.product_id, item.quantity).await? {
                        let err = match uow.stock_level(item.product_id).await? {
                            None => CoreError::ProductNotFound(item.product_id),
                            Some(available) => CoreError::InsufficientStock {
                                product_id: item.product_id,
                                available,
                                requested: item.quantity,
                            },
                        };
                        return Err(err.into());
                    }
                }
            }
        }

        Ok(sale_id)
    }
}

async fn write_void(uow: &mut UnitOfWork, sale_id: SaleId) -> DbResult<VoidReceipt> {
    let sale = uow
        .fetch_sale(sale_id)
        .await?
        .ok_or(CoreError::SaleNotFound(sale_id))?;

    if sale.is_void() || uow.set_status(sale_id, SaleStatus::Void).await? == 0 {
        return Err(CoreError::AlreadyVoided(sale_id).into());
    }

    let mut restored = Vec::new();
    let mut skipped = Vec::new();

    for item in &sale.line_items {
        if uow.adjust_stock(item.product_id, item.quantity).await? == 0 {
            warn!(
                sale_id,
                product_id = item.product_id,
                quantity = item.quantity,
                "Product no longer exists, stock restoration skipped"
            );
            if !skipped.contains(&item.product_id) {
                skipped.push(item.product_id);
            }
        } else if !restored.contains(&item.product_id) {
            restored.push(item.product_id);
        }
    }

    Ok(VoidReceipt {
        sale_id,
        restored,
        skipped,
    })
}

/// Rolls back after a failed step. The step's error is what the caller sees.
async fn abort(uow: UnitOfWork, operation: &str) {
    if let Err(rollback_err) = uow.rollback().await {
        error!(operation, error = %rollback_err, "Rollback failed");
    } else {
        debug!(operation, "Rolled back");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};
    use tally_core::{NewProduct, ProductId};

    async fn setup(policy: StockPolicy) -> (Database, ProductId, ProductId) {
        let db = Database::new(DbConfig::in_memory().stock_policy(policy))
            .await
            .unwrap();

        let mut ids = Vec::new();
        for (name, price, stock) in [("Cold Brew", 500, 10), ("Bagel", 1000, 4)] {
            let id = db
                .products()
                .add(&NewProduct {
                    name: name.to_string(),
                    price_cents: price,
                    stock,
                    detail: String::new(),
                    barcode: String::new(),
                })
                .await
                .unwrap();
            ids.push(id);
        }

        (db, ids[0], ids[1])
    }

    fn cart(brew: ProductId, bagel: ProductId) -> Vec<CartItem> {
        vec![
            CartItem::new(brew, "Cold Brew", 500, 2),
            CartItem::new(bagel, "Bagel", 1000, 1),
        ]
    }

    async fn stock(db: &Database, id: ProductId) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[test]
    fn test_stock_policy_parsing() {
        assert_eq!(
            "allow-negative".parse::<StockPolicy>(),
            Ok(StockPolicy::AllowNegative)
        );
        assert_eq!(
            " Reject-Oversell ".parse::<StockPolicy>(),
            Ok(StockPolicy::RejectOversell)
        );
        assert!("strict".parse::<StockPolicy>().is_err());
        assert_eq!(StockPolicy::default(), StockPolicy::AllowNegative);
    }

    #[tokio::test]
    async fn test_create_sale_totals() {
        let (db, brew, bagel) = setup(StockPolicy::AllowNegative).await;
        let engine = db.transactions();

        let plain = engine.create_sale(&cart(brew, bagel), None).await.unwrap();
        let percent = engine
            .create_sale(&cart(brew, bagel), Some(Discount::percent(10)))
            .await
            .unwrap();
        let fixed = engine
            .create_sale(&cart(brew, bagel), Some(Discount::fixed(300)))
            .await
            .unwrap();

        assert_eq!(plain.final_total_cents, 2000);
        assert_eq!(percent.final_total_cents, 1800);
        assert_eq!(fixed.final_total_cents, 1700);

        let stored = db.sales().get_by_id(fixed.sale_id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, 1700);
        assert_eq!(stored.discount, Some(Discount::fixed(300)));
        assert_eq!(stored.line_items, cart(brew, bagel));

        assert_eq!(stock(&db, brew).await, 4);
        assert_eq!(stock(&db, bagel).await, 1);
    }

    #[tokio::test]
    async fn test_validation_failures_touch_nothing() {
        let (db, brew, bagel) = setup(StockPolicy::AllowNegative).await;
        let engine = db.transactions();

        let err = engine.create_sale(&[], None).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));

        let err = engine
            .create_sale(&cart(brew, bagel), Some(Discount::percent(150)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidDiscount { .. })));

        let zero_qty = vec![CartItem::new(brew, "Cold Brew", 500, 0)];
        assert!(engine.create_sale(&zero_qty, None).await.is_err());

        assert!(db.sales().get_all().await.unwrap().is_empty());
        assert_eq!(stock(&db, brew).await, 10);
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back_whole_sale() {
        let (db, brew, _) = setup(StockPolicy::AllowNegative).await;

        let items = vec![
            CartItem::new(brew, "Cold Brew", 500, 1),
            CartItem::new(4242, "Ghost", 100, 1),
        ];
        let err = db.transactions().create_sale(&items, None).await.unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(4242))));
        assert!(db.sales().get_all().await.unwrap().is_empty());
        assert_eq!(stock(&db, brew).await, 10);
    }

    #[tokio::test]
    async fn test_allow_negative_oversells() {
        let (db, _, bagel) = setup(StockPolicy::AllowNegative).await;

        let items = vec![CartItem::new(bagel, "Bagel", 1000, 6)];
        db.transactions().create_sale(&items, None).await.unwrap();

        assert_eq!(stock(&db, bagel).await, -2);
    }

    #[tokio::test]
    async fn test_reject_oversell_rolls_back() {
        let (db, brew, bagel) = setup(StockPolicy::RejectOversell).await;

        let items = vec![
            CartItem::new(brew, "Cold Brew", 500, 3),
            CartItem::new(bagel, "Bagel", 1000, 5),
        ];
        let err = db.transactions().create_sale(&items, None).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 4,
                requested: 5,
                ..
            })
        ));
        assert_eq!(stock(&db, brew).await, 10);
        assert_eq!(stock(&db, bagel).await, 4);
        assert!(db.sales().get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reject_oversell_counts_repeated_lines() {
        let (db, _, bagel) = setup(StockPolicy::RejectOversell).await;

        let items = vec![
            CartItem::new(bagel, "Bagel", 1000, 3),
            CartItem::new(bagel, "Bagel", 1000, 2),
        ];
        assert!(db.transactions().create_sale(&items, None).await.is_err());
        assert_eq!(stock(&db, bagel).await, 4);
    }

    #[tokio::test]
    async fn test_void_restores_stock() {
        let (db, brew, bagel) = setup(StockPolicy::AllowNegative).await;
        let engine = db.transactions();

        let receipt = engine.create_sale(&cart(brew, bagel), None).await.unwrap();
        let voided = engine.void_sale(receipt.sale_id).await.unwrap();

        assert_eq!(voided.restored, vec![brew, bagel]);
        assert!(voided.skipped.is_empty());
        assert_eq!(stock(&db, brew).await, 10);
        assert_eq!(stock(&db, bagel).await, 4);

        let sale = db.sales().get_by_id(receipt.sale_id).await.unwrap().unwrap();
        assert_eq!(sale.status, SaleStatus::Void);
    }

    #[tokio::test]
    async fn test_double_void_is_rejected() {
        let (db, brew, bagel) = setup(StockPolicy::AllowNegative).await;
        let engine = db.transactions();

        let receipt = engine.create_sale(&cart(brew, bagel), None).await.unwrap();
        engine.void_sale(receipt.sale_id).await.unwrap();

        let err = engine.void_sale(receipt.sale_id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::AlreadyVoided(_))));
        assert_eq!(stock(&db, brew).await, 10);
    }

    #[tokio::test]
    async fn test_void_unknown_sale() {
        let (db, _, _) = setup(StockPolicy::AllowNegative).await;

        let err = db.transactions().void_sale(77).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::SaleNotFound(77))));
    }

    #[tokio::test]
    async fn test_void_skips_deleted_product() {
        let (db, brew, bagel) = setup(StockPolicy::AllowNegative).await;
        let engine = db.transactions();

        let receipt = engine.create_sale(&cart(brew, bagel), None).await.unwrap();
        db.products().delete(bagel).await.unwrap();

        let voided = engine.void_sale(receipt.sale_id).await.unwrap();
        assert_eq!(voided.restored, vec![brew]);
        assert_eq!(voided.skipped, vec![bagel]);
        assert_eq!(stock(&db, brew).await, 10);
    }
}
