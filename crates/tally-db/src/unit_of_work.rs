//! # Unit of Work
//!
//! One SQLite transaction spanning the catalog and the ledger, held under
//! the database-wide write gate.
//!
//! ```text
//!   begin()                     commit()
//!     │                            │
//!     ▼                            ▼
//!  ┌──────┐  insert_sale      ┌─────────┐
//!  │ gate │  adjust_stock ... │ COMMIT  │──► gate released
//!  │ BEGIN│  set_status       └─────────┘
//!  └──────┘                   rollback() / drop
//!                                 │
//!                                 ▼
//!                          ROLLBACK ──► gate released
//! ```
//!
//! Nothing written through a unit of work is visible to other connections
//! until `commit()` returns. Dropping it without committing rolls back.
//!
//! Only one unit of work exists at a time, and it owns a pooled connection
//! for its whole life. Don't call pool-backed store methods while holding
//! one: on a single-connection pool they would wait forever.

use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use tally_core::{NewSale, ProductId, Sale, SaleId, SaleStatus};

use crate::error::{DbError, DbResult};
use crate::repository::{product, sale};

/// A gated transaction over both stores.
pub struct UnitOfWork {
    // Field order matters: the transaction must drop before the gate opens.
    tx: Transaction<'static, Sqlite>,
    _guard: OwnedMutexGuard<()>,
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork").finish_non_exhaustive()
    }
}

impl UnitOfWork {
    /// Waits for the write gate, then begins a transaction.
    pub(crate) async fn begin(pool: &SqlitePool, gate: Arc<Mutex<()>>) -> DbResult<Self> {
        let guard = gate.lock_owned().await;

        let tx = pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Unit of work started");

        Ok(UnitOfWork { tx, _guard: guard })
    }

    /// Writes a sale row with status `active`. Returns its id.
    pub async fn insert_sale(&mut self, new_sale: &NewSale) -> DbResult<SaleId> {
        sale::insert_row(&mut *self.tx, new_sale).await
    }

    /// Reads a sale as this transaction sees it.
    pub async fn fetch_sale(&mut self, id: SaleId) -> DbResult<Option<Sale>> {
        sale::fetch_by_id(&mut *self.tx, id).await
    }

    /// Moves an active sale to `status`. Returns rows affected; 0 means the
    /// sale is missing or already void.
    pub async fn set_status(&mut self, id: SaleId, status: SaleStatus) -> DbResult<u64> {
        sale::update_status(&mut *self.tx, id, status).await
    }

    /// Adds `delta` to a product's stock. Returns rows affected; 0 means the
    /// product does not exist.
    pub async fn adjust_stock(&mut self, id: ProductId, delta: i64) -> DbResult<u64> {
        product::adjust_stock_row(&mut *self.tx, id, delta).await
    }

    /// Takes `quantity` from a product only if that leaves stock at or above
    /// zero. Returns whether the stock was taken.
    pub async fn take_stock(&mut self, id: ProductId, quantity: i64) -> DbResult<bool> {
        let affected = product::take_stock_row(&mut *self.tx, id, quantity).await?;
        Ok(affected > 0)
    }

    /// Current stock of a product, `None` if it does not exist.
    pub async fn stock_level(&mut self, id: ProductId) -> DbResult<Option<i64>> {
        product::stock_level(&mut *self.tx, id).await
    }

    /// Publishes every write made through this unit of work.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Unit of work committed");
        Ok(())
    }

    /// Discards every write made through this unit of work.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Unit of work rolled back");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Utc;
    use tally_core::{CartItem, NewProduct};

    async fn setup() -> (Database, ProductId) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = db
            .products()
            .add(&NewProduct {
                name: "Espresso".to_string(),
                price_cents: 300,
                stock: 10,
                detail: String::new(),
                barcode: String::new(),
            })
            .await
            .unwrap();
        (db, id)
    }

    fn new_sale(product_id: ProductId) -> NewSale {
        NewSale {
            total_cents: 600,
            line_items: vec![CartItem::new(product_id, "Espresso", 300, 2)],
            discount: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_both_stores() {
        let (db, product_id) = setup().await;

        let mut uow = db.unit_of_work().await.unwrap();
        let sale_id = uow.insert_sale(&new_sale(product_id)).await.unwrap();
        assert_eq!(uow.adjust_stock(product_id, -2).await.unwrap(), 1);
        uow.commit().await.unwrap();

        let sale = db.sales().get_by_id(sale_id).await.unwrap().unwrap();
        assert_eq!(sale.status, SaleStatus::Active);
        let product = db.products().get_by_id(product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 8);
    }

    #[tokio::test]
    async fn test_rollback_discards_both_stores() {
        let (db, product_id) = setup().await;

        let mut uow = db.unit_of_work().await.unwrap();
        uow.insert_sale(&new_sale(product_id)).await.unwrap();
        uow.adjust_stock(product_id, -2).await.unwrap();
        uow.rollback().await.unwrap();

        assert!(db.sales().get_all().await.unwrap().is_empty());
        let product = db.products().get_by_id(product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 10);
    }

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() {
        let (db, product_id) = setup().await;

        {
            let mut uow = db.unit_of_work().await.unwrap();
            uow.insert_sale(&new_sale(product_id)).await.unwrap();
        }

        assert!(db.sales().get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_take_stock_respects_floor() {
        let (db, product_id) = setup().await;

        let mut uow = db.unit_of_work().await.unwrap();
        assert!(uow.take_stock(product_id, 10).await.unwrap());
        assert!(!uow.take_stock(product_id, 1).await.unwrap());
        assert_eq!(uow.stock_level(product_id).await.unwrap(), Some(0));
        assert_eq!(uow.stock_level(9999).await.unwrap(), None);
        uow.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_set_status_is_one_way() {
        let (db, product_id) = setup().await;

        let mut uow = db.unit_of_work().await.unwrap();
        let sale_id = uow.insert_sale(&new_sale(product_id)).await.unwrap();
        assert_eq!(uow.set_status(sale_id, SaleStatus::Void).await.unwrap(), 1);
        assert_eq!(uow.set_status(sale_id, SaleStatus::Active).await.unwrap(), 0);
        assert_eq!(uow.set_status(sale_id, SaleStatus::Void).await.unwrap(), 0);
        uow.commit().await.unwrap();

        let sale = db.sales().get_by_id(sale_id).await.unwrap().unwrap();
        assert!(sale.is_void());
    }
}
