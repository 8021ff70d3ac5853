//! # Legacy Import
//!
//! One-off copy of a database written by the earlier till application into
//! a fresh Tally database.
//!
//! ```text
//! legacy.products(id, name, price, stock, detail, barcode)
//!     → products(id, name, price_cents, stock, detail, barcode)
//!
//! legacy.sales(id, total_price, items_json, discount_value, discount_type,
//!              status?, created_at)
//!     → sales(id, total_cents, items_blob, discount_kind, discount_value,
//!             status, created_at)
//! ```
//!
//! Ids are kept, so the product ids inside each sale's items still point at
//! the right catalog rows. `items_json` is copied untouched: it is the
//! un-versioned item array that `tally_core::line_items::decode` reads as
//! the legacy format. Fixed discounts were stored in whole currency units
//! and become cents. Totals left fractional by percent discounts are
//! rounded, and negative ones floor at zero.

use sqlx::pool::PoolConnection;
use sqlx::{Connection, Sqlite};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;

/// Rows copied by [`Database::import_legacy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub products: u64,
    pub sales: u64,
}

impl Database {
    /// Copies the catalog and ledger of a legacy till database into this one.
    ///
    /// The target must hold no products and no sales. The copy runs in one
    /// transaction under the write gate, so it lands whole or not at all.
    ///
    /// ## Returns
    /// * `Ok(ImportSummary)` - committed
    /// * `Err(ImportRejected)` - missing source, non-empty target, or a
    ///   source without `products` / `sales` tables
    pub async fn import_legacy(&self, source: impl AsRef<Path>) -> DbResult<ImportSummary> {
        let source = source.as_ref();
        if !source.is_file() {
            return Err(DbError::ImportRejected(format!(
                "{} is not a database file",
                source.display()
            )));
        }

        info!(source = %source.display(), "Importing legacy database");

        let gate = self.write_gate();
        let _gate = gate.lock().await;
        let mut conn = self.pool().acquire().await?;

        let existing: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM products) + (SELECT COUNT(*) FROM sales)",
        )
        .fetch_one(&mut *conn)
        .await?;
        if existing > 0 {
            return Err(DbError::ImportRejected(
                "target database already has products or sales".to_string(),
            ));
        }

        // ATTACH is refused inside a transaction
        sqlx::query("ATTACH DATABASE ?1 AS legacy")
            .bind(source.to_string_lossy().into_owned())
            .execute(&mut *conn)
            .await?;

        let copied = copy_legacy(&mut conn).await;

        if let Err(e) = sqlx::query("DETACH DATABASE legacy").execute(&mut *conn).await {
            warn!(error = %e, "Legacy database left attached");
        }

        let summary = copied?;
        info!(
            products = summary.products,
            sales = summary.sales,
            "Legacy import complete"
        );
        Ok(summary)
    }
}

async fn copy_legacy(conn: &mut PoolConnection<Sqlite>) -> DbResult<ImportSummary> {
    for table in ["products", "sales"] {
        let found: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM legacy.sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(table)
        .fetch_one(&mut **conn)
        .await?;

        if found == 0 {
            return Err(DbError::ImportRejected(format!(
                "source has no {table} table"
            )));
        }
    }

    // Older files predate the status column; every sale in them is active
    let has_status: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('sales', 'legacy') WHERE name = 'status'",
    )
    .fetch_one(&mut **conn)
    .await?;
    let status = if has_status > 0 {
        "CASE WHEN UPPER(status) = 'VOID' THEN 'void' ELSE 'active' END"
    } else {
        "'active'"
    };
    debug!(has_status = has_status > 0, "Legacy schema inspected");

    let mut tx = Connection::begin(&mut **conn)
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

    let products = sqlx::query(
        r#"
        INSERT INTO products (id, name, price_cents, stock, detail, barcode)
        SELECT
            id,
            name,
            MAX(CAST(ROUND(price) AS INTEGER), 0),
            COALESCE(stock, 1),
            COALESCE(detail, ''),
            COALESCE(TRIM(barcode), '')
        FROM legacy.products
        ORDER BY id
        "#,
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let sales = sqlx::query(&format!(
        r#"
        INSERT INTO sales
            (id, total_cents, items_blob, discount_kind, discount_value, status, created_at)
        SELECT
            id,
            MAX(CAST(ROUND(total_price) AS INTEGER), 0),
            items_json,
            CASE WHEN discount_type IN ('percent', 'fixed') THEN discount_type END,
            CASE discount_type
                WHEN 'percent' THEN CAST(ROUND(COALESCE(discount_value, 0)) AS INTEGER)
                WHEN 'fixed' THEN CAST(ROUND(COALESCE(discount_value, 0) * 100) AS INTEGER)
            END,
            {status},
            COALESCE(
                strftime('%Y-%m-%d %H:%M:%f', created_at),
                strftime('%Y-%m-%d %H:%M:%f', 'now')
            )
        FROM legacy.sales
        ORDER BY id
        "#
    ))
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit()
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

    Ok(ImportSummary { products, sales })
}
