//! # Sale Repository
//!
//! The ledger. Rows are written once and never deleted; the only column
//! that ever changes is `status`, and only from `active` to `void`.
//!
//! ## Row Mapping
//! ```text
//! sales row                          Sale
//! ─────────────────────────────      ──────────────────────────────
//! items_blob (TEXT)            ──►   line_items   (line_items::decode)
//! discount_kind, discount_value ──►  discount     (both NULL = none)
//! created_at (TEXT, UTC)       ──►   created_at   (calendar::parse_timestamp)
//! ```
//!
//! The blob is opaque here: this module hands it to the codec and never
//! looks at prices or names.

use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use tally_core::calendar::{format_timestamp, parse_timestamp};
use tally_core::line_items;
use tally_core::{Discount, DiscountKind, NewSale, Sale, SaleId, SaleStatus};

use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str =
    "id, total_cents, items_blob, discount_kind, discount_value, status, created_at";

/// Raw `sales` row.
#[derive(Debug, FromRow)]
pub(crate) struct SaleRow {
    id: SaleId,
    total_cents: i64,
    items_blob: String,
    discount_kind: Option<DiscountKind>,
    discount_value: Option<i64>,
    status: SaleStatus,
    created_at: String,
}

impl TryFrom<SaleRow> for Sale {
    type Error = DbError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let line_items = line_items::decode(&row.items_blob)?;

        let created_at = parse_timestamp(&row.created_at).map_err(|e| {
            DbError::QueryFailed(format!(
                "sale {} has unreadable created_at '{}': {}",
                row.id, row.created_at, e
            ))
        })?;

        let discount = match (row.discount_kind, row.discount_value) {
            (Some(kind), Some(value)) => Some(Discount { kind, value }),
            _ => None,
        };

        Ok(Sale {
            id: row.id,
            total_cents: row.total_cents,
            line_items,
            discount,
            status: row.status,
            created_at,
        })
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool, write_gate: Arc<Mutex<()>>) -> Self {
        SaleRepository { pool, write_gate }
    }

    /// Writes a sale row on its own, without touching stock.
    ///
    /// Checkout goes through [`TransactionEngine`](crate::TransactionEngine);
    /// this is for imports and fixtures.
    pub async fn insert(&self, sale: &NewSale) -> DbResult<SaleId> {
        let _gate = self.write_gate.lock().await;
        insert_row(&self.pool, sale).await
    }

    /// Gets a sale by its id.
    pub async fn get_by_id(&self, id: SaleId) -> DbResult<Option<Sale>> {
        fetch_by_id(&self.pool, id).await
    }

    /// Moves an active sale to `status`. Returns rows affected.
    ///
    /// A void sale never changes again, so this returns 0 for it.
    pub async fn set_status(&self, id: SaleId, status: SaleStatus) -> DbResult<u64> {
        let _gate = self.write_gate.lock().await;
        update_status(&self.pool, id, status).await
    }

    /// Every sale, newest first, void ones included.
    pub async fn get_all(&self) -> DbResult<Vec<Sale>> {
        fetch_all(&self.pool).await
    }

    /// The `limit` newest sales, void ones included.
    pub async fn get_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        fetch_recent(&self.pool, limit).await
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

pub(crate) async fn insert_row<'e, E>(executor: E, sale: &NewSale) -> DbResult<SaleId>
where
    E: Executor<'e, Database = Sqlite>,
{
    let blob = line_items::encode(&sale.line_items)?;

    debug!(
        total_cents = sale.total_cents,
        lines = sale.line_items.len(),
        "Inserting sale"
    );

    let result = sqlx::query(
        r#"
        INSERT INTO sales (total_cents, items_blob, discount_kind, discount_value, status, created_at)
        VALUES (?1, ?2, ?3, ?4, 'active', ?5)
        "#,
    )
    .bind(sale.total_cents)
    .bind(blob)
    .bind(sale.discount.map(|d| d.kind))
    .bind(sale.discount.map(|d| d.value))
    .bind(format_timestamp(&sale.created_at))
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

pub(crate) async fn fetch_by_id<'e, E>(executor: E, id: SaleId) -> DbResult<Option<Sale>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, SaleRow>(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    row.map(Sale::try_from).transpose()
}

pub(crate) async fn update_status<'e, E>(executor: E, id: SaleId, status: SaleStatus) -> DbResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id, status = status.as_str(), "Updating sale status");

    let result = sqlx::query("UPDATE sales SET status = ?2 WHERE id = ?1 AND status = 'active'")
        .bind(id)
        .bind(status)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn fetch_all<'e, E>(executor: E) -> DbResult<Vec<Sale>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, SaleRow>(&format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY id DESC"))
        .fetch_all(executor)
        .await?;

    rows.into_iter().map(Sale::try_from).collect()
}

pub(crate) async fn fetch_recent<'e, E>(executor: E, limit: u32) -> DbResult<Vec<Sale>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, SaleRow>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales ORDER BY id DESC LIMIT ?1"
    ))
    .bind(i64::from(limit))
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(Sale::try_from).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
