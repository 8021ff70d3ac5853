//! # Ledger Export
//!
//! Flattens sales into one row per line item for spreadsheets and reports.
//!
//! ```text
//! Sale #12  2026-10-16 14:05 UTC  [Tea ×2 @250, Scone ×1 @400]
//!     │
//!     ▼  (rendered in the caller's time zone)
//! 12 | 2026-10-16 | 16:05:00 | Tea   | 2 | 250 | 500 | active
//! 12 | 2026-10-16 | 16:05:00 | Scone | 1 | 400 | 400 | active
//! ```
//!
//! Money stays in integer cents. Turning rows into CSV, or striking out
//! voided sales, is up to the consumer.

use chrono::{NaiveDate, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Sale, SaleId, SaleStatus};

/// One exported line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExportRow {
    pub sale_id: SaleId,
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Local wall-clock time, whole seconds.
    #[ts(as = "String")]
    pub time: NaiveTime,
    pub item_name: String,
    pub quantity: i64,
    /// Snapshot unit price in cents.
    pub unit_price: i64,
    /// `unit_price × quantity` in cents; saturates instead of overflowing.
    pub line_total: i64,
    pub status: SaleStatus,
}

/// Flattens a single sale, rendering its timestamp in `tz`.
pub fn flatten_sale<Tz: TimeZone>(sale: &Sale, tz: &Tz) -> Vec<ExportRow> {
    let local = sale.created_at.with_timezone(tz).naive_local();
    let date = local.date();
    let time = local.time().with_nanosecond(0).unwrap_or(local.time());

    sale.line_items
        .iter()
        .map(|item| ExportRow {
            sale_id: sale.id,
            date,
            time,
            item_name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price_cents,
            line_total: item.unit_price_cents.saturating_mul(item.quantity),
            status: sale.status,
        })
        .collect()
}

/// Flattens a whole ledger, keeping the ledger's sale order.
pub fn flatten_ledger<Tz: TimeZone>(sales: &[Sale], tz: &Tz) -> Vec<ExportRow> {
    sales.iter().flat_map(|sale| flatten_sale(sale, tz)).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
