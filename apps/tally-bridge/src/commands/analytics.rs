//! # Analytics & Reporting Commands
//!
//! Read-only views over the ledger plus a health check.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{parse_payload, to_data, CommandResult};
use crate::state::BridgeState;
use tally_core::export::flatten_ledger;
use tally_db::{MigrationStatus, StockPolicy};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInput {
    /// Overrides the configured recent-sales limit.
    #[serde(default)]
    pub limit: Option<u32>,
}

/// `healthCheck` output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub database: bool,
    pub migrations: Option<MigrationStatus>,
    pub stock_policy: StockPolicy,
}

/// Today's revenue and order count plus the newest sales.
pub async fn get_analytics_snapshot(state: &BridgeState, payload: Value) -> CommandResult {
    let input: SnapshotInput = parse_payload(payload)?;
    let limit = input.limit.unwrap_or(state.config().recent_limit);

    let snapshot = state.db().analytics().snapshot(limit).await?;
    to_data(snapshot)
}

/// Every sale, newest first, void included.
pub async fn get_full_ledger(state: &BridgeState) -> CommandResult {
    let sales = state.db().analytics().full_ledger().await?;
    to_data(sales)
}

/// The full ledger flattened to one row per line item, in local time.
pub async fn export_ledger(state: &BridgeState) -> CommandResult {
    let sales = state.db().analytics().full_ledger().await?;
    let rows = flatten_ledger(&sales, &Local);

    debug!(sales = sales.len(), rows = rows.len(), "Ledger exported");
    to_data(rows)
}

/// Whether the database answers, and whether its schema is current.
///
/// Never fails: an unreachable database is reported as `database: false`.
pub async fn health_check(state: &BridgeState) -> CommandResult {
    let db = state.db();
    let database = db.health_check().await;
    let migrations = if database {
        db.migration_status().await.ok()
    } else {
        None
    };

    to_data(HealthDto {
        database,
        migrations,
        stock_policy: db.stock_policy(),
    })
}
