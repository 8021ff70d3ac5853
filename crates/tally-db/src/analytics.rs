//! # Analytics Engine
//!
//! Read-only views over the ledger. Nothing is cached; every call reflects
//! the last committed state.
//!
//! ```text
//! today_stats()     SUM(total_cents), COUNT(*)  where created_at in today  AND status != 'void'
//! recent_sales(n)   newest n sales, void included
//! full_ledger()     every sale, newest first, void included
//! snapshot(n)       today_stats + recent_sales(n) from one read transaction
//! ```
//!
//! "Today" is the local calendar day. Its bounds are converted to UTC and
//! compared against the stored UTC text, so a sale at 23:30 local lands on
//! the right day whatever the offset.

use chrono::{Local, NaiveDate, TimeZone};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use tally_core::calendar::{day_bounds, format_timestamp};
use tally_core::{AnalyticsSnapshot, DayStats, Sale};

use crate::error::{DbError, DbResult};
use crate::repository::sale;

/// Revenue, order counts and ledger listings.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    pool: SqlitePool,
}

impl AnalyticsEngine {
    pub fn new(pool: SqlitePool) -> Self {
        AnalyticsEngine { pool }
    }

    /// Revenue and order count for the current local day, void excluded.
    pub async fn today_stats(&self) -> DbResult<DayStats> {
        self.stats_for_day(Local::now().date_naive()).await
    }

    /// Revenue and order count for a local calendar day, void excluded.
    pub async fn stats_for_day(&self, date: NaiveDate) -> DbResult<DayStats> {
        self.stats_for_day_in(date, &Local).await
    }

    /// Like [`stats_for_day`](Self::stats_for_day) for a day in `tz`.
    pub async fn stats_for_day_in<Tz: TimeZone>(&self, date: NaiveDate, tz: &Tz) -> DbResult<DayStats> {
        day_stats(&self.pool, date, tz).await
    }

    /// The `limit` newest sales, void included.
    pub async fn recent_sales(&self, limit: u32) -> DbResult<Vec<Sale>> {
        sale::fetch_recent(&self.pool, limit).await
    }

    /// Every sale ever recorded, newest first, void included.
    pub async fn full_ledger(&self) -> DbResult<Vec<Sale>> {
        sale::fetch_all(&self.pool).await
    }

    /// Today's figures and the recent-sales list, read from one snapshot so
    /// the two always agree.
    pub async fn snapshot(&self, limit: u32) -> DbResult<AnalyticsSnapshot> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let today = day_stats(&mut *tx, Local::now().date_naive(), &Local).await?;
        let recent_sales = sale::fetch_recent(&mut *tx, limit).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(AnalyticsSnapshot {
            today_revenue_cents: today.revenue_cents,
            today_order_count: today.order_count,
            recent_sales,
        })
    }
}

async fn day_stats<'e, E, Tz>(executor: E, date: NaiveDate, tz: &Tz) -> DbResult<DayStats>
where
    E: Executor<'e, Database = Sqlite>,
    Tz: TimeZone,
{
    let (start, end) = day_bounds(date, tz);
    let (start, end) = (format_timestamp(&start), format_timestamp(&end));

    debug!(%date, %start, %end, "Computing day stats");

    let (revenue_cents, order_count): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(total_cents), 0), COUNT(*)
        FROM sales
        WHERE created_at >= ?1 AND created_at < ?2 AND status != 'void'
        "#,
    )
    .bind(&start)
    .bind(&end)
    .fetch_one(executor)
    .await?;

    Ok(DayStats {
        revenue_cents,
        order_count,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
