//! # Calendar Helpers
//!
//! Converts local calendar days into UTC instants and fixes the text form
//! timestamps take in the ledger.
//!
//! ## Stored Format
//! ```text
//! 2026-03-14 09:26:53.589   (UTC, always 23 chars)
//! ```
//! Fixed width means lexicographic order equals chronological order, so a
//! plain `created_at >= ? AND created_at < ?` selects a day.

use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// chrono format string for ledger timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Formats an instant the way the ledger stores it.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use tally_core::calendar::format_timestamp;
///
/// let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
/// assert_eq!(format_timestamp(&at), "2026-03-14 09:26:53.000");
/// ```
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a stored ledger timestamp back into UTC.
///
/// Accepts values with or without fractional seconds, so rows written by
/// SQLite's own `CURRENT_TIMESTAMP` still read.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|naive| naive.and_utc())
}

/// Returns the UTC instant at which `date` starts in `tz`.
///
/// Ambiguous midnights take the earlier instant. When midnight does not
/// exist (a DST jump at 00:00) the day starts at the first valid hour.
pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let mut naive = date.and_time(NaiveTime::MIN);

    for _ in 0..24 {
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => {
                return at.with_timezone(&Utc);
            }
            LocalResult::None => naive += chrono::Duration::hours(1),
        }
    }

    // No zone skips a whole day; fall back to reading the date as UTC.
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Returns the half-open UTC range `[start, end)` covering `date` in `tz`.
///
/// ## Example
/// ```rust
/// use chrono::{FixedOffset, NaiveDate};
/// use tally_core::calendar::{day_bounds, format_timestamp};
///
/// let tz = FixedOffset::east_opt(5 * 3600).unwrap();
/// let (start, end) = day_bounds(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(), &tz);
/// assert_eq!(format_timestamp(&start), "2026-03-13 19:00:00.000");
/// assert_eq!(format_timestamp(&end), "2026-03-14 19:00:00.000");
/// ```
pub fn day_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(date, tz);
    let end = match date.checked_add_days(Days::new(1)) {
        Some(next) => start_of_day(next, tz),
        None => DateTime::<Utc>::MAX_UTC,
    };
    (start, end)
}

// =============================================================================
// Unit Tests
// =============================================================================
