//! Logical clock helpers.
//!
//! Record clocks travel through JSON files, HTTP bodies and SQLite integer
//! columns. All three must agree exactly or reconciliation never converges,
//! so every clock is held at millisecond precision.

use chrono::{DateTime, TimeZone, Utc};

/// Current time truncated to whole milliseconds.
pub fn now_millis() -> DateTime<Utc> {
    truncate_millis(Utc::now())
}

/// Drops sub-millisecond precision.
pub fn truncate_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ts.timestamp_millis())
        .single()
        .unwrap_or(ts)
}

/// Whether the clock was never set (the Unix epoch default).
pub fn is_unset(ts: &DateTime<Utc>) -> bool {
    ts.timestamp_millis() == 0
}
