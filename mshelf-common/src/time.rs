//! Store timestamp and cooldown helpers
//!
//! Timestamps are persisted as RFC3339 TEXT columns. A manga whose last sync
//! is inside the cooldown window is skipped on unforced enrichment runs so
//! that failed lookups are not retried every batch.

use chrono::{DateTime, Duration, Utc};

/// Re-sync cooldown window in hours
pub const ENRICH_COOLDOWN_HOURS: i64 = 24;

/// Format a timestamp for a TEXT column
pub fn to_db_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

/// Parse a TEXT column timestamp, if present and well-formed
pub fn parse_db_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// True if `last_synced` is within the cooldown window as of `now`
pub fn within_cooldown(last_synced: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(last_synced) < Duration::hours(ENRICH_COOLDOWN_HOURS)
}
