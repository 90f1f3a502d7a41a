use chrono::{DateTime, Duration, Utc};

/// Parses an RFC 3339 timestamp (`Z` or numeric offset) into UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// True when `ts` is less than `window_hours` old relative to `now`.
/// Timestamps ahead of `now` count as fresh. A window too large for a
/// `Duration` means no age limit.
pub fn within_window(ts: DateTime<Utc>, now: DateTime<Utc>, window_hours: i64) -> bool {
    match Duration::try_hours(window_hours) {
        Some(window) => now - ts < window,
        None => true,
    }
}
