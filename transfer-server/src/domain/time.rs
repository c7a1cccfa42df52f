//! Timestamp handling for schedule data.
//!
//! Schedule sources report times as ISO-8601 / RFC 3339 strings with an
//! offset. Delays are whole seconds between the actual and scheduled value.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Error returned when parsing an invalid timestamp.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time {input:?}: {reason}")]
pub struct TimeError {
    input: String,
    reason: &'static str,
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (`2024-03-15T10:00:00+01:00`, `...Z`). A timestamp
/// without an offset is taken as UTC.
///
/// # Examples
///
/// ```
/// use transfer_server::domain::parse_iso;
///
/// let t = parse_iso("2024-03-15T10:00:00Z").unwrap();
/// assert_eq!(t.to_rfc3339(), "2024-03-15T10:00:00+00:00");
/// assert!(parse_iso("10:00").is_err());
/// ```
pub fn parse_iso(s: &str) -> Result<DateTime<FixedOffset>, TimeError> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|_| TimeError {
            input: s.to_string(),
            reason: "expected ISO-8601 date and time",
        })
}

/// Delay in seconds between an actual and a scheduled time.
///
/// Returns `None` when either side is missing or the delay is exactly zero.
pub fn delay_seconds(
    actual: Option<DateTime<FixedOffset>>,
    scheduled: Option<DateTime<FixedOffset>>,
) -> Option<i64> {
    let diff = actual?.signed_duration_since(scheduled?).num_seconds();
    (diff != 0).then_some(diff)
}
