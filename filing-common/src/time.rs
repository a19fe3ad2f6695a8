//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Seconds elapsed between `since` and `at`, never negative
///
/// Clock skew between the store and the caller can put `since` in the future;
/// that reads as zero elapsed time.
pub fn elapsed_seconds(since: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
    let millis = (at - since).num_milliseconds();
    if millis <= 0 {
        0.0
    } else {
        millis as f64 / 1000.0
    }
}

/// Storage representation of a timestamp (RFC 3339, microsecond precision)
pub fn to_storage(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored RFC 3339 timestamp
pub fn from_storage(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::from_millis(0));
        assert_eq!(millis_to_duration(1000), Duration::from_secs(1));
        assert_eq!(millis_to_duration(u64::MAX).as_millis(), u64::MAX as u128);
    }

    #[test]
    fn test_elapsed_seconds_forward() {
        let start = now();
        let later = start + ChronoDuration::milliseconds(90_500);
        assert!((elapsed_seconds(start, later) - 90.5).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_seconds_clamps_future_start() {
        let at = now();
        let start = at + ChronoDuration::seconds(30);
        assert_eq!(elapsed_seconds(start, at), 0.0);
    }

    #[test]
    fn test_storage_roundtrip_keeps_microseconds() {
        let ts = now();
        let parsed = from_storage(&to_storage(ts)).unwrap();
        assert_eq!(parsed.timestamp_micros(), ts.timestamp_micros());
    }

    #[test]
    fn test_from_storage_rejects_garbage() {
        assert!(from_storage("yesterday").is_err());
    }
}
