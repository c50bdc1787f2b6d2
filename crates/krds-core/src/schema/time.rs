//! Epoch-millisecond timestamp rendering.

use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{DateTime, Local, NaiveDateTime, Timelike};

/// Sentinel meaning "no timestamp"
pub const NO_TIMESTAMP: i64 = -1;

/// Time zone used to render timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeZoneMode {
    /// Host local time
    #[default]
    Local,
    /// Coordinated universal time
    Utc,
}

/// Renders epoch milliseconds as a naive ISO-8601 timestamp in the given zone.
///
/// The fractional part is only emitted when it is non-zero, as microseconds.
pub fn format_epoch_millis(millis: i64, zone: TimeZoneMode) -> Result<String> {
    let instant =
        DateTime::from_timestamp_millis(millis).ok_or(Error::TimestampOutOfRange { millis })?;
    let naive: NaiveDateTime = match zone {
        TimeZoneMode::Utc => instant.naive_utc(),
        TimeZoneMode::Local => instant.with_timezone(&Local).naive_local(),
    };
    let text = if naive.nanosecond() == 0 {
        naive.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        naive.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    };
    Ok(text)
}

/// Like [`format_epoch_millis`], mapping [`NO_TIMESTAMP`] to [`Value::Null`]
pub fn epoch_millis_or_null(millis: i64, zone: TimeZoneMode) -> Result<Value> {
    if millis == NO_TIMESTAMP {
        return Ok(Value::Null);
    }
    format_epoch_millis(millis, zone).map(Value::String)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_seconds() {
        assert_eq!(
            format_epoch_millis(1_609_459_200_000, TimeZoneMode::Utc).unwrap(),
            "2021-01-01T00:00:00"
        );
    }

    #[test]
    fn test_fractional_seconds() {
        assert_eq!(
            format_epoch_millis(1_609_459_200_123, TimeZoneMode::Utc).unwrap(),
            "2021-01-01T00:00:00.123000"
        );
    }

    #[test]
    fn test_sentinel_is_null() {
        assert_eq!(
            epoch_millis_or_null(NO_TIMESTAMP, TimeZoneMode::Utc).unwrap(),
            Value::Null
        );
        assert_eq!(
            epoch_millis_or_null(0, TimeZoneMode::Utc).unwrap(),
            Value::from("1970-01-01T00:00:00")
        );
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            format_epoch_millis(i64::MAX, TimeZoneMode::Utc),
            Err(Error::TimestampOutOfRange { .. })
        ));
    }

    #[test]
    fn test_local_renders() {
        let text = format_epoch_millis(1_609_459_200_000, TimeZoneMode::Local).unwrap();
        assert_eq!(text.len(), "2021-01-01T00:00:00".len());
    }
}
