//! Time utility functions

use chrono::{DateTime, TimeZone, Utc};

/// Convert nanoseconds since Unix epoch to DateTime<Utc>
pub fn nanos_to_datetime(nanos: u64) -> DateTime<Utc> {
    let secs = (nanos / 1_000_000_000) as i64;
    let nsecs = (nanos % 1_000_000_000) as u32;
    Utc.timestamp_opt(secs, nsecs).single().unwrap_or_else(|| {
        tracing::warn!(nanos, "Invalid timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

/// Convert a nanosecond interval to fractional milliseconds.
pub fn nanos_to_millis(nanos: u64) -> f64 {
    nanos as f64 / 1_000_000.0
}

/// Parse a timestamp that may be RFC 3339, epoch milliseconds, or epoch
/// seconds with a fractional part. Log-store wrapper fields use the RFC 3339
/// form; raw exporter fields use epoch numbers.
pub fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            // Log-store timestamps come back as "2025-01-01 12:00:00.000"
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(naive.and_utc());
            }
            s.parse::<f64>().ok().and_then(epoch_number_to_datetime)
        }
        serde_json::Value::Number(n) => n.as_f64().and_then(epoch_number_to_datetime),
        _ => None,
    }
}

/// Interpret an epoch number whose unit is unknown (seconds, millis, or nanos).
///
/// Magnitude disambiguates: values above 1e16 are nanoseconds, above 1e11 are
/// milliseconds, anything else is seconds.
fn epoch_number_to_datetime(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() || n < 0.0 {
        return None;
    }
    let millis = if n > 1e16 {
        n / 1_000_000.0
    } else if n > 1e11 {
        n
    } else {
        n * 1000.0
    };
    DateTime::from_timestamp_millis(millis as i64)
}
