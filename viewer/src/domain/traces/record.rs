//! Raw record access
//!
//! One query result row is a flat mapping from field name to value, with at
//! least three naming conventions for the same concepts (camelCase,
//! snake_case, log-store wrapper fields). `RawRecord` centralizes the
//! "first non-null of these key variants" lookup so normalization never
//! repeats ad hoc `a or b or c` chains.

use serde_json::{Map, Value as JsonValue};

use crate::utils::json::parse_json_with_fallback;

// ============================================================================
// FIELD KEY VARIANTS
// ============================================================================

pub mod keys {
    pub const SPAN_ID: &[&str] = &["spanId", "span_id", "SpanId"];
    pub const TRACE_ID: &[&str] = &["traceId", "trace_id", "TraceId"];
    pub const PARENT_SPAN_ID: &[&str] = &["parentSpanId", "parent_span_id", "ParentSpanId"];
    pub const NAME: &[&str] = &["name", "spanName", "operationName"];
    pub const START_TIME: &[&str] = &["startTimeUnixNano", "start_time_unix_nano", "startTime"];
    pub const END_TIME: &[&str] = &["endTimeUnixNano", "end_time_unix_nano", "endTime"];
    pub const DURATION_MS: &[&str] = &["durationMs", "duration_ms", "durationMilliseconds"];
    pub const TIME: &[&str] = &["timeUnixNano", "time_unix_nano", "observedTimeUnixNano"];
    pub const TIMESTAMP: &[&str] = &["@timestamp", "timestamp", "time"];
    pub const EVENT_NAME: &[&str] = &["eventName", "event.name", "event_name"];
    pub const BODY: &[&str] = &["body", "Body", "message"];
    pub const ATTRIBUTES: &[&str] = &["attributes", "Attributes", "resource"];
    pub const STATUS: &[&str] = &["status.code", "statusCode", "status"];
    pub const SERVICE_NAME: &[&str] = &[
        "resource.attributes.service.name",
        "service.name",
        "serviceName",
    ];

    /// Log-store wrapper fields whose inner payload is itself a record.
    pub const WRAPPED_MESSAGE: &str = "@message";
    pub const WRAPPED_TIMESTAMP: &str = "@timestamp";
}

// ============================================================================
// RAW RECORD
// ============================================================================

/// One raw query-result record.
#[derive(Debug, Clone)]
pub struct RawRecord {
    fields: Map<String, JsonValue>,
}

impl RawRecord {
    /// Wrap a flat record, unwrapping the log-store envelope when present:
    /// an `@message` field holding a JSON object (or a JSON-encoded string)
    /// is merged over the outer fields, inner values winning. The outer
    /// `@timestamp` survives as the fallback timestamp.
    pub fn new(mut fields: Map<String, JsonValue>) -> Self {
        if let Some(wrapped) = fields.remove(keys::WRAPPED_MESSAGE) {
            let inner = match wrapped {
                JsonValue::String(s) => parse_json_with_fallback(&s, keys::WRAPPED_MESSAGE),
                other => other,
            };
            match inner {
                JsonValue::Object(inner_map) => {
                    for (k, v) in inner_map {
                        fields.insert(k, v);
                    }
                }
                // Unparseable inner payload stays available as the body
                other => {
                    fields.entry("body").or_insert(other);
                }
            }
        }
        Self { fields }
    }

    /// First non-null value among the given key variants.
    pub fn first_of(&self, variants: &[&str]) -> Option<&JsonValue> {
        variants
            .iter()
            .filter_map(|k| self.fields.get(*k))
            .find(|v| !v.is_null())
    }

    pub fn str_of(&self, variants: &[&str]) -> Option<&str> {
        self.first_of(variants).and_then(JsonValue::as_str)
    }

    /// Numeric field that may arrive as a JSON number or a numeric string
    /// (log stores stringify large nanosecond values).
    pub fn u64_of(&self, variants: &[&str]) -> Option<u64> {
        match self.first_of(variants)? {
            JsonValue::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
            JsonValue::String(s) => s
                .parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as u64)),
            _ => None,
        }
    }

    pub fn f64_of(&self, variants: &[&str]) -> Option<f64> {
        match self.first_of(variants)? {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }

    /// The field map, order preserved.
    pub fn fields(&self) -> &Map<String, JsonValue> {
        &self.fields
    }

    /// An object-valued field that may also arrive as a JSON-encoded string.
    pub fn object_of(&self, variants: &[&str]) -> Option<Map<String, JsonValue>> {
        match self.first_of(variants)? {
            JsonValue::Object(map) => Some(map.clone()),
            JsonValue::String(s) => match parse_json_with_fallback(s, "record.object") {
                JsonValue::Object(map) => Some(map),
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> RawRecord {
        match value {
            JsonValue::Object(map) => RawRecord::new(map),
            _ => panic!("record fixture must be an object"),
        }
    }

    #[test]
    fn test_first_of_skips_null() {
        let rec = record(json!({"spanId": null, "span_id": "abc"}));
        assert_eq!(rec.str_of(keys::SPAN_ID), Some("abc"));
    }

    #[test]
    fn test_u64_of_numeric_string() {
        let rec = record(json!({"startTimeUnixNano": "1704067200000000000"}));
        assert_eq!(rec.u64_of(keys::START_TIME), Some(1704067200000000000));
    }

    #[test]
    fn test_wrapped_message_object_merges_over_outer() {
        let rec = record(json!({
            "@timestamp": "2024-06-01 10:30:00.000",
            "@message": {"spanId": "s1", "traceId": "t1", "body": {"role": "user"}}
        }));
        assert_eq!(rec.str_of(keys::SPAN_ID), Some("s1"));
        assert_eq!(rec.str_of(keys::TRACE_ID), Some("t1"));
        assert!(rec.first_of(keys::TIMESTAMP).is_some());
    }

    #[test]
    fn test_wrapped_message_json_string() {
        let rec = record(json!({
            "@message": "{\"traceId\": \"t1\", \"eventName\": \"gen_ai.user.message\"}"
        }));
        assert_eq!(rec.str_of(keys::TRACE_ID), Some("t1"));
        assert_eq!(rec.str_of(keys::EVENT_NAME), Some("gen_ai.user.message"));
    }

    #[test]
    fn test_wrapped_message_plain_string_becomes_body() {
        let rec = record(json!({"@message": "plain log line", "traceId": "t1"}));
        assert_eq!(rec.str_of(keys::BODY), Some("plain log line"));
    }

    #[test]
    fn test_object_of_json_encoded_string() {
        let rec = record(json!({"attributes": "{\"k\": 1}"}));
        let attrs = rec.object_of(keys::ATTRIBUTES).unwrap();
        assert_eq!(attrs["k"], 1);
    }
}
