//! JSON utility functions

use std::hash::{Hash, Hasher};

use serde_json::Value as JsonValue;

/// Parse a string as JSON, with logging on parse failure.
///
/// Returns the parsed JSON value on success, or the original string as a JSON
/// string on failure.
pub fn parse_json_with_fallback(value: &str, context: &str) -> JsonValue {
    match serde_json::from_str(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::trace!(
                context = context,
                error = %e,
                "JSON parse failed, using string fallback"
            );
            JsonValue::String(value.to_string())
        }
    }
}

/// Render a JSON value as a compact single string, without quoting strings.
pub fn value_to_compact_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Keys probed, in priority order, when summarizing an arbitrary payload.
const SUMMARY_KEYS: &[&str] = &[
    "type", "name", "id", "status", "message", "error", "result", "count", "data",
];

/// Best-effort one-line summary of an arbitrary event payload.
///
/// Probes a fixed priority list of informative keys; if none are present,
/// falls back to the first three keys of the object. Non-object payloads are
/// rendered compactly as-is.
pub fn summarize_payload(payload: &JsonValue) -> String {
    let obj = match payload {
        JsonValue::Object(map) => map,
        other => return value_to_compact_string(other),
    };
    if obj.is_empty() {
        return String::new();
    }

    let mut parts = Vec::new();
    for key in SUMMARY_KEYS {
        if let Some(value) = obj.get(*key) {
            parts.push(format!("{}={}", key, value_to_compact_string(value)));
        }
    }
    if parts.is_empty() {
        for (key, value) in obj.iter().take(3) {
            parts.push(format!("{}={}", key, value_to_compact_string(value)));
        }
    }
    parts.join(" ")
}

/// Hash a JSON value into a hasher, with fallback for serialization failures.
///
/// Serializes the JSON value to a string and hashes it. If serialization
/// fails (extremely rare), hashes a fallback marker plus the JSON type
/// discriminant to avoid silent collisions.
#[inline]
pub fn hash_json_value<H: Hasher>(hasher: &mut H, value: &JsonValue) {
    match serde_json::to_string(value) {
        Ok(s) => s.hash(hasher),
        Err(_) => {
            "__json_serialization_failed__".hash(hasher);
            std::mem::discriminant(value).hash(hasher);
        }
    }
}
