//! Record normalization
//!
//! Converts raw query-result records into typed Spans and RuntimeLogs, and
//! runs item extraction over each log. One record yields exactly one span or
//! one log; malformed records are skipped with a diagnostic and counted,
//! never propagated as errors.

use serde_json::Value as JsonValue;

use crate::utils::time::{nanos_to_datetime, nanos_to_millis, parse_timestamp};

use super::extract::{extract_item, extract_tool_definitions};
use super::record::{RawRecord, keys};
use super::types::{ConversationItem, RuntimeLog, Span, SpanStatus};

// ============================================================================
// OUTPUT TYPES
// ============================================================================

/// One normalized log with its extraction results.
#[derive(Debug, Clone)]
pub struct NormalizedLog {
    pub log: RuntimeLog,
    /// At most one item from the extraction chain.
    pub item: Option<ConversationItem>,
    /// Tool definitions scanned from the body's `tools` array.
    pub tool_definitions: Vec<ConversationItem>,
}

/// Batch result plus extraction diagnostics.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub spans: Vec<Span>,
    pub logs: Vec<NormalizedLog>,
    pub stats: NormalizeStats,
}

/// Per-batch diagnostic totals, printed in debug mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub records: usize,
    pub spans: usize,
    pub logs: usize,
    pub items: usize,
    pub skipped: usize,
}

// ============================================================================
// NORMALIZER
// ============================================================================

/// Stateless per-invocation normalizer. The debug flag is an explicit
/// constructor value, not a process-wide toggle.
pub struct Normalizer {
    debug: bool,
}

impl Normalizer {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Normalize an ordered batch of raw records. Non-object entries and
    /// records missing required fields are skipped and counted.
    pub fn normalize_batch(&self, records: &[JsonValue]) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();

        for record in records {
            batch.stats.records += 1;
            let fields = match record {
                JsonValue::Object(map) => map.clone(),
                other => {
                    batch.stats.skipped += 1;
                    tracing::debug!(kind = %json_kind(other), "Skipping non-object record");
                    continue;
                }
            };
            let rec = RawRecord::new(fields);

            if is_span_candidate(&rec) {
                match build_span(&rec) {
                    Some(span) => {
                        batch.stats.spans += 1;
                        batch.spans.push(span);
                    }
                    None => {
                        batch.stats.skipped += 1;
                        tracing::debug!("Skipping span record with no trace id");
                    }
                }
                continue;
            }

            match build_log(&rec) {
                Some(log) => {
                    let item = extract_item(&log);
                    if self.debug {
                        tracing::debug!(
                            event_name = log.event_name.as_deref().unwrap_or(""),
                            branch = item.as_ref().map(|(_, b)| *b).unwrap_or("none"),
                            "Normalized log record"
                        );
                    }
                    let tool_definitions = extract_tool_definitions(&log.body);
                    let item = item.map(|(item, _)| item);
                    batch.stats.logs += 1;
                    batch.stats.items +=
                        item.is_some() as usize + tool_definitions.len();
                    batch.logs.push(NormalizedLog {
                        log,
                        item,
                        tool_definitions,
                    });
                }
                None => {
                    batch.stats.skipped += 1;
                    tracing::debug!("Skipping record with neither span nor log shape");
                }
            }
        }

        tracing::debug!(
            records = batch.stats.records,
            spans = batch.stats.spans,
            logs = batch.stats.logs,
            items = batch.stats.items,
            skipped = batch.stats.skipped,
            "Normalized record batch"
        );
        batch
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

// ============================================================================
// SPAN CONSTRUCTION
// ============================================================================

/// A record is a span candidate when it carries both a span identifier and
/// a start-time field. Missing end time is tolerated.
fn is_span_candidate(rec: &RawRecord) -> bool {
    rec.str_of(keys::SPAN_ID).is_some() && rec.u64_of(keys::START_TIME).is_some()
}

fn build_span(rec: &RawRecord) -> Option<Span> {
    let span_id = rec.str_of(keys::SPAN_ID)?.to_string();
    let trace_id = rec.str_of(keys::TRACE_ID)?.to_string();
    let start_time_nanos = rec.u64_of(keys::START_TIME);
    let end_time_nanos = rec.u64_of(keys::END_TIME);

    // Derived from timestamps when both are present; explicit field
    // otherwise; unknown (never zero) when neither source exists.
    let duration_ms = match (start_time_nanos, end_time_nanos) {
        (Some(start), Some(end)) => Some(nanos_to_millis(end.saturating_sub(start))),
        _ => rec.f64_of(keys::DURATION_MS),
    };

    let status = match rec.first_of(keys::STATUS) {
        Some(JsonValue::String(s)) => SpanStatus::parse(s),
        Some(JsonValue::Number(n)) => n.as_i64().map(SpanStatus::from_code).unwrap_or_default(),
        Some(JsonValue::Object(obj)) => obj
            .get("code")
            .map(|c| match c {
                JsonValue::String(s) => SpanStatus::parse(s),
                JsonValue::Number(n) => {
                    n.as_i64().map(SpanStatus::from_code).unwrap_or_default()
                }
                _ => SpanStatus::Unset,
            })
            .unwrap_or_default(),
        _ => SpanStatus::Unset,
    };

    Some(Span {
        span_id,
        trace_id,
        parent_span_id: rec
            .str_of(keys::PARENT_SPAN_ID)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        name: rec
            .str_of(keys::NAME)
            .unwrap_or("unknown")
            .to_string(),
        start_time_nanos,
        end_time_nanos,
        duration_ms,
        status,
        service_name: rec.str_of(keys::SERVICE_NAME).map(str::to_string),
        attributes: rec.object_of(keys::ATTRIBUTES).unwrap_or_default(),
    })
}

// ============================================================================
// LOG CONSTRUCTION
// ============================================================================

fn build_log(rec: &RawRecord) -> Option<RuntimeLog> {
    let trace_id = rec.str_of(keys::TRACE_ID)?.to_string();
    let event_name = rec.str_of(keys::EVENT_NAME).map(str::to_string);
    let body = rec.first_of(keys::BODY).cloned().unwrap_or(JsonValue::Null);

    // A log must carry something to extract from
    if body.is_null() && event_name.is_none() {
        return None;
    }

    let timestamp = rec
        .u64_of(keys::TIME)
        .map(nanos_to_datetime)
        .or_else(|| rec.first_of(keys::TIMESTAMP).and_then(parse_timestamp));

    Some(RuntimeLog {
        timestamp,
        span_id: rec
            .str_of(keys::SPAN_ID)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        trace_id,
        event_name,
        body,
        raw_attributes: rec.object_of(keys::ATTRIBUTES).unwrap_or_default(),
    })
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
