//! Structured trace export
//!
//! Serializes the full trace object graph (spans with hierarchy, items by
//! span) plus the derived aggregates, for downstream tooling such as
//! evaluation clients.

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::types::{ConversationItem, Span, SpanStatus, Trace};

#[derive(Serialize)]
struct TraceExport<'a> {
    trace_id: &'a str,
    span_count: usize,
    duration_ms: Option<f64>,
    error_count: usize,
    status: SpanStatus,
    spans: &'a [Span],
    items_by_span: &'a std::collections::HashMap<String, Vec<ConversationItem>>,
    ungrouped: &'a [ConversationItem],
}

impl<'a> From<&'a Trace> for TraceExport<'a> {
    fn from(trace: &'a Trace) -> Self {
        Self {
            trace_id: &trace.trace_id,
            span_count: trace.span_count(),
            duration_ms: trace.duration_ms(),
            error_count: trace.error_count(),
            status: trace.status(),
            spans: &trace.spans,
            items_by_span: &trace.items_by_span,
            ungrouped: &trace.ungrouped,
        }
    }
}

/// Export traces as a generic structured document.
pub fn export_traces(traces: &[Trace]) -> JsonValue {
    let exports: Vec<TraceExport<'_>> = traces.iter().map(TraceExport::from).collect();
    serde_json::json!({ "traces": exports })
}

/// Pretty-printed export for the CLI surface.
pub fn export_to_string(traces: &[Trace]) -> String {
    serde_json::to_string_pretty(&export_traces(traces)).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Trace export serialization failed");
        "{}".to_string()
    })
}
