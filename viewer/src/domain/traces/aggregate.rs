//! Trace aggregation
//!
//! Groups normalized spans and logs by trace identifier, resolves the
//! parent/child hierarchy, and derives per-span item lists. Hierarchy
//! resolution itself lives on `Trace` (`roots`, `children_of`); this module
//! owns grouping and the per-trace invariants (unique span ids, timestamp
//! ordering, the ungrouped bucket).

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::core::error::ViewError;

use super::normalize::NormalizedBatch;
use super::types::{ConversationItem, Trace};

/// Group a normalized batch into traces.
///
/// `trace_filter` restricts the result to one trace id. Zero matching
/// spans and logs is the typed `NoData` condition, not an empty Vec, so
/// callers can print a targeted message.
///
/// Traces are ordered by earliest span start time (traces with no
/// timestamped span last), then trace id, so session summaries are stable.
pub fn aggregate(
    batch: &NormalizedBatch,
    trace_filter: Option<&str>,
) -> Result<Vec<Trace>, ViewError> {
    let mut spans_by_trace: BTreeMap<String, Vec<super::types::Span>> = BTreeMap::new();
    let mut seen_span_ids: HashSet<(String, String)> = HashSet::new();

    for span in &batch.spans {
        if trace_filter.is_some_and(|t| t != span.trace_id) {
            continue;
        }
        // spanId is unique within a trace; a violating record is rejected
        // here, not the whole trace
        if !seen_span_ids.insert((span.trace_id.clone(), span.span_id.clone())) {
            tracing::debug!(
                trace_id = %span.trace_id,
                span_id = %span.span_id,
                "Duplicate span id within trace, keeping first"
            );
            continue;
        }
        spans_by_trace
            .entry(span.trace_id.clone())
            .or_default()
            .push(span.clone());
    }

    // Item grouping: by owning span id when that span exists in the same
    // trace, else the ungrouped bucket. Never discarded.
    let mut items_by_trace: BTreeMap<String, HashMap<String, Vec<ConversationItem>>> =
        BTreeMap::new();
    let mut ungrouped_by_trace: BTreeMap<String, Vec<ConversationItem>> = BTreeMap::new();

    for entry in &batch.logs {
        if trace_filter.is_some_and(|t| t != entry.log.trace_id) {
            continue;
        }
        let trace_id = &entry.log.trace_id;
        let known_span = entry.log.span_id.as_deref().filter(|sid| {
            spans_by_trace
                .get(trace_id)
                .is_some_and(|spans| spans.iter().any(|s| s.span_id == *sid))
        });

        let items = entry
            .item
            .iter()
            .chain(entry.tool_definitions.iter())
            .cloned();
        match known_span {
            Some(span_id) => items_by_trace
                .entry(trace_id.clone())
                .or_default()
                .entry(span_id.to_string())
                .or_default()
                .extend(items),
            None => ungrouped_by_trace
                .entry(trace_id.clone())
                .or_default()
                .extend(items),
        }
    }

    let trace_ids: HashSet<String> = spans_by_trace
        .keys()
        .chain(items_by_trace.keys())
        .chain(ungrouped_by_trace.keys())
        .cloned()
        .collect();

    let mut traces: Vec<Trace> = trace_ids
        .into_iter()
        .map(|trace_id| {
            let mut items_by_span = items_by_trace.remove(&trace_id).unwrap_or_default();
            for items in items_by_span.values_mut() {
                sort_items(items);
            }
            let mut ungrouped = ungrouped_by_trace.remove(&trace_id).unwrap_or_default();
            sort_items(&mut ungrouped);
            Trace {
                spans: spans_by_trace.remove(&trace_id).unwrap_or_default(),
                trace_id,
                items_by_span,
                ungrouped,
            }
        })
        .collect();

    traces.sort_by(|a, b| {
        match (a.earliest_start_nanos(), b.earliest_start_nanos()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.trace_id.cmp(&b.trace_id))
    });

    if traces.is_empty() {
        let scope = match trace_filter {
            Some(id) => format!("trace {id}"),
            None => "session".to_string(),
        };
        return Err(ViewError::no_data(scope));
    }
    Ok(traces)
}

/// Timestamp ascending, untimed items (tool definitions) last; stable, so
/// extraction order breaks ties.
fn sort_items(items: &mut [ConversationItem]) {
    items.sort_by(|a, b| match (a.timestamp(), b.timestamp()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
