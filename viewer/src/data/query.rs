//! Log-store query building
//!
//! Near-leaf utility for the external fetch collaborator: formats the query
//! string and absolute time window used to retrieve raw span/log records.
//! No I/O happens here; the fetch layer owns execution, retries, and
//! timeouts.

use chrono::{DateTime, Duration, Utc};

use crate::core::constants::DEFAULT_QUERY_LIMIT;

// ============================================================================
// TIME WINDOW
// ============================================================================

/// Absolute query window derived from a relative lookback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    /// Window ending at `end` and reaching `lookback` into the past.
    pub fn lookback(end: DateTime<Utc>, lookback: Duration) -> Self {
        Self {
            start: end - lookback,
            end,
        }
    }

    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

// ============================================================================
// QUERY BUILDER
// ============================================================================

/// Builds the log-store query text. Filters compose with AND; ids are
/// quoted and escaped.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    trace_id: Option<String>,
    session_id: Option<String>,
    limit: Option<usize>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(&self) -> String {
        let mut lines = vec!["fields @timestamp, @message".to_string()];
        if let Some(trace_id) = &self.trace_id {
            lines.push(format!("| filter traceId = '{}'", escape_value(trace_id)));
        }
        if let Some(session_id) = &self.session_id {
            lines.push(format!(
                "| filter attributes.session.id = '{}'",
                escape_value(session_id)
            ));
        }
        lines.push("| sort @timestamp asc".to_string());
        lines.push(format!(
            "| limit {}",
            self.limit.unwrap_or(DEFAULT_QUERY_LIMIT)
        ));
        lines.join("\n")
    }
}

/// Escape single quotes so a filter value cannot break out of its literal.
fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
