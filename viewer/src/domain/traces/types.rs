//! Core trace data model
//!
//! All types here are constructed once during normalization/aggregation and
//! immutable afterwards. Rendering multiple traces concurrently needs no
//! synchronization for that reason.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::utils::json::hash_json_value;

// ============================================================================
// SPAN STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanStatus {
    Ok,
    Error,
    #[default]
    Unset,
}

impl SpanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::Unset => "UNSET",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::Error => "✗",
            Self::Unset => "○",
        }
    }

    /// Parse a status string. Accepts plain (`OK`), OTLP enum
    /// (`STATUS_CODE_OK`), and lowercase spellings.
    pub fn parse(s: &str) -> Self {
        let s = s.strip_prefix("STATUS_CODE_").unwrap_or(s);
        if s.eq_ignore_ascii_case("ok") {
            Self::Ok
        } else if s.eq_ignore_ascii_case("error") {
            Self::Error
        } else {
            Self::Unset
        }
    }

    /// Numeric OTLP status code: 0 = UNSET, 1 = OK, 2 = ERROR.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Ok,
            2 => Self::Error,
            _ => Self::Unset,
        }
    }
}

// ============================================================================
// SPAN
// ============================================================================

/// One timed unit of execution within a trace. Immutable after normalization.
#[derive(Debug, Clone, Serialize)]
pub struct Span {
    pub span_id: String,
    pub trace_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub start_time_nanos: Option<u64>,
    pub end_time_nanos: Option<u64>,
    /// Derived from timestamps when both are present, otherwise taken from
    /// an explicit duration field, otherwise unknown. Never defaulted to 0.
    pub duration_ms: Option<f64>,
    pub status: SpanStatus,
    pub service_name: Option<String>,
    pub attributes: Map<String, JsonValue>,
}

// ============================================================================
// RUNTIME LOG
// ============================================================================

/// A free-form log record correlated to a span. Consumed only by extraction.
#[derive(Debug, Clone)]
pub struct RuntimeLog {
    pub timestamp: Option<DateTime<Utc>>,
    pub span_id: Option<String>,
    pub trace_id: String,
    pub event_name: Option<String>,
    pub body: JsonValue,
    pub raw_attributes: Map<String, JsonValue>,
}

// ============================================================================
// ROLES
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    #[default]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::Unknown => "unknown",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::System => "⚙",
            Self::User => "👤",
            Self::Assistant => "🤖",
            Self::Tool => "🔧",
            Self::Unknown => "•",
        }
    }

    /// Parse a role string from a message body. Unknown strings map to
    /// `Unknown`, never an error.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "system" | "developer" => Self::System,
            "user" | "human" => Self::User,
            "assistant" | "ai" | "model" => Self::Assistant,
            "tool" | "function" => Self::Tool,
            _ => Self::Unknown,
        }
    }

    /// Derive a role from a `gen_ai.<role>.message` event name.
    /// `gen_ai.choice` is the model's completion, hence assistant.
    pub fn from_event_name(event_name: &str) -> Option<Self> {
        if event_name == "gen_ai.choice" {
            return Some(Self::Assistant);
        }
        let mut parts = event_name.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("gen_ai"), Some(role), Some("message"), None) => Some(Self::parse(role)),
            _ => None,
        }
    }
}

// ============================================================================
// CONVERSATION ITEMS
// ============================================================================

/// Everything the renderer can display for a span, extracted from a
/// RuntimeLog. One log yields at most one item from the extraction chain
/// (tool definitions are scanned separately).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationItem {
    Message {
        role: Role,
        content: String,
        timestamp: Option<DateTime<Utc>>,
        event_name: Option<String>,
    },
    ToolInvocation {
        name: String,
        input: Map<String, JsonValue>,
        id: Option<String>,
        timestamp: Option<DateTime<Utc>>,
    },
    ToolResult {
        id: Option<String>,
        content: String,
        timestamp: Option<DateTime<Utc>>,
    },
    ToolDefinition {
        name: String,
        description: Option<String>,
    },
    Event {
        name: String,
        payload: JsonValue,
        timestamp: Option<DateTime<Utc>>,
        is_exception: bool,
    },
}

impl ConversationItem {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Message { timestamp, .. }
            | Self::ToolInvocation { timestamp, .. }
            | Self::ToolResult { timestamp, .. }
            | Self::Event { timestamp, .. } => *timestamp,
            Self::ToolDefinition { .. } => None,
        }
    }

    /// Whether truncation policy should treat this as tool content.
    /// Keyed off the variant, not the rendered text.
    pub fn is_tool_tagged(&self) -> bool {
        matches!(
            self,
            Self::ToolInvocation { .. }
                | Self::ToolResult { .. }
                | Self::Message {
                    role: Role::Tool,
                    ..
                }
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Event {
                is_exception: true,
                ..
            }
        )
    }

    /// Deduplication identity: a deterministic function of the item's
    /// content and timestamp, not object identity. Two value-equal items
    /// always hash alike, so history re-sends collapse across nested spans.
    pub fn identity(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self {
            Self::Message {
                role,
                content,
                timestamp,
                event_name,
            } => {
                0u8.hash(&mut hasher);
                role.as_str().hash(&mut hasher);
                content.hash(&mut hasher);
                timestamp.map(|t| t.timestamp_micros()).hash(&mut hasher);
                event_name.hash(&mut hasher);
            }
            Self::ToolInvocation {
                name, input, id, ..
            } => {
                // Identified by content, not timestamp: history re-sends of
                // the same call keep the id but refresh the event time.
                1u8.hash(&mut hasher);
                name.hash(&mut hasher);
                hash_json_value(&mut hasher, &JsonValue::Object(input.clone()));
                id.hash(&mut hasher);
            }
            Self::ToolResult { id, content, .. } => {
                2u8.hash(&mut hasher);
                id.hash(&mut hasher);
                content.hash(&mut hasher);
            }
            Self::ToolDefinition { name, description } => {
                3u8.hash(&mut hasher);
                name.hash(&mut hasher);
                description.hash(&mut hasher);
            }
            Self::Event {
                name,
                payload,
                timestamp,
                is_exception,
            } => {
                4u8.hash(&mut hasher);
                name.hash(&mut hasher);
                hash_json_value(&mut hasher, payload);
                timestamp.map(|t| t.timestamp_micros()).hash(&mut hasher);
                is_exception.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

// ============================================================================
// TRACE
// ============================================================================

/// Aggregate root for one trace identifier. Read-only after construction.
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub trace_id: String,
    pub spans: Vec<Span>,
    /// Items grouped by owning span id, each list sorted by timestamp.
    pub items_by_span: HashMap<String, Vec<ConversationItem>>,
    /// Items whose log carried no resolvable span id. Kept inspectable.
    pub ungrouped: Vec<ConversationItem>,
}

impl Trace {
    pub fn span(&self, span_id: &str) -> Option<&Span> {
        self.spans.iter().find(|s| s.span_id == span_id)
    }

    /// Spans with no resolvable parent (absent or orphaned reference),
    /// ordered by start time ascending, missing start time last, ties by
    /// span id for determinism.
    pub fn roots(&self) -> Vec<&Span> {
        let known: std::collections::HashSet<&str> =
            self.spans.iter().map(|s| s.span_id.as_str()).collect();
        let mut roots: Vec<&Span> = self
            .spans
            .iter()
            .filter(|s| {
                s.parent_span_id
                    .as_deref()
                    .is_none_or(|p| !known.contains(p))
            })
            .collect();
        sort_sibling_spans(&mut roots);
        roots
    }

    /// Direct children of a span, in the same deterministic order as roots.
    pub fn children_of(&self, span_id: &str) -> Vec<&Span> {
        let mut children: Vec<&Span> = self
            .spans
            .iter()
            .filter(|s| s.parent_span_id.as_deref() == Some(span_id))
            .collect();
        sort_sibling_spans(&mut children);
        children
    }

    /// Total trace duration in milliseconds.
    ///
    /// Window across all spans carrying both timestamps (`max(end) -
    /// min(start)`); nesting and overlap never double count. When no span
    /// has both timestamps, degrade to the sum of known durations over
    /// roots only.
    pub fn duration_ms(&self) -> Option<f64> {
        let timestamped: Vec<(u64, u64)> = self
            .spans
            .iter()
            .filter_map(|s| Some((s.start_time_nanos?, s.end_time_nanos?)))
            .collect();

        if !timestamped.is_empty() {
            let min_start = timestamped.iter().map(|(s, _)| *s).min()?;
            let max_end = timestamped.iter().map(|(_, e)| *e).max()?;
            return Some(crate::utils::time::nanos_to_millis(
                max_end.saturating_sub(min_start),
            ));
        }

        let root_durations: Vec<f64> = self.roots().iter().filter_map(|s| s.duration_ms).collect();
        if root_durations.is_empty() {
            None
        } else {
            Some(root_durations.iter().sum())
        }
    }

    /// Error-status spans plus exception items, across grouped and
    /// ungrouped buckets.
    pub fn error_count(&self) -> usize {
        let span_errors = self
            .spans
            .iter()
            .filter(|s| s.status == SpanStatus::Error)
            .count();
        let item_errors = self
            .items_by_span
            .values()
            .flatten()
            .chain(self.ungrouped.iter())
            .filter(|i| i.is_error())
            .count();
        span_errors + item_errors
    }

    /// Overall status: ERROR if any contained span or item is an error.
    pub fn status(&self) -> SpanStatus {
        if self.error_count() > 0 {
            SpanStatus::Error
        } else {
            SpanStatus::Ok
        }
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Earliest known start time, used to order traces in the session view.
    pub fn earliest_start_nanos(&self) -> Option<u64> {
        self.spans.iter().filter_map(|s| s.start_time_nanos).min()
    }
}

/// Shared sibling ordering: start time ascending, missing start last,
/// span id as the final tiebreaker.
fn sort_sibling_spans(spans: &mut [&Span]) {
    spans.sort_by(|a, b| {
        match (a.start_time_nanos, b.start_time_nanos) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.span_id.cmp(&b.span_id))
    });
}
