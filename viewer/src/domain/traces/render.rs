//! Delta-tracking hierarchical rendering
//!
//! Walks each trace's span tree in deterministic pre-order and renders every
//! conversation item exactly once, at the shallowest span where it first
//! appears. Agent runtimes re-send conversation history into nested spans,
//! so without the seen-set a chat turn at depth 3 would render again at
//! every ancestor.
//!
//! The seen set is owned by one top-level render call and passed by
//! reference only within that call tree; independent renders never share
//! state, so traces can be rendered in parallel.

use std::collections::HashSet;
use std::fmt::Write;

use crate::core::config::ViewConfig;
use crate::core::constants::{BAND_FAST_MAX_MS, BAND_NORMAL_MAX_MS, BAND_SLOW_MAX_MS};
use crate::utils::json::{summarize_payload, value_to_compact_string};
use crate::utils::string::{single_line, truncate_preview};

use super::types::{ConversationItem, Span, Trace};

// ============================================================================
// DURATION BANDS
// ============================================================================

/// Coarse duration buckets, each with a distinct ANSI color marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationBand {
    Fast,     // < 100ms
    Normal,   // 100ms - 1s
    Slow,     // 1s - 5s
    VerySlow, // > 5s
}

impl DurationBand {
    pub fn classify(ms: f64) -> Self {
        if ms < BAND_FAST_MAX_MS {
            Self::Fast
        } else if ms < BAND_NORMAL_MAX_MS {
            Self::Normal
        } else if ms < BAND_SLOW_MAX_MS {
            Self::Slow
        } else {
            Self::VerySlow
        }
    }

    /// ANSI color code for this band.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Fast => "\x1b[32m",     // green
            Self::Normal => "\x1b[36m",   // cyan
            Self::Slow => "\x1b[33m",     // yellow
            Self::VerySlow => "\x1b[31m", // red
        }
    }
}

const ANSI_RESET: &str = "\x1b[0m";

/// Duration text with its band color, or a plain placeholder when unknown.
pub fn format_duration(ms: Option<f64>) -> String {
    match ms {
        Some(ms) => {
            let band = DurationBand::classify(ms);
            let text = if ms >= 1_000.0 {
                format!("{:.1}s", ms / 1_000.0)
            } else {
                format!("{ms:.0}ms")
            };
            format!("{}{}{}", band.color(), text, ANSI_RESET)
        }
        None => "--".to_string(),
    }
}

// ============================================================================
// RENDERER
// ============================================================================

pub struct Renderer<'a> {
    config: &'a ViewConfig,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a ViewConfig) -> Self {
        Self { config }
    }

    /// Render one trace as a tree. Pure function of the trace and the
    /// configuration: rendering twice yields byte-identical output.
    pub fn render_trace(&self, trace: &Trace) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} Trace {} ({} spans, {}, {})",
            trace.status().glyph(),
            trace.trace_id,
            trace.span_count(),
            format_duration(trace.duration_ms()),
            trace.status().as_str(),
        );

        let mut seen: HashSet<u64> = HashSet::new();
        let roots = trace.roots();
        let root_count = roots.len();
        for (i, root) in roots.into_iter().enumerate() {
            self.render_span(trace, root, "", i + 1 == root_count, &mut seen, &mut out);
        }

        let unseen_ungrouped: Vec<&ConversationItem> = trace
            .ungrouped
            .iter()
            .filter(|item| !seen.contains(&item.identity()))
            .collect();
        if !unseen_ungrouped.is_empty() {
            let _ = writeln!(out, "  (ungrouped)");
            for item in unseen_ungrouped {
                let _ = writeln!(out, "    {}", self.format_item(item));
            }
        }

        out
    }

    fn render_span(
        &self,
        trace: &Trace,
        span: &Span,
        prefix: &str,
        is_last: bool,
        seen: &mut HashSet<u64>,
        out: &mut String,
    ) {
        let connector = if prefix.is_empty() {
            ""
        } else if is_last {
            "└─ "
        } else {
            "├─ "
        };
        let mut line = format!(
            "{prefix}{connector}{} {} {}",
            span.status.glyph(),
            span.name,
            format_duration(span.duration_ms),
        );
        if self.config.verbose {
            let _ = write!(line, " [{}]", span.span_id);
            if let Some(service) = &span.service_name {
                let _ = write!(line, " ({service})");
            }
        }
        let _ = writeln!(out, "{line}");

        let child_prefix = format!("{prefix}{}", if prefix.is_empty() {
            "  "
        } else if is_last {
            "   "
        } else {
            "│  "
        });

        // Delta filtering: items an ancestor (or this span, for intra-span
        // duplicates) already rendered are dropped; every identity is in the
        // seen set before descending, so it accumulates monotonically along
        // each root-to-leaf path.
        if let Some(items) = trace.items_by_span.get(&span.span_id) {
            for item in items {
                if seen.insert(item.identity()) {
                    let _ = writeln!(out, "{child_prefix}{}", self.format_item(item));
                }
            }
        }

        let children = trace.children_of(&span.span_id);
        let child_count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.render_span(trace, child, &child_prefix, i + 1 == child_count, seen, out);
        }
    }

    /// One line per item, truncated per the item's semantic tag.
    fn format_item(&self, item: &ConversationItem) -> String {
        let limit = self.config.limit_for(item.is_tool_tagged());
        match item {
            ConversationItem::Message { role, content, .. } => format!(
                "{} {}: {}",
                role.glyph(),
                role.as_str(),
                self.clip(content, limit)
            ),
            ConversationItem::ToolInvocation {
                name, input, id, ..
            } => {
                let args = serde_json::to_string(input).unwrap_or_default();
                let mut line = format!("🔧 {}({})", name, self.clip(&args, limit));
                if self.config.verbose {
                    if let Some(id) = id {
                        let _ = write!(line, " [{id}]");
                    }
                }
                line
            }
            ConversationItem::ToolResult { id, content, .. } => format!(
                "🔧 [{}] {}",
                id.as_deref().unwrap_or("-"),
                self.clip(content, limit)
            ),
            ConversationItem::ToolDefinition { name, description } => match description {
                Some(desc) => format!("📋 tool {}: {}", name, self.clip(desc, limit)),
                None => format!("📋 tool {name}"),
            },
            ConversationItem::Event {
                name,
                payload,
                is_exception,
                ..
            } => {
                let glyph = if *is_exception { "⚠" } else { "⚡" };
                let summary = if *is_exception {
                    value_to_compact_string(payload)
                } else {
                    summarize_payload(payload)
                };
                format!("{} {} {}", glyph, name, self.clip(&summary, limit))
            }
        }
    }

    fn clip(&self, text: &str, limit: Option<usize>) -> String {
        let flat = single_line(text);
        match limit {
            Some(max) => truncate_preview(&flat, max),
            None => flat,
        }
    }

    // ========================================================================
    // SESSION SUMMARY
    // ========================================================================

    /// Tabular session view: one row per trace.
    pub fn render_summary(&self, traces: &[Trace]) -> String {
        let id_width = traces
            .iter()
            .map(|t| t.trace_id.len())
            .chain(std::iter::once("TRACE".len()))
            .max()
            .unwrap_or(5);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<id_width$}  {:>5}  {:>10}  {:>6}  STATUS",
            "TRACE", "SPANS", "DURATION", "ERRORS",
        );
        for trace in traces {
            let duration = match trace.duration_ms() {
                Some(ms) if ms >= 1_000.0 => format!("{:.1}s", ms / 1_000.0),
                Some(ms) => format!("{ms:.0}ms"),
                None => "--".to_string(),
            };
            let status = trace.status();
            let _ = writeln!(
                out,
                "{:<id_width$}  {:>5}  {:>10}  {:>6}  {} {}",
                trace.trace_id,
                trace.span_count(),
                duration,
                trace.error_count(),
                status.glyph(),
                status.as_str(),
            );
        }
        out
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
