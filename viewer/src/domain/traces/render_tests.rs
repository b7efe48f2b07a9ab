//! Tests for delta-tracking rendering

use chrono::{TimeZone, Utc};
use serde_json::{Map, json};

use super::*;
use crate::domain::traces::types::{Role, SpanStatus};

fn span(id: &str, parent: Option<&str>, start: u64) -> Span {
    Span {
        span_id: id.to_string(),
        trace_id: "t1".to_string(),
        parent_span_id: parent.map(str::to_string),
        name: id.to_string(),
        start_time_nanos: Some(start),
        end_time_nanos: Some(start + 1_000_000),
        duration_ms: Some(1.0),
        status: SpanStatus::Ok,
        service_name: None,
        attributes: Map::new(),
    }
}

fn message(content: &str, micros: i64) -> ConversationItem {
    ConversationItem::Message {
        role: Role::User,
        content: content.to_string(),
        timestamp: Some(Utc.timestamp_micros(micros).unwrap()),
        event_name: None,
    }
}

fn trace(spans: Vec<Span>, items: Vec<(&str, Vec<ConversationItem>)>) -> Trace {
    Trace {
        trace_id: "t1".to_string(),
        spans,
        items_by_span: items
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        ungrouped: Vec::new(),
    }
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// ============================================================================
// DELTA DEDUPLICATION
// ============================================================================

#[test]
fn test_item_renders_once_at_shallowest_span_scenario_d() {
    // The same chat turn propagates up through nested spans: it must render
    // only where first encountered (invoke_agent, the shallowest owner).
    let turn = message("What is 2+2?", 1_000);
    let t = trace(
        vec![
            span("invoke_agent", None, 0),
            span("execute_event_loop_cycle", Some("invoke_agent"), 10),
            span("chat", Some("execute_event_loop_cycle"), 20),
        ],
        vec![
            ("invoke_agent", vec![turn.clone()]),
            ("execute_event_loop_cycle", vec![turn.clone()]),
            ("chat", vec![turn.clone()]),
        ],
    );
    let config = ViewConfig::default();
    let out = Renderer::new(&config).render_trace(&t);

    assert_eq!(count_occurrences(&out, "What is 2+2?"), 1);
    // All three spans still render
    assert!(out.contains("invoke_agent"));
    assert!(out.contains("execute_event_loop_cycle"));
    assert!(out.contains("chat"));
}

#[test]
fn test_deep_first_occurrence_renders_at_owning_span() {
    // Item owned only by the deepest span renders there, once.
    let turn = message("deep only", 1_000);
    let t = trace(
        vec![
            span("root", None, 0),
            span("mid", Some("root"), 10),
            span("leaf", Some("mid"), 20),
        ],
        vec![("leaf", vec![turn])],
    );
    let config = ViewConfig::default();
    let out = Renderer::new(&config).render_trace(&t);
    assert_eq!(count_occurrences(&out, "deep only"), 1);
}

#[test]
fn test_duplicate_across_siblings_renders_once() {
    let turn = message("shared context", 1_000);
    let t = trace(
        vec![
            span("root", None, 0),
            span("left", Some("root"), 10),
            span("right", Some("root"), 20),
        ],
        vec![
            ("left", vec![turn.clone()]),
            ("right", vec![turn.clone()]),
        ],
    );
    let config = ViewConfig::default();
    let out = Renderer::new(&config).render_trace(&t);
    assert_eq!(count_occurrences(&out, "shared context"), 1);
}

#[test]
fn test_rendering_is_idempotent() {
    let t = trace(
        vec![span("root", None, 0), span("child", Some("root"), 10)],
        vec![
            ("root", vec![message("hello", 1)]),
            (
                "child",
                vec![ConversationItem::ToolInvocation {
                    name: "calculate".to_string(),
                    input: json!({"expression": "2+2"}).as_object().unwrap().clone(),
                    id: Some("call_x".to_string()),
                    timestamp: None,
                }],
            ),
        ],
    );
    let config = ViewConfig::default();
    let renderer = Renderer::new(&config);
    assert_eq!(renderer.render_trace(&t), renderer.render_trace(&t));
}

#[test]
fn test_ungrouped_items_rendered() {
    let mut t = trace(vec![span("root", None, 0)], vec![]);
    t.ungrouped.push(message("unattached", 1_000));
    let config = ViewConfig::default();
    let out = Renderer::new(&config).render_trace(&t);
    assert!(out.contains("(ungrouped)"));
    assert!(out.contains("unattached"));
}

// ============================================================================
// TRUNCATION
// ============================================================================

#[test]
fn test_ordinary_content_truncated_with_ellipsis() {
    let long = "x".repeat(500);
    let t = trace(vec![span("root", None, 0)], vec![("root", vec![message(&long, 1)])]);
    let config = ViewConfig::default();
    let out = Renderer::new(&config).render_trace(&t);
    assert!(out.contains("..."));
    assert!(!out.contains(&long));
}

#[test]
fn test_verbose_exempts_tool_content_only() {
    let long_result = "r".repeat(400);
    let long_message = "m".repeat(400);
    let t = trace(
        vec![span("root", None, 0)],
        vec![(
            "root",
            vec![
                ConversationItem::ToolResult {
                    id: Some("call_1".to_string()),
                    content: long_result.clone(),
                    timestamp: Some(Utc.timestamp_micros(1).unwrap()),
                },
                message(&long_message, 2),
            ],
        )],
    );
    let config = ViewConfig {
        verbose: true,
        ..ViewConfig::default()
    };
    let out = Renderer::new(&config).render_trace(&t);
    // Tool content untouched, ordinary content still truncated
    assert!(out.contains(&long_result));
    assert!(!out.contains(&long_message));
}

#[test]
fn test_tool_message_role_is_tool_tagged_for_truncation() {
    // A tool-role message whose content doesn't start with the tool glyph
    // must still be exempt in verbose mode (semantic tag, not prefix check)
    let long = "t".repeat(400);
    let item = ConversationItem::Message {
        role: Role::Tool,
        content: long.clone(),
        timestamp: None,
        event_name: None,
    };
    let t = trace(vec![span("root", None, 0)], vec![("root", vec![item])]);
    let config = ViewConfig {
        verbose: true,
        ..ViewConfig::default()
    };
    let out = Renderer::new(&config).render_trace(&t);
    assert!(out.contains(&long));
}

#[test]
fn test_verbose_reveals_span_ids() {
    let t = trace(vec![span("root", None, 0)], vec![]);
    let config = ViewConfig {
        verbose: true,
        ..ViewConfig::default()
    };
    let out = Renderer::new(&config).render_trace(&t);
    assert!(out.contains("[root]"));
}

// ============================================================================
// DURATION BANDS
// ============================================================================

#[test]
fn test_duration_band_thresholds() {
    assert_eq!(DurationBand::classify(50.0), DurationBand::Fast);
    assert_eq!(DurationBand::classify(500.0), DurationBand::Normal);
    assert_eq!(DurationBand::classify(2_500.0), DurationBand::Slow);
    assert_eq!(DurationBand::classify(26_279.0), DurationBand::VerySlow);
}

#[test]
fn test_duration_band_markers_distinct() {
    let bands = [
        DurationBand::Fast,
        DurationBand::Normal,
        DurationBand::Slow,
        DurationBand::VerySlow,
    ];
    for (i, a) in bands.iter().enumerate() {
        for b in &bands[i + 1..] {
            assert_ne!(a.color(), b.color());
        }
    }
}

#[test]
fn test_format_duration_unknown() {
    assert_eq!(format_duration(None), "--");
}

#[test]
fn test_format_duration_units() {
    assert!(format_duration(Some(42.0)).contains("42ms"));
    assert!(format_duration(Some(26_279.0)).contains("26.3s"));
}

// ============================================================================
// SESSION SUMMARY
// ============================================================================

#[test]
fn test_summary_error_counts_scenario_e() {
    let exception = |micros: i64| ConversationItem::Event {
        name: "exception".to_string(),
        payload: json!({"exception.message": "boom"}),
        timestamp: Some(Utc.timestamp_micros(micros).unwrap()),
        is_exception: true,
    };
    let mut failing = trace(
        vec![span("root", None, 0)],
        vec![(
            "root",
            vec![exception(1), exception(2), exception(3), exception(4)],
        )],
    );
    failing.trace_id = "failing".to_string();

    let mut ok_a = trace(vec![span("root", None, 0)], vec![]);
    ok_a.trace_id = "ok_a".to_string();
    let mut ok_b = trace(vec![span("root", None, 0)], vec![]);
    ok_b.trace_id = "ok_b".to_string();

    assert_eq!(failing.error_count(), 4);
    assert_eq!(failing.status(), SpanStatus::Error);
    assert_eq!(ok_a.error_count(), 0);
    assert_eq!(ok_a.status(), SpanStatus::Ok);

    let config = ViewConfig::default();
    let out = Renderer::new(&config).render_summary(&[failing, ok_a, ok_b]);

    let failing_row = out.lines().find(|l| l.starts_with("failing")).unwrap();
    assert!(failing_row.contains("ERROR"));
    assert!(failing_row.contains('4'));
    let ok_row = out.lines().find(|l| l.starts_with("ok_a")).unwrap();
    assert!(ok_row.contains("OK"));
    assert!(ok_row.contains('0'));
}

#[test]
fn test_summary_header_and_row_count() {
    let t = trace(vec![span("root", None, 0)], vec![]);
    let config = ViewConfig::default();
    let out = Renderer::new(&config).render_summary(&[t]);
    assert!(out.starts_with("TRACE"));
    assert_eq!(out.lines().count(), 2);
}
