//! Conversation item extraction
//!
//! Turns one RuntimeLog body into at most one ConversationItem. Agent
//! runtimes emit at least three incompatible conventions for the same tool
//! invocation (Bedrock `toolUse` camelCase, snake_case `tool_use`, and the
//! OpenAI nested `{id, type:"function", function:{...}}` shape with
//! JSON-encoded argument strings); this module contains all of that
//! ambiguity so aggregation and rendering never see it.
//!
//! ## Extraction priority (first match wins)
//!
//! 1. `exception` — exception markers must win so error spans are never
//!    misclassified as ordinary chat turns.
//! 2. `tool_result_marker` — a structural tool-result marker on the body
//!    overrides any event-name-derived role (a tool result must never
//!    render as a `user` turn).
//! 3. `gen_ai_message` — `gen_ai.*.message` / `gen_ai.choice` events.
//! 4. `generic_event` — anything else with a structured or string body.
//!
//! A log that matches nothing contributes nothing; that is not an error.

use serde_json::{Map, Value as JsonValue};

use crate::utils::json::parse_json_with_fallback;

use super::types::{ConversationItem, Role, RuntimeLog};

// ============================================================================
// EXTRACTOR CHAIN
// ============================================================================

type ItemExtractor = fn(&RuntimeLog) -> Option<ConversationItem>;

struct NamedExtractor {
    name: &'static str,
    extractor: ItemExtractor,
}

const EXTRACTORS: &[NamedExtractor] = &[
    NamedExtractor {
        name: "exception",
        extractor: try_exception,
    },
    NamedExtractor {
        name: "tool_result_marker",
        extractor: try_tool_result_marker,
    },
    NamedExtractor {
        name: "gen_ai_message",
        extractor: try_gen_ai_message,
    },
    NamedExtractor {
        name: "generic_event",
        extractor: try_generic_event,
    },
];

/// Run the extractor chain over one log. Returns the item and the name of
/// the branch that matched, for diagnostics.
pub(crate) fn extract_item(log: &RuntimeLog) -> Option<(ConversationItem, &'static str)> {
    for named in EXTRACTORS {
        if let Some(item) = (named.extractor)(log) {
            tracing::trace!(
                extractor = named.name,
                event_name = log.event_name.as_deref().unwrap_or(""),
                "Extraction branch matched"
            );
            return Some((item, named.name));
        }
    }
    tracing::trace!(
        event_name = log.event_name.as_deref().unwrap_or(""),
        "No extraction branch matched"
    );
    None
}

// ============================================================================
// 1. EXCEPTION PAYLOADS
// ============================================================================

fn try_exception(log: &RuntimeLog) -> Option<ConversationItem> {
    let is_exception_event = log.event_name.as_deref() == Some("exception");
    let body_has_marker = log.body.as_object().is_some_and(|obj| {
        obj.contains_key("exception")
            || obj.contains_key("exception.type")
            || obj.contains_key("exception.message")
            || obj.contains_key("exception.stacktrace")
    });
    if !is_exception_event && !body_has_marker {
        return None;
    }
    Some(ConversationItem::Event {
        name: log
            .event_name
            .clone()
            .unwrap_or_else(|| "exception".to_string()),
        payload: log.body.clone(),
        timestamp: log.timestamp,
        is_exception: true,
    })
}

// ============================================================================
// 2. TOOL RESULT MARKER
// ============================================================================

/// Structural tool-result detection: message-level `role: "tool"` or a
/// `tool_call_id` alongside plain content. Runs before event-name role
/// derivation so a result carried on e.g. `gen_ai.user.message` still
/// renders as a tool turn.
fn try_tool_result_marker(log: &RuntimeLog) -> Option<ConversationItem> {
    let obj = log.body.as_object()?;

    let role_is_tool = obj.get("role").and_then(JsonValue::as_str) == Some("tool");
    let call_id = obj
        .get("tool_call_id")
        .or_else(|| obj.get("toolCallId"))
        .and_then(JsonValue::as_str)
        .map(str::to_string);
    if !role_is_tool && call_id.is_none() {
        return None;
    }

    let content = obj.get("content")?;
    match content {
        // Plain scalar result: the common "message-level role is tool" case
        JsonValue::String(s) => Some(ConversationItem::ToolResult {
            id: call_id,
            content: s.clone(),
            timestamp: log.timestamp,
        }),
        JsonValue::Number(_) | JsonValue::Bool(_) => Some(ConversationItem::ToolResult {
            id: call_id,
            content: content.to_string(),
            timestamp: log.timestamp,
        }),
        // Block array: match only when it actually carries a result block;
        // tool *inputs* (toolUse blocks) fall through to the gen_ai branch.
        JsonValue::Array(blocks) => blocks.iter().find_map(|block| {
            let result = block.get("toolResult").or_else(|| block.get("tool_result"))?;
            let id = result
                .get("toolUseId")
                .or_else(|| result.get("tool_use_id"))
                .or_else(|| result.get("id"))
                .and_then(JsonValue::as_str)
                .map(str::to_string)
                .or_else(|| call_id.clone());
            Some(ConversationItem::ToolResult {
                id,
                content: render_block_content(result.get("content")),
                timestamp: log.timestamp,
            })
        }),
        _ => None,
    }
}

/// Render a tool result's content field, which may be a string, an array of
/// `{text}` / `{json}` blocks, or arbitrary JSON.
fn render_block_content(content: Option<&JsonValue>) -> String {
    match content {
        None => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Array(blocks)) => {
            let parts: Vec<String> = blocks
                .iter()
                .map(|b| match b {
                    JsonValue::String(s) => s.clone(),
                    other => other
                        .get("text")
                        .and_then(JsonValue::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| other.to_string()),
                })
                .collect();
            parts.join("\n")
        }
        Some(other) => other.to_string(),
    }
}

// ============================================================================
// 3. GEN-AI MESSAGE EVENTS
// ============================================================================

fn is_gen_ai_message_event(event_name: &str) -> bool {
    event_name == "gen_ai.choice"
        || (event_name.starts_with("gen_ai.") && event_name.ends_with(".message"))
}

/// Intermediate result of content assembly over one message body.
#[derive(Default)]
struct AssembledContent {
    text_parts: Vec<String>,
    invocations: Vec<(String, Map<String, JsonValue>, Option<String>)>,
    results: Vec<(Option<String>, String)>,
}

fn try_gen_ai_message(log: &RuntimeLog) -> Option<ConversationItem> {
    let event_name = log.event_name.as_deref()?;
    if !is_gen_ai_message_event(event_name) {
        return None;
    }

    let body = normalized_body(&log.body);
    let mut assembled = AssembledContent::default();
    assemble_content(&body, &mut assembled);

    // Role priority: event name first, then message-level role field.
    // (Tool-result markers were already consumed by the previous branch.)
    let role = Role::from_event_name(event_name)
        .filter(|r| *r != Role::Unknown)
        .or_else(|| {
            body.as_object()
                .and_then(|o| o.get("role"))
                .and_then(JsonValue::as_str)
                .map(Role::parse)
        })
        .unwrap_or(Role::Unknown);

    if assembled.text_parts.is_empty() {
        // No prose: the tool payload is the item itself
        if let Some((name, input, id)) = assembled.invocations.into_iter().next() {
            return Some(ConversationItem::ToolInvocation {
                name,
                input,
                id,
                timestamp: log.timestamp,
            });
        }
        if let Some((id, content)) = assembled.results.into_iter().next() {
            return Some(ConversationItem::ToolResult {
                id,
                content,
                timestamp: log.timestamp,
            });
        }
        return None;
    }

    // Prose plus tool blocks: merge everything into one message, in
    // assembly order (direct text, content blocks, tool-call array).
    let mut parts = assembled.text_parts;
    for (name, input, _) in &assembled.invocations {
        parts.push(format!(
            "{}({})",
            name,
            serde_json::to_string(input).unwrap_or_default()
        ));
    }
    for (_, content) in &assembled.results {
        parts.push(content.clone());
    }

    Some(ConversationItem::Message {
        role,
        content: parts.join("\n"),
        timestamp: log.timestamp,
        event_name: Some(event_name.to_string()),
    })
}

/// Bodies arrive as objects, JSON-encoded strings, or plain strings.
fn normalized_body(body: &JsonValue) -> JsonValue {
    match body {
        JsonValue::String(s) if s.trim_start().starts_with(['{', '[']) => {
            parse_json_with_fallback(s, "gen_ai.body")
        }
        other => other.clone(),
    }
}

/// Merge message content from every convention into `assembled`, in order:
/// direct text fields, the content block array, the message-level
/// `tool_calls` array (checked both at top level and under `message`).
fn assemble_content(body: &JsonValue, assembled: &mut AssembledContent) {
    match body {
        JsonValue::String(s) => {
            if !s.is_empty() {
                assembled.text_parts.push(s.clone());
            }
        }
        JsonValue::Object(obj) => {
            match obj.get("content") {
                Some(JsonValue::String(s)) if !s.is_empty() => {
                    assembled.text_parts.push(s.clone());
                }
                Some(JsonValue::Array(blocks)) => {
                    for block in blocks {
                        assemble_block(block, assembled);
                    }
                }
                _ => {}
            }
            if let Some(JsonValue::String(s)) = obj.get("text") {
                if !s.is_empty() {
                    assembled.text_parts.push(s.clone());
                }
            }
            if let Some(calls) = obj.get("tool_calls").and_then(JsonValue::as_array) {
                for call in calls {
                    if let Some(inv) = parse_function_call(call) {
                        assembled.invocations.push(inv);
                    }
                }
            }
            // gen_ai.choice wraps its payload under "message"
            if let Some(message) = obj.get("message") {
                if message.is_object() {
                    assemble_content(message, assembled);
                }
            }
        }
        _ => {}
    }
}

/// One block from a mixed content array. Both camelCase and snake_case
/// spellings occur for the same block kinds.
fn assemble_block(block: &JsonValue, assembled: &mut AssembledContent) {
    match block {
        JsonValue::String(s) => {
            if !s.is_empty() {
                assembled.text_parts.push(s.clone());
            }
        }
        JsonValue::Object(obj) => {
            if let Some(JsonValue::String(s)) = obj.get("text") {
                if !s.is_empty() {
                    assembled.text_parts.push(s.clone());
                }
                return;
            }
            if let Some(tool_use) = obj.get("toolUse").or_else(|| obj.get("tool_use")) {
                let name = tool_use
                    .get("name")
                    .and_then(JsonValue::as_str)
                    .unwrap_or("unknown_tool")
                    .to_string();
                let input = match tool_use.get("input") {
                    Some(JsonValue::Object(map)) => map.clone(),
                    Some(other) if !other.is_null() => {
                        let mut map = Map::new();
                        map.insert("input".to_string(), other.clone());
                        map
                    }
                    _ => Map::new(),
                };
                let id = tool_use
                    .get("toolUseId")
                    .or_else(|| tool_use.get("tool_use_id"))
                    .or_else(|| tool_use.get("id"))
                    .and_then(JsonValue::as_str)
                    .map(str::to_string);
                assembled.invocations.push((name, input, id));
                return;
            }
            if let Some(result) = obj.get("toolResult").or_else(|| obj.get("tool_result")) {
                let id = result
                    .get("toolUseId")
                    .or_else(|| result.get("tool_use_id"))
                    .or_else(|| result.get("id"))
                    .and_then(JsonValue::as_str)
                    .map(str::to_string);
                assembled
                    .results
                    .push((id, render_block_content(result.get("content"))));
            }
        }
        _ => {}
    }
}

/// The third convention: nested `{id, type:"function", function:{name,
/// arguments}}` where `arguments` is a JSON-encoded string. A flat
/// `{id, name, arguments}` spelling is accepted too.
fn parse_function_call(
    call: &JsonValue,
) -> Option<(String, Map<String, JsonValue>, Option<String>)> {
    let obj = call.as_object()?;
    let function = obj.get("function").and_then(JsonValue::as_object);
    let name = function
        .and_then(|f| f.get("name"))
        .or_else(|| obj.get("name"))
        .and_then(JsonValue::as_str)?
        .to_string();
    let id = obj
        .get("id")
        .and_then(JsonValue::as_str)
        .map(str::to_string);
    let arguments = function
        .and_then(|f| f.get("arguments"))
        .or_else(|| obj.get("arguments"));
    Some((name, decode_arguments(arguments), id))
}

/// Decode a tool-call argument payload with fallback: a string that fails
/// to parse as JSON is wrapped under a `raw` key, never dropped.
fn decode_arguments(arguments: Option<&JsonValue>) -> Map<String, JsonValue> {
    match arguments {
        Some(JsonValue::Object(map)) => map.clone(),
        Some(JsonValue::String(s)) => match serde_json::from_str::<JsonValue>(s) {
            Ok(JsonValue::Object(map)) => map,
            Ok(other) => {
                let mut map = Map::new();
                map.insert("raw".to_string(), other);
                map
            }
            Err(e) => {
                tracing::debug!(error = %e, "Tool-call arguments are not valid JSON, keeping raw");
                let mut map = Map::new();
                map.insert("raw".to_string(), JsonValue::String(s.clone()));
                map
            }
        },
        Some(other) if !other.is_null() => {
            let mut map = Map::new();
            map.insert("raw".to_string(), other.clone());
            map
        }
        _ => Map::new(),
    }
}

// ============================================================================
// 4. GENERIC EVENTS
// ============================================================================

fn try_generic_event(log: &RuntimeLog) -> Option<ConversationItem> {
    let has_body = match &log.body {
        JsonValue::Null => false,
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Object(obj) => !obj.is_empty(),
        _ => true,
    };
    if !has_body && log.event_name.is_none() {
        return None;
    }
    Some(ConversationItem::Event {
        name: log.event_name.clone().unwrap_or_else(|| "log".to_string()),
        payload: log.body.clone(),
        timestamp: log.timestamp,
        is_exception: false,
    })
}

// ============================================================================
// TOOL DEFINITIONS
// ============================================================================

/// Scan a body's `tools` array for definitions. Runs independently of the
/// item chain: a request body can carry both a message and the tool list.
///
/// Accepted shapes: direct `{name, description}`, OpenAI nested
/// `{type:"function", function:{name, description}}`, and Bedrock
/// `{toolSpec:{name, description}}`.
pub(crate) fn extract_tool_definitions(body: &JsonValue) -> Vec<ConversationItem> {
    let tools = match body.get("tools").and_then(JsonValue::as_array) {
        Some(tools) => tools,
        None => return Vec::new(),
    };

    tools
        .iter()
        .filter_map(|tool| {
            let spec = tool
                .get("function")
                .or_else(|| tool.get("toolSpec"))
                .or_else(|| tool.get("tool_spec"))
                .unwrap_or(tool);
            let name = spec.get("name").and_then(JsonValue::as_str)?;
            Some(ConversationItem::ToolDefinition {
                name: name.to_string(),
                description: spec
                    .get("description")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
