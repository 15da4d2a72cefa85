//! Per-format delta extraction.
//!
//! [`extract`] maps one line (plus the run's [`StreamFormat`]) to a delta,
//! the termination sentinel, or nothing. It never fails: malformed input is
//! recovered locally, as raw text for SSE and as nothing for JSON-lines.
//!
//! JSON payloads are matched against [`Shape`]s in a fixed priority order
//! and the first shape that yields text wins. A shape whose envelope is
//! present but holds no text (an OpenAI `finish_reason` chunk, an Anthropic
//! `message_delta`) is a miss, so later shapes are still tried and an SSE
//! payload nothing matches falls back to its raw text.

use serde_json::Value;
use tributary_types::{Extracted, StreamFormat};

/// The SSE field prefix that carries payload.
pub const DATA_PREFIX: &str = "data: ";

/// The SSE payload that ends a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// A recognized JSON delta shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `choices[0].delta.content` (OpenAI chat completions).
    ChoiceDelta,
    /// `delta.text` (Anthropic content blocks, SSE framing).
    BlockDelta,
    /// `delta.text` under `type == "content_block_delta"` (JSON-lines framing).
    TypedBlockDelta,
    /// `candidates[0].content.parts[0].text` (Gemini).
    CandidatePart,
    /// `response`, returned even when empty (Ollama generate).
    Response,
    /// Bare top-level `text`.
    Text,
    /// Bare top-level `content`.
    Content,
    /// `message.content` (chat-style NDJSON).
    MessageContent,
}

/// Shapes tried for an SSE `data:` payload, in priority order.
pub const SSE_SHAPES: &[Shape] = &[Shape::ChoiceDelta, Shape::BlockDelta, Shape::Text];

/// Shapes tried for a JSON-lines line, in priority order.
pub const JSON_LINES_SHAPES: &[Shape] = &[
    Shape::ChoiceDelta,
    Shape::TypedBlockDelta,
    Shape::CandidatePart,
    Shape::Response,
    Shape::Text,
    Shape::Content,
    Shape::MessageContent,
];

impl Shape {
    /// Test this shape against a parsed payload.
    ///
    /// Only [`Shape::Response`] accepts an empty string; every other shape
    /// needs non-empty text to match.
    pub fn probe<'a>(&self, value: &'a Value) -> Option<&'a str> {
        match self {
            Shape::ChoiceDelta => non_empty(
                value
                    .get("choices")
                    .and_then(Value::as_array)
                    .and_then(|choices| choices.first())
                    .and_then(|choice| choice.get("delta"))
                    .and_then(|delta| delta.get("content")),
            ),
            Shape::BlockDelta => non_empty(value.get("delta").and_then(|d| d.get("text"))),
            Shape::TypedBlockDelta => {
                if value.get("type").and_then(Value::as_str) == Some("content_block_delta") {
                    non_empty(value.get("delta").and_then(|d| d.get("text")))
                } else {
                    None
                }
            }
            Shape::CandidatePart => non_empty(
                value
                    .get("candidates")
                    .and_then(Value::as_array)
                    .and_then(|candidates| candidates.first())
                    .and_then(|c| c.get("content"))
                    .and_then(|c| c.get("parts"))
                    .and_then(Value::as_array)
                    .and_then(|parts| parts.first())
                    .and_then(|part| part.get("text")),
            ),
            Shape::Response => value.get("response").and_then(Value::as_str),
            Shape::Text => non_empty(value.get("text")),
            Shape::Content => non_empty(value.get("content")),
            Shape::MessageContent => {
                non_empty(value.get("message").and_then(|m| m.get("content")))
            }
        }
    }
}

fn non_empty(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}

/// Run `shapes` in order; the first one that yields text decides.
fn first_match<'a>(shapes: &[Shape], value: &'a Value) -> Option<&'a str> {
    shapes.iter().find_map(|shape| shape.probe(value))
}

/// Extract what one line carries under `format`.
///
/// `None` means the line carried nothing usable (blank, metadata, an
/// unrecognized JSON-lines object). It is never an error.
pub fn extract(format: StreamFormat, line: &str) -> Option<Extracted> {
    if line.trim().is_empty() {
        return None;
    }
    match format {
        StreamFormat::Sse => extract_sse(line),
        StreamFormat::JsonLines => extract_json_line(line),
        _ => Some(Extracted::Delta(line.to_owned())),
    }
}

/// SSE: the first `data: ` line decides; other fields carry nothing.
fn extract_sse(chunk: &str) -> Option<Extracted> {
    for line in chunk.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
            return extract_sse_payload(payload);
        }
        // `event:`, `id:`, `retry:` and `:` comments are valid framing but
        // never content.
    }
    None
}

fn extract_sse_payload(payload: &str) -> Option<Extracted> {
    if payload == DONE_SENTINEL {
        return Some(Extracted::Termination);
    }
    let Ok(value) = serde_json::from_str::<Value>(payload) else {
        return Some(Extracted::Delta(payload.to_owned()));
    };
    let text = first_match(SSE_SHAPES, &value).unwrap_or(payload);
    Some(Extracted::Delta(text.to_owned()))
}

fn extract_json_line(line: &str) -> Option<Extracted> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let value = serde_json::from_str::<Value>(line).ok()?;
    first_match(JSON_LINES_SHAPES, &value).map(|text| Extracted::Delta(text.to_owned()))
}
