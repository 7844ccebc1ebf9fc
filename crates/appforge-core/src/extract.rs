//! JSON embedded in model output
//!
//! Providers wrap structured answers in a ```json fence, or answer with a
//! bare object. Both the response normalizer and the planner go through here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Opening ```json fence line
static RE_JSON_FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```json[ \t]*\r?\n?").unwrap());

const FENCE: &str = "```";

/// First parseable JSON object in the text
///
/// Fenced blocks are tried in order; if none parses, the whole text is tried
/// when it starts with `{`.
pub fn extract_json(text: &str) -> Option<Value> {
    let fenced = RE_JSON_FENCE_OPEN
        .find_iter(text)
        .find_map(|open| fenced_object(&text[open.end()..]));
    if fenced.is_some() {
        return fenced;
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return parse_object(trimmed);
    }
    None
}

/// Body of one fence. String values may themselves hold ``` (a README with a
/// code block), so every later closing fence is tried, nearest first.
fn fenced_object(after_open: &str) -> Option<Value> {
    after_open
        .match_indices(FENCE)
        .find_map(|(close, _)| parse_object(&after_open[..close]))
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate.trim())
        .ok()
        .filter(Value::is_object)
}
