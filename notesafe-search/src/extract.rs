//! Plain-text extraction from the opaque editor content value.
//!
//! The vault treats document content as an uninterpreted JSON value; this
//! is the single place that peeks inside, and only far enough to collect
//! searchable text. Block trees are walked through `content`/`children`
//! arrays, string leaves and `text` fields are collected in document order.

use serde_json::Value;

/// Concatenates every string found in `value` with single spaces.
pub fn extract_text(value: &Value) -> String {
    let mut parts: Vec<&str> = Vec::new();
    walk(value, &mut parts);
    parts.join(" ")
}

fn walk<'a>(value: &'a Value, parts: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => parts.push(s),
        Value::Array(items) => {
            for item in items {
                walk(item, parts);
            }
        }
        Value::Object(map) => {
            if let Some(Value::String(s)) = map.get("text") {
                parts.push(s);
            }
            if let Some(content) = map.get("content") {
                walk(content, parts);
            }
            if let Some(children) = map.get("children") {
                walk(children, parts);
            }
        }
        _ => {}
    }
}
