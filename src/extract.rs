//! Best-effort JSON extraction from free-form model replies

use serde_json::Value;

/// Find and parse the first bracketed JSON span in `text`.
///
/// The span starts at the first `[` or `{` that has a closing bracket of the
/// same kind somewhere after it and extends to the *last* such closing
/// bracket, so nested arrays and objects stay intact. Returns `None` when no
/// span exists or the span is not valid JSON. Malformed spans are never
/// repaired.
#[must_use]
pub fn extract_json(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }

    let span = find_span(text)?;
    match serde_json::from_str::<Value>(span) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Bracketed span is not valid JSON: {}", e);
            None
        }
    }
}

/// Like [`extract_json`] but only accepts arrays, returning their elements.
#[must_use]
pub fn extract_json_array(text: &str) -> Option<Vec<Value>> {
    match extract_json(text)? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

fn find_span(text: &str) -> Option<&str> {
    let last_square = text.rfind(']');
    let last_curly = text.rfind('}');

    for (start, ch) in text.char_indices() {
        let end = match ch {
            '[' => last_square,
            '{' => last_curly,
            _ => continue,
        };
        if let Some(end) = end.filter(|&end| end > start) {
            return Some(&text[start..=end]);
        }
    }
    None
}
