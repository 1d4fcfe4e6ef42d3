//! Pull a JSON object out of free-form model output.
//!
//! Models wrap JSON in Markdown fences and surround it with prose. Extraction
//! strips a fence wrapping the response, then parses the first balanced
//! `{...}` span, searching the whole text when the fenced body holds none.
//! Braces inside JSON strings are ignored when balancing.

use serde_json::Value;

use crate::error::GenerationError;

const FENCE: &str = "```";

/// Extract and parse the first JSON object in `text`.
///
/// # Errors
///
/// `GenerationError::MalformedResponse` when no balanced object exists or the
/// span is not valid JSON.
pub fn extract_json_object(text: &str) -> Result<Value, GenerationError> {
    let span = first_balanced_object(strip_code_fence(text))
        .or_else(|| first_balanced_object(text))
        .ok_or_else(|| GenerationError::MalformedResponse {
            reason: if text.contains('{') {
                "unbalanced braces in response".to_string()
            } else {
                "no JSON object in response".to_string()
            },
        })?;

    serde_json::from_str(span).map_err(|e| GenerationError::MalformedResponse {
        reason: format!("invalid JSON: {e}"),
    })
}

/// Body of a fence wrapping the whole response, or `text` when the response
/// does not open with a fence.
///
/// The info string after the opening fence ends at the first newline or `{`,
/// so single-line fences keep their object.
fn strip_code_fence(text: &str) -> &str {
    let Some(after_open) = text.trim_start().strip_prefix(FENCE) else {
        return text;
    };
    let content = match after_open.find(['\n', '{']) {
        Some(i) if after_open[i..].starts_with('\n') => &after_open[i + 1..],
        Some(i) => &after_open[i..],
        None => "",
    };
    match content.find(FENCE) {
        Some(close) => &content[..close],
        None => content,
    }
}

fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
