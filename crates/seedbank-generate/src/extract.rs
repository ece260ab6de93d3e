//! Extraction of a JSON array from possibly decorated model output.
//!
//! Models frequently wrap the requested array in prose or markdown fences
//! despite the system prompt. Extraction precedence:
//!
//! 1. the stripped response itself is bracketed by `[` and `]`;
//! 2. fenced code blocks: the first whose body parses as an array, else
//!    the last block;
//! 3. bracket scan from the first `[` to its matching `]`, string- and
//!    escape-aware;
//! 4. the raw response (parsing then fails with the real error).

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::errors::GenerationError;

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[a-zA-Z0-9]*[ \t]*\r?\n?(.*?)```").expect("fence regex compiles")
    })
}

/// Return the best candidate JSON-array slice of `response`.
pub fn extract_json_array(response: &str) -> String {
    let stripped = response.trim();
    if stripped.starts_with('[') && stripped.ends_with(']') {
        return stripped.to_string();
    }

    let blocks: Vec<String> = fence_regex()
        .captures_iter(response)
        .map(|captures| captures[1].trim().to_string())
        .collect();
    if !blocks.is_empty() {
        for block in &blocks {
            if serde_json::from_str::<Value>(block)
                .map(|value| value.is_array())
                .unwrap_or(false)
            {
                return block.clone();
            }
        }
        return blocks.last().cloned().unwrap_or_default();
    }

    if let Some(slice) = bracket_scan(stripped) {
        return slice.to_string();
    }

    stripped.to_string()
}

/// Scan from the first `[` to its matching `]`, ignoring brackets inside
/// JSON strings.
fn bracket_scan(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'[' if !in_string => depth += 1,
            b']' if !in_string => {
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

const RAW_LOG_LIMIT: usize = 500;

/// Extract and parse the records array; a non-array or unparseable
/// response logs the (truncated) raw output and fails.
pub fn parse_records(response: &str) -> Result<Vec<Value>, GenerationError> {
    let candidate = extract_json_array(response);
    match serde_json::from_str::<Value>(&candidate) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(other) => {
            warn!(raw = %truncate(response), "model returned {} instead of an array", kind_of(&other));
            Err(GenerationError::Parse(format!(
                "expected a JSON array, got {}",
                kind_of(&other)
            )))
        }
        Err(err) => {
            warn!(raw = %truncate(response), error = %err, "model output failed to parse");
            Err(GenerationError::Parse(err.to_string()))
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(RAW_LOG_LIMIT) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_array_parses_directly() {
        let records = parse_records(r#"  [{"id": 1}, {"id": 2}]  "#).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn fenced_json_block_is_extracted() {
        let response = "Here you go:\n```json\n[{\"id\": 1}]\n```\nEnjoy!";
        let records = parse_records(response).unwrap();
        assert_eq!(records, vec![json!({"id": 1})]);
    }

    #[test]
    fn fence_without_language_tag_works() {
        let response = "```\n[{\"id\": 3}]\n```";
        assert_eq!(parse_records(response).unwrap(), vec![json!({"id": 3})]);
    }

    #[test]
    fn first_array_block_wins_over_other_blocks() {
        let response = "```json\n{\"not\": \"array\"}\n```\nthen\n```json\n[{\"id\": 7}]\n```";
        assert_eq!(parse_records(response).unwrap(), vec![json!({"id": 7})]);
    }

    #[test]
    fn no_array_block_falls_back_to_last_block() {
        let response = "```\n{\"a\": 1}\n```\n```\n{\"b\": 2}\n```";
        assert_eq!(extract_json_array(response), "{\"b\": 2}");
        assert!(parse_records(response).is_err());
    }

    #[test]
    fn text_wrapped_array_is_scanned_out() {
        let response = r#"The data you asked for is [{"id": 1, "tags": ["a", "b"]}] as requested."#;
        let records = parse_records(response).unwrap();
        assert_eq!(records[0]["tags"], json!(["a", "b"]));
    }

    #[test]
    fn brackets_inside_strings_do_not_break_the_scan() {
        let response = r#"result: [{"note": "closing ] inside", "id": 5}] done"#;
        let records = parse_records(response).unwrap();
        assert_eq!(records[0]["id"], json!(5));
    }

    #[test]
    fn plain_prose_fails_with_parse_error() {
        assert!(matches!(
            parse_records("I could not generate anything."),
            Err(GenerationError::Parse(_))
        ));
    }

    #[test]
    fn object_response_is_rejected() {
        assert!(matches!(
            parse_records(r#"{"id": 1}"#),
            Err(GenerationError::Parse(_))
        ));
    }
}
