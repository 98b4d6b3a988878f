//! Pull JSON out of model replies.
//!
//! Replies may wrap the object in a ```json fence or surround it with prose.
//! Each `{` or `[` is tried in turn and the first balanced span that parses
//! as JSON is taken, so bracketed prose like `[see below]` is skipped.

use serde::de::{DeserializeOwned, IgnoredAny};

use crate::error::{DealflowError, Result};

/// Locate the JSON payload inside a reply
pub fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if let Some(inner) = fenced_block(trimmed) {
        return first_valid(inner).or(Some(inner.trim()));
    }
    first_valid(trimmed)
}

/// Parse the JSON payload of a reply into `T`
pub fn parse_reply<T: DeserializeOwned>(text: &str) -> Result<T> {
    let payload = extract_json(text)
        .ok_or_else(|| DealflowError::Parse(format!("no JSON found in reply: {}", preview(text))))?;
    serde_json::from_str(payload).map_err(|e| DealflowError::Parse(format!("{}: {}", e, preview(payload))))
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

fn first_valid(text: &str) -> Option<&str> {
    text.match_indices(['{', '['])
        .filter_map(|(start, _)| balanced(text, start))
        .find(|span| serde_json::from_str::<IgnoredAny>(span).is_ok())
}

/// The bracket-balanced span opening at `start`
fn balanced(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let (open, close) = if bytes[start] == b'{' { (b'{', b'}') } else { (b'[', b']') };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            _ if b == open => depth += 1,
            _ if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_extract_plain_object() {
        assert_eq!(extract_json(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extract_fenced_object() {
        let reply = "Here you go:\n```json\n{\"cagr\": \"25%\"}\n```\nThanks";
        assert_eq!(extract_json(reply), Some("{\"cagr\": \"25%\"}"));
    }

    #[test]
    fn test_extract_ignores_braces_in_strings() {
        let reply = r#"Result: {"reasoning": "uses {curly} text", "scores": [1, 0]} trailing"#;
        let value: Value = parse_reply(reply).unwrap();
        assert_eq!(value["reasoning"], "uses {curly} text");
        assert_eq!(value["scores"][1], 0);
    }

    #[test]
    fn test_extract_array() {
        let value: Vec<u8> = parse_reply("scores: [1, 1, 0]").unwrap();
        assert_eq!(value, vec![1, 1, 0]);
    }

    #[test]
    fn test_bracketed_prose_skipped() {
        let reply = r#"Per criterion [see below] and note {1}: {"scores": [1, 0, 1], "reasoning": "ok"}"#;
        let value: Value = parse_reply(reply).unwrap();
        assert_eq!(value["scores"][2], 1);
        assert_eq!(value["reasoning"], "ok");
    }

    #[test]
    fn test_no_json_is_parse_error() {
        let result: Result<Value> = parse_reply("I cannot help with that.");
        assert!(matches!(result, Err(DealflowError::Parse(_))));
    }

    #[test]
    fn test_unbalanced_is_none() {
        assert_eq!(extract_json("{\"a\": 1"), None);
    }
}
