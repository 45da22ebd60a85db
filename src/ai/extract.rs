use serde_json::Value;

use crate::diff::summary::truncate_chars;

/// Characters of the raw response kept when no extractor matches.
pub const FALLBACK_DUMP_CHARS: usize = 1000;

type Extractor = fn(&Value) -> Option<String>;

/// Known response shapes, in priority order.
const EXTRACTORS: &[Extractor] = &[
    chat_message_content,
    completion_text,
    output_field,
    response_field,
    bare_string,
];

/// Generated text from a provider response. Never fails: unknown shapes
/// fall back to a truncated dump of the raw value.
pub fn extract_text(data: &Value) -> String {
    EXTRACTORS
        .iter()
        .find_map(|extract| extract(data))
        .unwrap_or_else(|| fallback_dump(data))
}

fn non_empty(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `choices[0].message.content` (chat completions)
fn chat_message_content(data: &Value) -> Option<String> {
    non_empty(data.pointer("/choices/0/message/content")?)
}

/// `choices[0].text` (legacy completions)
fn completion_text(data: &Value) -> Option<String> {
    non_empty(data.pointer("/choices/0/text")?)
}

fn output_field(data: &Value) -> Option<String> {
    non_empty(data.get("output")?)
}

fn response_field(data: &Value) -> Option<String> {
    non_empty(data.get("response")?)
}

/// A body that is itself a string, e.g. plain-text proxies.
fn bare_string(data: &Value) -> Option<String> {
    non_empty(data)
}

fn fallback_dump(data: &Value) -> String {
    let dump = data.to_string();
    truncate_chars(&dump, FALLBACK_DUMP_CHARS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_completion_shape() {
        let data = json!({"choices": [{"message": {"role": "assistant", "content": "hi there"}}]});
        assert_eq!(extract_text(&data), "hi there");
    }

    #[test]
    fn test_text_completion_shape() {
        let data = json!({"choices": [{"text": "plain"}]});
        assert_eq!(extract_text(&data), "plain");
    }

    #[test]
    fn test_output_and_response_fields() {
        assert_eq!(extract_text(&json!({"output": "out"})), "out");
        assert_eq!(extract_text(&json!({"response": "resp"})), "resp");
    }

    #[test]
    fn test_priority_order() {
        let data = json!({
            "output": "second",
            "choices": [{"message": {"content": "first"}, "text": "ignored"}]
        });
        assert_eq!(extract_text(&data), "first");
    }

    #[test]
    fn test_empty_content_falls_through() {
        let data = json!({"choices": [{"message": {"content": ""}}], "output": "used"});
        assert_eq!(extract_text(&data), "used");
    }

    #[test]
    fn test_bare_string_body() {
        assert_eq!(extract_text(&json!("just text")), "just text");
    }

    #[test]
    fn test_unknown_shape_dumps_json() {
        let data = json!({"result": {"answer": 42}});
        assert_eq!(extract_text(&data), r#"{"result":{"answer":42}}"#);
    }

    #[test]
    fn test_fallback_dump_is_bounded() {
        let data = json!({"blob": "z".repeat(5000)});
        let text = extract_text(&data);
        assert_eq!(text.chars().count(), FALLBACK_DUMP_CHARS);
        assert!(!text.is_empty());
    }

    #[test]
    fn test_null_body_is_non_empty() {
        assert_eq!(extract_text(&Value::Null), "null");
    }
}
