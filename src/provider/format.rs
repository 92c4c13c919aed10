//! Provider formatting helpers.

use serde_json::Value;

/// Convert a tool result into the `content` field of a chat-completions tool
/// message. Strings and content-part arrays pass through unchanged.
pub(crate) fn tool_result_content(value: &Value) -> Value {
    match value {
        Value::String(_) | Value::Array(_) => value.clone(),
        Value::Null => Value::String("null".to_string()),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_parts_pass_through() {
        let parts = json!([{ "type": "text", "text": "ok" }]);
        assert_eq!(tool_result_content(&parts), parts);
    }

    #[test]
    fn objects_are_stringified() {
        assert_eq!(
            tool_result_content(&json!({ "exit_code": 0 })),
            json!(r#"{"exit_code":0}"#)
        );
    }
}
