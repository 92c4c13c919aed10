//! Typed access to tool call arguments.

use crate::error::{EdaError, Result};

/// Parsed tool call arguments.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    tool_name: String,
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(tool_name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            value,
        }
    }

    /// Parse the JSON-encoded payload the model sent for `tool_name`.
    ///
    /// An empty payload is read as `{}` so the schema check reports the
    /// missing field instead of a JSON syntax error.
    pub fn parse(tool_name: &str, raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let value = if trimmed.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(trimmed).map_err(|e| EdaError::InvalidToolArguments {
                tool_name: tool_name.to_string(),
                message: format!("arguments are not valid JSON: {e}"),
            })?
        };
        Ok(Self::new(tool_name, value))
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| EdaError::InvalidToolArguments {
                tool_name: self.tool_name.clone(),
                message: format!("missing string argument '{key}'"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_object_payload() {
        let args = ToolArguments::parse("run_python_code", r#"{"python_code": "print(1)"}"#)
            .unwrap();
        assert_eq!(args.get_str("python_code").unwrap(), "print(1)");
    }

    #[test]
    fn parse_treats_blank_payload_as_empty_object() {
        let args = ToolArguments::parse("run_on_command_line", "  ").unwrap();
        assert_eq!(args.raw(), &serde_json::json!({}));
        assert!(args.get_str("command").is_err());
    }

    #[test]
    fn parse_rejects_invalid_json() {
        let err = ToolArguments::parse("run_python_code", "{python_code:").unwrap_err();
        assert!(matches!(
            err,
            EdaError::InvalidToolArguments { ref tool_name, .. } if tool_name == "run_python_code"
        ));
    }
}
