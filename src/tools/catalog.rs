//! The fixed tool set offered to the EDA model.

use std::str::FromStr;

use serde_json::{json, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use super::arguments::ToolArguments;
use super::validation::validate_arguments;
use crate::error::{EdaError, Result};
use crate::provider::ToolDefinition;
use crate::types::AgentToolCall;

/// Tools the sandbox exposes to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum EdaTool {
    RunPythonCode,
    RunOnCommandLine,
}

impl EdaTool {
    /// The single required text argument of this tool.
    pub fn argument_name(&self) -> &'static str {
        match self {
            Self::RunPythonCode => "python_code",
            Self::RunOnCommandLine => "command",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::RunPythonCode => "Runs the python code and returns the result if any.",
            Self::RunOnCommandLine => {
                "Runs the command on the command line and returns the result if any."
            }
        }
    }

    fn argument_description(&self) -> &'static str {
        match self {
            Self::RunPythonCode => "The Python code to run.",
            Self::RunOnCommandLine => "The command to run on the command line.",
        }
    }

    /// JSON schema of the arguments: one required string.
    pub fn parameters(&self) -> Value {
        let name = self.argument_name();
        json!({
            "type": "object",
            "properties": {
                name: {
                    "type": "string",
                    "description": self.argument_description(),
                }
            },
            "required": [name],
        })
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Definitions for every tool, in a stable order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    EdaTool::iter().map(|tool| tool.definition()).collect()
}

/// A validated request to run one of the sandbox tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    RunPythonCode { code: String },
    RunOnCommandLine { command: String },
}

impl ToolInvocation {
    /// Resolve a model tool call into an invocation.
    ///
    /// Unknown names and payloads that do not satisfy the tool's schema are
    /// contract violations, reported as errors rather than tool output.
    pub fn from_call(call: &AgentToolCall) -> Result<Self> {
        let tool = EdaTool::from_str(&call.name)
            .map_err(|_| EdaError::UnknownTool(call.name.clone()))?;
        let args = ToolArguments::parse(&call.name, &call.arguments)?;
        validate_arguments(args.raw(), &tool.parameters()).map_err(|violation| {
            EdaError::InvalidToolArguments {
                tool_name: call.name.clone(),
                message: violation.to_string(),
            }
        })?;
        let value = args.get_str(tool.argument_name())?.to_string();
        Ok(match tool {
            EdaTool::RunPythonCode => Self::RunPythonCode { code: value },
            EdaTool::RunOnCommandLine => Self::RunOnCommandLine { command: value },
        })
    }

    pub fn tool(&self) -> EdaTool {
        match self {
            Self::RunPythonCode { .. } => EdaTool::RunPythonCode,
            Self::RunOnCommandLine { .. } => EdaTool::RunOnCommandLine,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(name: &str, arguments: &str) -> AgentToolCall {
        AgentToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    #[test]
    fn definitions_have_one_required_string_parameter() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "run_python_code");
        assert_eq!(defs[1].name, "run_on_command_line");
        assert_eq!(
            defs[1].parameters,
            serde_json::json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "The command to run on the command line.",
                    }
                },
                "required": ["command"],
            })
        );
    }

    #[test]
    fn python_schema_requires_code() {
        let schema = EdaTool::RunPythonCode.parameters();
        assert_eq!(schema["required"], serde_json::json!(["python_code"]));
        assert_eq!(schema["properties"]["python_code"]["type"], "string");
        assert!(validate_arguments(&serde_json::json!({}), &schema).is_err());
        assert!(validate_arguments(&serde_json::json!({"python_code": "1 + 1"}), &schema).is_ok());
    }

    #[test]
    fn from_call_resolves_python_code() {
        let invocation =
            ToolInvocation::from_call(&call("run_python_code", r#"{"python_code":"df.describe()"}"#))
                .unwrap();
        assert_eq!(
            invocation,
            ToolInvocation::RunPythonCode {
                code: "df.describe()".into()
            }
        );
        assert_eq!(invocation.tool(), EdaTool::RunPythonCode);
    }

    #[test]
    fn from_call_rejects_unknown_tool() {
        let err = ToolInvocation::from_call(&call("delete_everything", "{}")).unwrap_err();
        assert!(matches!(err, EdaError::UnknownTool(name) if name == "delete_everything"));
    }

    #[test]
    fn from_call_rejects_wrong_argument_key() {
        let err =
            ToolInvocation::from_call(&call("run_on_command_line", r#"{"cmd":"ls"}"#)).unwrap_err();
        assert!(matches!(
            err,
            EdaError::InvalidToolArguments { message, .. } if message.contains("'command'")
        ));
    }
}
