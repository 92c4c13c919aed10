//! Normalized tool results and their model-facing encoding.

use std::path::PathBuf;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::sandbox::{CommandOutput, ExecutionError, ExecutionResult, Logs};

/// Stand-in sent to the model in place of image payloads.
pub const IMAGES_SHOWN_NOTICE: &str = "THE IMAGES HAVE ALREADY BEEN SHOWN TO THE USER ON THE TERMINAL AND SAVED TO TEMP FILES eg temp-{timestamp}.png, THE OTHER OUTPUTS ARE BELOW";

/// Everything a code cell produced except its images.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OtherOutputs {
    pub outputs: Vec<ExecutionResult>,
    pub logs: Logs,
    pub error: Option<ExecutionError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeExecutionResult {
    /// Base64 PNG payloads, in result order.
    pub image_outputs: Vec<String>,
    pub other_outputs: OtherOutputs,
    /// Local files the images were written to, parallel to `image_outputs`.
    pub saved_images: Vec<PathBuf>,
}

impl CodeExecutionResult {
    pub fn has_images(&self) -> bool {
        !self.image_outputs.is_empty()
    }

    /// Text sent back to the model for this result.
    pub fn model_text(&self) -> String {
        let other = serde_json::to_string(&self.other_outputs)
            .unwrap_or_else(|e| format!("{{\"serialization_error\":\"{e}\"}}"));
        if self.has_images() {
            format!("{IMAGES_SHOWN_NOTICE}\n{other}")
        } else {
            other
        }
    }
}

/// Outcome of a shell command: either the command's output or the reason
/// it could not be dispatched, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandExecutionResult {
    Output(CommandOutput),
    ExecutionError(String),
}

impl CommandExecutionResult {
    pub fn output(&self) -> Option<&CommandOutput> {
        match self {
            Self::Output(output) => Some(output),
            Self::ExecutionError(_) => None,
        }
    }

    pub fn execution_error(&self) -> Option<&str> {
        match self {
            Self::Output(_) => None,
            Self::ExecutionError(message) => Some(message),
        }
    }
}

impl Serialize for CommandExecutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CommandExecutionResult", 2)?;
        state.serialize_field("output", &self.output())?;
        state.serialize_field("execution_error", &self.execution_error())?;
        state.end()
    }
}

/// Result of one dispatched tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Code(CodeExecutionResult),
    Command(CommandExecutionResult),
}

impl ToolOutcome {
    /// Content of the tool message answering the call.
    ///
    /// Code results go out as a single text part; command results as the
    /// JSON-encoded result string.
    pub fn to_message_content(&self) -> Value {
        match self {
            Self::Code(result) => json!([{ "type": "text", "text": result.model_text() }]),
            Self::Command(result) => Value::String(
                serde_json::to_string(result)
                    .unwrap_or_else(|e| format!("{{\"serialization_error\":\"{e}\"}}")),
            ),
        }
    }

    /// Whether the sandbox reported a failure inside the result.
    pub fn reports_error(&self) -> bool {
        match self {
            Self::Code(result) => result.other_outputs.error.is_some(),
            Self::Command(CommandExecutionResult::ExecutionError(_)) => true,
            Self::Command(CommandExecutionResult::Output(output)) => {
                output.exit_code != 0 || output.error.is_some()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn command_result_serializes_both_fields() {
        let failed = CommandExecutionResult::ExecutionError("connection reset".into());
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"output": null, "execution_error": "connection reset"})
        );

        let ok = CommandExecutionResult::Output(CommandOutput {
            stdout: "data.csv\n".into(),
            ..Default::default()
        });
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({
                "output": {"stdout": "data.csv\n", "stderr": "", "exit_code": 0, "error": null},
                "execution_error": null,
            })
        );
    }

    #[test]
    fn code_content_mentions_images_only_when_present() {
        let mut result = CodeExecutionResult::default();
        let plain = ToolOutcome::Code(result.clone()).to_message_content();
        let text = plain[0]["text"].as_str().unwrap();
        assert!(!text.contains("IMAGES"));
        assert!(text.contains("\"logs\""));

        result.image_outputs.push("iVBORw0KGgo=".into());
        let with_images = ToolOutcome::Code(result).to_message_content();
        let text = with_images[0]["text"].as_str().unwrap();
        assert!(text.starts_with(IMAGES_SHOWN_NOTICE));
        assert!(!text.contains("iVBORw0KGgo="));
    }

    #[test]
    fn nonzero_exit_counts_as_reported_error() {
        let outcome = ToolOutcome::Command(CommandExecutionResult::Output(CommandOutput {
            exit_code: 1,
            ..Default::default()
        }));
        assert!(outcome.reports_error());
    }
}
