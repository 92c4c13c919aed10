//! CLI-specific error formatting for user-facing messages.

use crate::error::EdaError;

/// Map an [`EdaError`] to a user-facing help string with actionable guidance.
pub fn format_error_help(err: &EdaError) -> String {
    match err {
        EdaError::Configuration(msg) => {
            format!("Configuration error: {msg}. Set it in .env, the environment, or the config file")
        }
        EdaError::Authentication(msg) => {
            format!("Authentication failed: {msg}. Check NOVITA_API_KEY")
        }
        EdaError::ToolCallLimitExceeded { .. } => {
            format!("{err}. Raise the ceiling with --max-tool-calls or EDA_MAX_TOOL_CALLS")
        }
        EdaError::Upload { .. } | EdaError::UploadMismatch { .. } => {
            format!("{err}. Check that the dataset path exists and is readable")
        }
        EdaError::BrowserAgent(msg) => format!(
            "Browser agent failed: {msg}. Check EDA_BROWSER_AGENT_COMMAND or use an existing dataset"
        ),
        EdaError::Interrupted => format!("{err}. The sandbox was closed"),
        other => format!("{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_error_suggests_flag() {
        let help = format_error_help(&EdaError::ToolCallLimitExceeded { limit: 12 });
        assert!(help.contains("12"));
        assert!(help.contains("--max-tool-calls"));
    }

    #[test]
    fn authentication_error_mentions_key() {
        let help = format_error_help(&EdaError::Authentication("bad key".into()));
        assert!(help.contains("NOVITA_API_KEY"));
    }

    #[test]
    fn other_error_falls_through_to_display() {
        let help = format_error_help(&EdaError::UnknownTool("rm_rf".into()));
        assert_eq!(help, "Unknown function call: rm_rf");
    }
}
