//! System prompt for the EDA agent.

use crate::provider::ToolDefinition;
use crate::sandbox::SANDBOX_HOME;

const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are an Exploratory Data Analysis (EDA) agent and you have access to a sandbox where you can:

- Execute python code using the run_python_code function call.
- You can basically do anything you can do on a linux machine via the run_on_command_line or run_python_code function call.

Your current PWD is '{home}' and below are the files in it.
{sandbox_files}

Note:
-   The sandbox already comes pre-installed with the usual data analysis packages but if there's a package you
    are not sure exists or your code had an import error due to a missing package, you can check if it's installed and if not install it.

-   For image outputs (e.g from data visualization) make sure it is png format.

Function Call Guidelines:
- Always use run_python_code to perform any task unless you absolutely need to use run_on_command_line (e.g to install packages, etc)
- Chain function calls when needed: After receiving results from one function call, immediately make additional calls if more information is required
- Gather just the needed information first: Respond to the user only when you have at least enough information from function calls to provide a good answer
- Be efficient: Although there is a maximum limit of {max_calls} consecutive function calls try to make as few calls as possible to get just enough information.
- Don't just assume the user will read the output of the tool call, respond to them with your answer.

Be a helpful assistant to the user who is probably trying to perform EDA on the dataset file(s) at {dataset_paths}

You can perform the following function calls:
{tool_schemas}
"#;

/// Everything the system prompt is rendered from.
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub sandbox_files: &'a [String],
    pub dataset_names: &'a [String],
    pub tools: &'a [ToolDefinition],
    pub max_consecutive_tool_calls: usize,
}

/// Render the system message for a new session.
pub fn render_system_prompt(ctx: &PromptContext<'_>) -> String {
    let dataset_paths = ctx
        .dataset_names
        .iter()
        .map(|name| format!("({SANDBOX_HOME}/{name})"))
        .collect::<Vec<_>>()
        .join(", ");
    let schemas: Vec<serde_json::Value> = ctx
        .tools
        .iter()
        .map(|tool| {
            serde_json::json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                }
            })
        })
        .collect();
    let tool_schemas = serde_json::to_string_pretty(&schemas).unwrap_or_default();
    let sandbox_files = serde_json::to_string(ctx.sandbox_files).unwrap_or_default();

    SYSTEM_PROMPT_TEMPLATE
        .replace("{home}", SANDBOX_HOME)
        .replace("{sandbox_files}", &sandbox_files)
        .replace("{max_calls}", &ctx.max_consecutive_tool_calls.to_string())
        .replace("{dataset_paths}", &dataset_paths)
        .replace("{tool_schemas}", &tool_schemas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tool_definitions;

    #[test]
    fn prompt_lists_files_datasets_tools_and_limit() {
        let files = vec!["data.csv".to_string(), ".bashrc".to_string()];
        let datasets = vec!["data.csv".to_string()];
        let tools = tool_definitions();
        let prompt = render_system_prompt(&PromptContext {
            sandbox_files: &files,
            dataset_names: &datasets,
            tools: &tools,
            max_consecutive_tool_calls: 7,
        });

        assert!(prompt.contains(r#"["data.csv",".bashrc"]"#));
        assert!(prompt.contains("(/home/user/data.csv)"));
        assert!(prompt.contains("maximum limit of 7 consecutive"));
        assert!(prompt.contains("\"run_on_command_line\""));
        assert!(!prompt.contains("{tool_schemas}"));
    }
}
