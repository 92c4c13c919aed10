//! Executors for the sandbox tools.

pub mod images;
pub mod result;

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::sandbox::{Sandbox, SANDBOX_HOME};
use crate::tools::ToolInvocation;

pub use images::TempImageWriter;
pub use result::{
    CodeExecutionResult, CommandExecutionResult, OtherOutputs, ToolOutcome, IMAGES_SHOWN_NOTICE,
};

/// Runs tool invocations against one sandbox.
pub struct SandboxTools {
    sandbox: Arc<dyn Sandbox>,
    images: TempImageWriter,
}

impl SandboxTools {
    pub fn new(sandbox: Arc<dyn Sandbox>, images: TempImageWriter) -> Self {
        Self { sandbox, images }
    }

    pub fn sandbox(&self) -> &Arc<dyn Sandbox> {
        &self.sandbox
    }

    /// Run Python in the sandbox and save every image result locally.
    ///
    /// Transport failures and images that cannot be decoded or written are
    /// returned as errors. Exceptions raised by the code itself are part of
    /// the result.
    pub async fn run_python_code(&self, code: &str) -> Result<CodeExecutionResult> {
        let execution = self.sandbox.run_code(code).await?;

        let (images, outputs): (Vec<_>, Vec<_>) = execution
            .results
            .into_iter()
            .partition(|result| result.has_image());
        let image_outputs: Vec<String> = images.into_iter().filter_map(|r| r.png).collect();

        let mut saved_images = Vec::with_capacity(image_outputs.len());
        for png in &image_outputs {
            saved_images.push(self.images.save(png).await?);
        }

        info!(
            images = image_outputs.len(),
            outputs = outputs.len(),
            errored = execution.error.is_some(),
            "python code executed"
        );
        Ok(CodeExecutionResult {
            image_outputs,
            other_outputs: OtherOutputs {
                outputs,
                logs: execution.logs,
                error: execution.error,
            },
            saved_images,
        })
    }

    /// Run a shell command. Failures to reach the sandbox become the
    /// result's execution error.
    pub async fn run_on_command_line(&self, command: &str) -> CommandExecutionResult {
        match self.sandbox.run_command(command).await {
            Ok(output) => {
                info!(exit_code = output.exit_code, "command executed");
                CommandExecutionResult::Output(output)
            }
            Err(err) => {
                warn!(error = %err, "command dispatch failed");
                CommandExecutionResult::ExecutionError(err.to_string())
            }
        }
    }

    pub async fn dispatch(&self, invocation: &ToolInvocation) -> Result<ToolOutcome> {
        match invocation {
            ToolInvocation::RunPythonCode { code } => {
                self.run_python_code(code).await.map(ToolOutcome::Code)
            }
            ToolInvocation::RunOnCommandLine { command } => Ok(ToolOutcome::Command(
                self.run_on_command_line(command).await,
            )),
        }
    }

    /// Names of the entries in the sandbox home directory.
    pub async fn list_home(&self) -> Result<Vec<String>> {
        Ok(self
            .sandbox
            .list_dir(SANDBOX_HOME)
            .await?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }
}
