//! The interactive tool-calling loop.

use std::sync::Arc;

use tracing::{debug, info};

use super::input::{is_exit_command, UserInput};
use super::prompt::{render_system_prompt, PromptContext};
use super::types::{SessionEnd, SessionLimits, TurnReport};
use crate::error::{EdaError, Result};
use crate::executor::{SandboxTools, ToolOutcome};
use crate::present::Presenter;
use crate::provider::{ModelProvider, ProviderRequest, ToolDefinition};
use crate::tools::{tool_definitions, ToolInvocation};
use crate::types::{AgentToolCall, GenerationSettings, ModelMessage, Usage};

/// One EDA chat session over a sandbox.
///
/// The conversation owns the message history. Every model request carries
/// the full history and the tool schemas; tool calls from one assistant
/// turn run sequentially in the order the model emitted them.
pub struct Conversation<'a> {
    provider: Arc<dyn ModelProvider>,
    tools: SandboxTools,
    presenter: &'a mut dyn Presenter,
    limits: SessionLimits,
    settings: GenerationSettings,
    definitions: Vec<ToolDefinition>,
    messages: Vec<ModelMessage>,
    usage: Usage,
}

impl<'a> Conversation<'a> {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        tools: SandboxTools,
        presenter: &'a mut dyn Presenter,
        limits: SessionLimits,
    ) -> Self {
        Self {
            provider,
            tools,
            presenter,
            limits,
            settings: GenerationSettings::default(),
            definitions: tool_definitions(),
            messages: Vec::new(),
            usage: Usage::default(),
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// History so far, oldest first.
    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    /// Token usage accumulated over the session.
    pub fn usage(&self) -> Usage {
        self.usage
    }

    /// Seed the history with the system message and announce the session.
    pub async fn start(&mut self, dataset_names: &[String]) -> Result<()> {
        let sandbox_files = match self.tools.list_home().await {
            Ok(files) => files,
            Err(err) => {
                self.presenter.error(&err);
                return Err(err);
            }
        };
        let prompt = render_system_prompt(&PromptContext {
            sandbox_files: &sandbox_files,
            dataset_names,
            tools: &self.definitions,
            max_consecutive_tool_calls: self.limits.max_consecutive_tool_calls(),
        });
        self.messages.clear();
        self.messages.push(ModelMessage::system(prompt));
        self.presenter.session_started();
        info!(
            model = self.provider.model_id(),
            datasets = dataset_names.len(),
            "eda session started"
        );
        Ok(())
    }

    /// Read user messages until the exit sentinel or end of input.
    ///
    /// A fatal error is shown to the user before it is returned.
    pub async fn run(&mut self, input: &mut dyn UserInput) -> Result<SessionEnd> {
        let outcome = self.run_inner(input).await;
        if let Err(err) = &outcome {
            self.presenter.error(err);
        }
        info!(
            input_tokens = self.usage.input_tokens,
            output_tokens = self.usage.output_tokens,
            "eda session finished"
        );
        outcome
    }

    async fn run_inner(&mut self, input: &mut dyn UserInput) -> Result<SessionEnd> {
        loop {
            let Some(text) = input.next_message().await? else {
                return Ok(SessionEnd::EndOfInput);
            };
            if is_exit_command(&text) {
                return Ok(SessionEnd::UserExit);
            }
            self.handle_user_turn(&text).await?;
        }
    }

    /// Answer one user message, running tools until the model replies
    /// without requesting any.
    ///
    /// At most `max_consecutive_tool_calls` requests are issued; if the last
    /// of them still asks for tools the turn fails with
    /// [`EdaError::ToolCallLimitExceeded`].
    pub async fn handle_user_turn(&mut self, text: &str) -> Result<TurnReport> {
        self.messages.push(ModelMessage::user(text));
        let limit = self.limits.max_consecutive_tool_calls();
        let mut report = TurnReport::default();

        for round in 0..limit {
            let request = ProviderRequest {
                messages: self.messages.clone(),
                settings: self.settings.clone(),
                tools: Some(self.definitions.clone()),
            };
            let response = self.provider.generate_text(&request).await?;
            report.rounds += 1;
            report.usage.merge(&response.usage);
            self.usage.merge(&response.usage);
            debug!(
                round,
                tool_calls = response.tool_calls.len(),
                finish_reason = ?response.finish_reason,
                "model round complete"
            );

            if response.is_final() {
                self.messages.push(ModelMessage::assistant(response.text.clone()));
                self.presenter.assistant_response(&response.text);
                report.answer = response.text;
                return Ok(report);
            }

            self.messages.push(ModelMessage::assistant_tool_calls(
                response.text,
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                self.dispatch(call).await?;
                report.tool_calls += 1;
            }
        }

        Err(EdaError::ToolCallLimitExceeded { limit })
    }

    /// Run one tool call and append its result message.
    async fn dispatch(&mut self, call: &AgentToolCall) -> Result<()> {
        let invocation = ToolInvocation::from_call(call)?;
        match &invocation {
            ToolInvocation::RunPythonCode { code } => self.presenter.code_submitted(code),
            ToolInvocation::RunOnCommandLine { command } => {
                self.presenter.command_submitted(command)
            }
        }
        debug!(call_id = %call.id, tool = %invocation.tool(), "dispatching tool call");

        let outcome = self.tools.dispatch(&invocation).await?;
        self.messages.push(ModelMessage::tool_result(
            call.id.clone(),
            call.name.clone(),
            outcome.to_message_content(),
            outcome.reports_error(),
        ));

        match &outcome {
            ToolOutcome::Code(result) => self.presenter.code_result(result),
            ToolOutcome::Command(result) => self.presenter.command_result(result),
        }
        Ok(())
    }
}
