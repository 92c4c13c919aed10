//! Shared test helpers: scripted provider, in-memory sandbox, recording presenter.
#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use agentic_eda::error::{EdaError, Result};
use agentic_eda::executor::{CodeExecutionResult, CommandExecutionResult};
use agentic_eda::present::Presenter;
use agentic_eda::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use agentic_eda::sandbox::{
    CommandOutput, EntryInfo, EntryKind, Execution, ExecutionResult, Sandbox,
};
use agentic_eda::types::*;

/// 1x1 PNG, base64.
pub const TINY_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

/// A provider that replays queued responses and records every request.
pub struct MockProvider {
    model_id: String,
    responses: Mutex<VecDeque<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new(model_id: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a final text answer.
    pub fn queue_response(&self, text: &str) {
        self.responses.lock().unwrap().push_back(ProviderResponse {
            text: text.to_string(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
                total_tokens: 30,
            },
            tool_calls: vec![],
            finish_reason: Some(FinishReason::Stop),
        });
    }

    /// Queue one assistant turn requesting `calls` as (id, name, raw arguments).
    pub fn queue_tool_calls(&self, calls: &[(&str, &str, &str)]) {
        self.responses.lock().unwrap().push_back(ProviderResponse {
            text: String::new(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
            },
            tool_calls: calls
                .iter()
                .map(|(id, name, args)| AgentToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments: args.to_string(),
                })
                .collect(),
            finish_reason: Some(FinishReason::ToolCalls),
        });
    }

    /// Queue a single `run_on_command_line` call.
    pub fn queue_command(&self, id: &str, command: &str) {
        let args = serde_json::json!({ "command": command }).to_string();
        self.queue_tool_calls(&[(id, "run_on_command_line", &args)]);
    }

    /// Queue a single `run_python_code` call.
    pub fn queue_code(&self, id: &str, code: &str) {
        let args = serde_json::json!({ "python_code": code }).to_string();
        self.queue_tool_calls(&[(id, "run_python_code", &args)]);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| ProviderResponse {
            text: "Mock response".to_string(),
            ..Default::default()
        }))
    }
}

/// A sandbox that keeps files in memory and replays scripted executions.
#[derive(Default)]
pub struct MemorySandbox {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    writes: Mutex<Vec<String>>,
    executions: Mutex<VecDeque<std::result::Result<Execution, String>>>,
    commands: Mutex<VecDeque<std::result::Result<CommandOutput, String>>>,
    code_log: Mutex<Vec<String>>,
    command_log: Mutex<Vec<String>>,
    fail_writes: bool,
    closes: AtomicUsize,
}

impl MemorySandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `write_file` call fails.
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn queue_execution(&self, execution: Execution) {
        self.executions.lock().unwrap().push_back(Ok(execution));
    }

    pub fn queue_execution_failure(&self, message: &str) {
        self.executions
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn queue_command_output(&self, output: CommandOutput) {
        self.commands.lock().unwrap().push_back(Ok(output));
    }

    pub fn queue_command_failure(&self, message: &str) {
        self.commands
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// Paths written, in call order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn code_log(&self) -> Vec<String> {
        self.code_log.lock().unwrap().clone()
    }

    pub fn command_log(&self) -> Vec<String> {
        self.command_log.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sandbox for MemorySandbox {
    fn sandbox_id(&self) -> &str {
        "memory-sandbox"
    }

    async fn write_file(&self, path: &str, data: Vec<u8>) -> Result<()> {
        self.writes.lock().unwrap().push(path.to_string());
        if self.fail_writes {
            return Err(EdaError::Sandbox("disk full".into()));
        }
        self.files.lock().unwrap().insert(path.to_string(), data);
        Ok(())
    }

    async fn run_code(&self, code: &str) -> Result<Execution> {
        self.code_log.lock().unwrap().push(code.to_string());
        match self.executions.lock().unwrap().pop_front() {
            Some(Ok(execution)) => Ok(execution),
            Some(Err(message)) => Err(EdaError::Sandbox(message)),
            None => Ok(Execution::default()),
        }
    }

    async fn run_command(&self, command: &str) -> Result<CommandOutput> {
        self.command_log.lock().unwrap().push(command.to_string());
        match self.commands.lock().unwrap().pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(EdaError::Sandbox(message)),
            None => Ok(CommandOutput::default()),
        }
    }

    async fn list_dir(&self, _path: &str) -> Result<Vec<EntryInfo>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .map(|path| EntryInfo {
                name: path.rsplit('/').next().unwrap_or(path).to_string(),
                path: path.clone(),
                kind: EntryKind::File,
            })
            .collect())
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A text-only execution result.
pub fn text_result(text: &str) -> ExecutionResult {
    ExecutionResult {
        text: Some(text.to_string()),
        is_main_result: true,
        ..Default::default()
    }
}

/// An image execution result.
pub fn png_result(png: &str) -> ExecutionResult {
    ExecutionResult {
        png: Some(png.to_string()),
        ..Default::default()
    }
}

/// What a [`RecordingPresenter`] was asked to show.
#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    SessionStarted,
    Code(String),
    Command(String),
    CodeResult(CodeExecutionResult),
    CommandResult(CommandExecutionResult),
    Answer(String),
    Error(String),
    Info(String),
}

#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub shown: Vec<Shown>,
}

impl RecordingPresenter {
    pub fn errors(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Error(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn answers(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Answer(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn session_started(&mut self) {
        self.shown.push(Shown::SessionStarted);
    }

    fn code_submitted(&mut self, code: &str) {
        self.shown.push(Shown::Code(code.to_string()));
    }

    fn command_submitted(&mut self, command: &str) {
        self.shown.push(Shown::Command(command.to_string()));
    }

    fn code_result(&mut self, result: &CodeExecutionResult) {
        self.shown.push(Shown::CodeResult(result.clone()));
    }

    fn command_result(&mut self, result: &CommandExecutionResult) {
        self.shown.push(Shown::CommandResult(result.clone()));
    }

    fn assistant_response(&mut self, text: &str) {
        self.shown.push(Shown::Answer(text.to_string()));
    }

    fn error(&mut self, error: &EdaError) {
        self.shown.push(Shown::Error(error.to_string()));
    }

    fn info(&mut self, message: &str) {
        self.shown.push(Shown::Info(message.to_string()));
    }
}
