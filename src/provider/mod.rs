//! Chat-completions provider trait and the OpenAI-compatible implementation.

pub mod format;
pub mod http;
pub mod openai;

use async_trait::async_trait;

use crate::config::EdaConfig;
use crate::error::{EdaError, Result};
use crate::types::{AgentToolCall, FinishReason, GenerationSettings, ModelMessage, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub tool_calls: Vec<AgentToolCall>,
    pub finish_reason: Option<FinishReason>,
}

impl ProviderResponse {
    /// Whether the model answered instead of asking for tools.
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Core trait implemented by chat-completion providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "openai-compatible").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Issue one chat-completion request and wait for the full response.
    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse>;
}

/// Create the EDA chat provider from configuration.
pub fn create_provider(config: &EdaConfig) -> Result<Box<dyn ModelProvider>> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| EdaError::Authentication("Missing NOVITA_API_KEY".into()))?;
    let base_url = config
        .model_base_url
        .clone()
        .ok_or_else(|| EdaError::Configuration("Missing NOVITA_BASE_URL".into()))?;
    Ok(Box::new(openai::OpenAiProvider::new(
        config.eda_model.clone(),
        api_key,
        Some(base_url),
    )?))
}
