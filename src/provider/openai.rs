//! OpenAI-compatible Chat Completions provider.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{EdaError, Result};
use crate::types::*;
use crate::util::retry::RetryPolicy;

use super::format::tool_result_content;
use super::http::{bearer_headers, build_client, ensure_success, DEFAULT_REQUEST_TIMEOUT};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    model_id: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    retry_policy: RetryPolicy,
}

impl OpenAiProvider {
    pub fn new(model_id: String, api_key: String, base_url: Option<String>) -> Result<Self> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model_id,
            api_key,
            client: build_client(DEFAULT_REQUEST_TIMEOUT)?,
            retry_policy: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_openai)
            .collect::<Vec<_>>();

        let mut body = serde_json::Map::new();
        body.insert("model".into(), self.model_id.clone().into());
        body.insert("messages".into(), messages.into());

        if let Some(max) = request.settings.max_tokens {
            body.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = request.settings.temperature {
            body.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = request.settings.top_p {
            body.insert("top_p".into(), top_p.into());
        }
        if let Some(seed) = request.settings.seed {
            body.insert("seed".into(), seed.into());
        }
        if let Some(ref user) = request.settings.user {
            body.insert("user".into(), user.clone().into());
        }

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let tool_defs: Vec<serde_json::Value> = tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters,
                            }
                        })
                    })
                    .collect();
                body.insert("tools".into(), tool_defs.into());
            }
        }

        serde_json::Value::Object(body)
    }

    async fn send_once(&self, body: &serde_json::Value) -> Result<OpenAiChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(body)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai-compatible"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let body = self.build_request_body(request);

        debug!(
            model = self.model_id.as_str(),
            messages = request.messages.len(),
            "chat completion request"
        );

        let data = self.retry_policy.execute(|| self.send_once(&body)).await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EdaError::api(200, "No choices in chat completion response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| AgentToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(ProviderResponse {
            text: choice.message.content.unwrap_or_default(),
            usage: data
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
            tool_calls,
            finish_reason: choice.finish_reason.as_deref().and_then(parse_finish_reason),
        })
    }
}

fn parse_finish_reason(s: &str) -> Option<FinishReason> {
    s.parse().ok()
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn message_to_openai(msg: &ModelMessage) -> serde_json::Value {
    if let Some(result) = msg.tool_result_part() {
        let mut tool_msg = serde_json::json!({
            "role": "tool",
            "tool_call_id": result.tool_call_id,
            "content": tool_result_content(&result.result),
        });
        if let Some(ref name) = msg.name {
            tool_msg["name"] = name.clone().into();
        }
        return tool_msg;
    }

    let tool_calls = msg.tool_calls();
    if !tool_calls.is_empty() {
        let tc_json: Vec<serde_json::Value> = tool_calls
            .iter()
            .map(|tc| {
                serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": tc.arguments,
                    }
                })
            })
            .collect();
        let text = msg.text_content();
        return serde_json::json!({
            "role": role_name(msg.role),
            "content": if text.is_empty() { serde_json::Value::Null } else { serde_json::Value::String(text) },
            "tool_calls": tc_json,
        });
    }

    serde_json::json!({ "role": role_name(msg.role), "content": msg.text_content() })
}

// Chat Completions response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
