//! OpenAI-compatible provider against a mock HTTP server.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agentic_eda::error::EdaError;
use agentic_eda::provider::openai::OpenAiProvider;
use agentic_eda::provider::{ModelProvider, ProviderRequest};
use agentic_eda::tools::tool_definitions;
use agentic_eda::types::{AgentToolCall, FinishReason, GenerationSettings, ModelMessage};
use agentic_eda::util::retry::RetryPolicy;

fn provider(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new(
        "deepseek/deepseek-v3-0324".to_string(),
        "test-key".to_string(),
        Some(format!("{}/v3/openai/", server.uri())),
    )
    .unwrap()
    .with_retry_policy(RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(1),
        multiplier: 1.0,
    })
}

fn request(messages: Vec<ModelMessage>) -> ProviderRequest {
    ProviderRequest {
        messages,
        settings: GenerationSettings::default(),
        tools: Some(tool_definitions()),
    }
}

fn completion(message: Value, finish_reason: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{ "index": 0, "message": message, "finish_reason": finish_reason }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150 }
    })
}

#[tokio::test]
async fn sends_history_and_tool_schemas() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/openai/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "deepseek/deepseek-v3-0324",
            "messages": [
                { "role": "system", "content": "You are an EDA agent." },
                { "role": "user", "content": "describe the data" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({ "role": "assistant", "content": "It has 3 columns." }),
            "stop",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server)
        .generate_text(&request(vec![
            ModelMessage::system("You are an EDA agent."),
            ModelMessage::user("describe the data"),
        ]))
        .await
        .unwrap();

    assert!(response.is_final());
    assert_eq!(response.text, "It has 3 columns.");
    assert_eq!(response.finish_reason, Some(FinishReason::Stop));
    assert_eq!(response.usage.total_tokens, 150);

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    let names: Vec<&str> = body["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["function"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["run_python_code", "run_on_command_line"]);
    assert_eq!(body["tools"][0]["type"], "function");
}

#[tokio::test]
async fn parses_tool_calls_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/openai/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [
                    {
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "run_on_command_line", "arguments": "{\"command\":\"ls\"}" }
                    },
                    {
                        "id": "call_2",
                        "type": "function",
                        "function": { "name": "run_python_code", "arguments": "{\"python_code\":\"df.head()\"}" }
                    }
                ]
            }),
            "tool_calls",
        )))
        .mount(&server)
        .await;

    let response = provider(&server)
        .generate_text(&request(vec![ModelMessage::user("look")]))
        .await
        .unwrap();

    assert!(!response.is_final());
    assert_eq!(response.text, "");
    assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
    assert_eq!(
        response.tool_calls,
        vec![
            AgentToolCall {
                id: "call_1".into(),
                name: "run_on_command_line".into(),
                arguments: r#"{"command":"ls"}"#.into(),
            },
            AgentToolCall {
                id: "call_2".into(),
                name: "run_python_code".into(),
                arguments: r#"{"python_code":"df.head()"}"#.into(),
            },
        ]
    );
}

#[tokio::test]
async fn tool_messages_round_trip_call_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/openai/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "user", "content": "list files" },
                {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "run_on_command_line", "arguments": "{\"command\":\"ls\"}" }
                    }]
                },
                {
                    "role": "tool",
                    "tool_call_id": "call_1",
                    "name": "run_on_command_line",
                    "content": "{\"output\":null,\"execution_error\":\"boom\"}"
                }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({ "role": "assistant", "content": "The command failed." }),
            "stop",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let call = AgentToolCall {
        id: "call_1".into(),
        name: "run_on_command_line".into(),
        arguments: r#"{"command":"ls"}"#.into(),
    };
    let response = provider(&server)
        .generate_text(&request(vec![
            ModelMessage::user("list files"),
            ModelMessage::assistant_tool_calls("", vec![call]),
            ModelMessage::tool_result(
                "call_1",
                "run_on_command_line",
                json!(r#"{"output":null,"execution_error":"boom"}"#),
                true,
            ),
        ]))
        .await
        .unwrap();

    assert_eq!(response.text, "The command failed.");
}

#[tokio::test]
async fn retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/openai/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/openai/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({ "role": "assistant", "content": "recovered" }),
            "stop",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server)
        .generate_text(&request(vec![ModelMessage::user("hi")]))
        .await
        .unwrap();
    assert_eq!(response.text, "recovered");
}

#[tokio::test]
async fn authentication_failures_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/openai/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server)
        .generate_text(&request(vec![ModelMessage::user("hi")]))
        .await
        .unwrap_err();
    assert!(matches!(err, EdaError::Authentication(ref body) if body == "invalid api key"));
}

#[tokio::test]
async fn empty_choices_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/openai/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .generate_text(&request(vec![ModelMessage::user("hi")]))
        .await
        .unwrap_err();
    assert!(matches!(err, EdaError::Api { status: 200, .. }));
}
