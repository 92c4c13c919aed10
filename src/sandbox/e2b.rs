//! E2B-compatible sandbox client.
//!
//! Three HTTP surfaces are involved: the control-plane API (create and kill),
//! the in-sandbox `envd` daemon (files, processes, directory listing), and
//! the code interpreter that keeps a persistent Python kernel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bon::Builder;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::envelope::{self, Frame};
use super::{
    resolve_path, CommandOutput, EntryInfo, EntryKind, Execution, ExecutionError,
    ExecutionResult, Sandbox, SANDBOX_HOME,
};
use crate::config::EdaConfig;
use crate::error::{EdaError, Result};
use crate::provider::http::{build_client, ensure_success, DEFAULT_REQUEST_TIMEOUT};
use crate::util::timeout::with_timeout;

pub const DEFAULT_TEMPLATE: &str = "code-interpreter-v1";
const ENVD_PORT: u16 = 49983;
const INTERPRETER_PORT: u16 = 49999;
const SANDBOX_USER: &str = "user";
const EXECUTION_GRACE: Duration = Duration::from_secs(30);

/// Connection settings for creating a sandbox.
#[derive(Clone, Builder)]
pub struct E2bSettings {
    #[builder(into)]
    pub api_key: String,
    #[builder(into)]
    pub domain: String,
    #[builder(into)]
    pub template: Option<String>,
    /// Sandbox lifetime requested from the control plane.
    #[builder(default = 600)]
    pub timeout_secs: u64,
    /// Upper bound on a single code cell or shell command.
    #[builder(default = Duration::from_secs(300))]
    pub execution_timeout: Duration,
    /// Route every surface to one base URL instead of the per-port hosts.
    #[builder(into)]
    pub endpoint_override: Option<String>,
}

impl std::fmt::Debug for E2bSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("E2bSettings")
            .field("domain", &self.domain)
            .field("template", &self.template)
            .field("timeout_secs", &self.timeout_secs)
            .field("execution_timeout", &self.execution_timeout)
            .field("endpoint_override", &self.endpoint_override)
            .finish_non_exhaustive()
    }
}

impl E2bSettings {
    pub fn from_config(config: &EdaConfig) -> Result<Self> {
        let domain = config
            .sandbox_domain
            .clone()
            .ok_or_else(|| EdaError::Configuration("Missing NOVITA_E2B_DOMAIN".into()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| EdaError::Authentication("Missing NOVITA_API_KEY".into()))?;
        Ok(Self {
            api_key,
            domain,
            template: config.sandbox_template.clone(),
            timeout_secs: config.sandbox_timeout_secs,
            execution_timeout: Duration::from_secs(config.execution_timeout_secs),
            endpoint_override: None,
        })
    }

    fn api_url(&self) -> String {
        match &self.endpoint_override {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://api.{}", self.domain),
        }
    }

    fn host_url(&self, port: u16, sandbox_id: &str) -> String {
        match &self.endpoint_override {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{port}-{sandbox_id}.{}", self.domain),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSandbox {
    #[serde(rename = "sandboxID")]
    sandbox_id: String,
    #[serde(default)]
    envd_access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListDirResponse {
    #[serde(default)]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    name: String,
    #[serde(default)]
    path: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    #[serde(default)]
    event: Option<ProcessEvent>,
}

#[derive(Debug, Default, Deserialize)]
struct ProcessEvent {
    #[serde(default)]
    data: Option<DataEvent>,
    #[serde(default)]
    end: Option<EndEvent>,
}

#[derive(Debug, Default, Deserialize)]
struct DataEvent {
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndEvent {
    #[serde(default)]
    exit_code: i32,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputLine {
    Result(ExecutionResult),
    Stdout {
        text: String,
    },
    Stderr {
        text: String,
    },
    Error {
        name: String,
        value: String,
        #[serde(default)]
        traceback: String,
    },
    NumberOfExecutions {
        execution_count: u32,
    },
    #[serde(other)]
    Other,
}

/// A live sandbox reachable over HTTP.
pub struct E2bSandbox {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    envd_url: String,
    interpreter_url: String,
    sandbox_id: String,
    access_token: Option<String>,
    execution_timeout: Duration,
    closed: AtomicBool,
}

impl std::fmt::Debug for E2bSandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("E2bSandbox")
            .field("sandbox_id", &self.sandbox_id)
            .field("envd_url", &self.envd_url)
            .field("interpreter_url", &self.interpreter_url)
            .finish_non_exhaustive()
    }
}

impl E2bSandbox {
    /// Ask the control plane for a new sandbox.
    pub async fn create(settings: &E2bSettings) -> Result<Self> {
        let client = build_client(
            DEFAULT_REQUEST_TIMEOUT.max(settings.execution_timeout + EXECUTION_GRACE),
        )?;
        let api_url = settings.api_url();
        let template = settings.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);

        let resp = client
            .post(format!("{api_url}/sandboxes"))
            .header("X-API-Key", &settings.api_key)
            .json(&json!({
                "templateID": template,
                "timeout": settings.timeout_secs,
            }))
            .send()
            .await?;
        let created: CreatedSandbox = ensure_success(resp).await?.json().await?;
        info!(sandbox_id = %created.sandbox_id, template, "sandbox created");

        Ok(Self {
            envd_url: settings.host_url(ENVD_PORT, &created.sandbox_id),
            interpreter_url: settings.host_url(INTERPRETER_PORT, &created.sandbox_id),
            sandbox_id: created.sandbox_id,
            access_token: created.envd_access_token,
            api_key: settings.api_key.clone(),
            api_url,
            client,
            execution_timeout: settings.execution_timeout,
            closed: AtomicBool::new(false),
        })
    }

    fn envd(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.basic_auth(SANDBOX_USER, None::<&str>);
        match &self.access_token {
            Some(token) => builder.header("X-Access-Token", token),
            None => builder,
        }
    }

    async fn collect_command(&self, command: &str) -> Result<CommandOutput> {
        let body = envelope::encode(&json!({
            "process": {
                "cmd": "/bin/bash",
                "args": ["-l", "-c", command],
                "envs": {},
                "cwd": SANDBOX_HOME,
            }
        }))?;
        let resp = self
            .envd(
                self.client
                    .post(format!("{}/process.Process/Start", self.envd_url)),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/connect+json")
            .header("Connect-Protocol-Version", "1")
            .body(body)
            .send()
            .await?;
        let bytes = ensure_success(resp).await?.bytes().await?;
        command_output_from_frames(&envelope::decode_all(&bytes)?)
    }

    async fn collect_execution(&self, code: &str) -> Result<Execution> {
        let mut builder = self
            .client
            .post(format!("{}/execute", self.interpreter_url))
            .json(&json!({ "code": code, "language": "python" }));
        if let Some(token) = &self.access_token {
            builder = builder.header("X-Access-Token", token);
        }
        let text = ensure_success(builder.send().await?).await?.text().await?;
        parse_execution(&text)
    }
}

#[async_trait]
impl Sandbox for E2bSandbox {
    fn sandbox_id(&self) -> &str {
        &self.sandbox_id
    }

    async fn write_file(&self, path: &str, data: Vec<u8>) -> Result<()> {
        let path = resolve_path(path);
        let file_name = path.rsplit('/').next().unwrap_or(&path).to_string();
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(data).file_name(file_name),
        );
        let resp = self
            .envd(self.client.post(format!("{}/files", self.envd_url)))
            .query(&[("path", path.as_str()), ("username", SANDBOX_USER)])
            .multipart(form)
            .send()
            .await?;
        ensure_success(resp).await?;
        debug!(sandbox_id = %self.sandbox_id, %path, "file written");
        Ok(())
    }

    async fn run_code(&self, code: &str) -> Result<Execution> {
        with_timeout(self.execution_timeout, self.collect_execution(code)).await
    }

    async fn run_command(&self, command: &str) -> Result<CommandOutput> {
        with_timeout(self.execution_timeout, self.collect_command(command)).await
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<EntryInfo>> {
        let resp = self
            .envd(
                self.client
                    .post(format!("{}/filesystem.Filesystem/ListDir", self.envd_url)),
            )
            .header("Connect-Protocol-Version", "1")
            .json(&json!({ "path": resolve_path(path), "depth": 1 }))
            .send()
            .await?;
        let listing: ListDirResponse = ensure_success(resp).await?.json().await?;
        Ok(listing
            .entries
            .into_iter()
            .map(|entry| EntryInfo {
                kind: if entry.kind == "FILE_TYPE_DIRECTORY" {
                    EntryKind::Dir
                } else {
                    EntryKind::File
                },
                name: entry.name,
                path: entry.path,
            })
            .collect())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(());
        }
        let resp = self
            .client
            .delete(format!("{}/sandboxes/{}", self.api_url, self.sandbox_id))
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;
        // Already gone counts as closed.
        if resp.status() != reqwest::StatusCode::NOT_FOUND {
            ensure_success(resp).await?;
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn command_output_from_frames(frames: &[Frame]) -> Result<CommandOutput> {
    let b64 = base64::engine::general_purpose::STANDARD;
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut end = None;

    for frame in frames {
        if frame.is_end_stream() {
            envelope::check_end_stream(frame)?;
            continue;
        }
        let Some(event) = serde_json::from_slice::<StartResponse>(&frame.payload)?.event else {
            continue;
        };
        if let Some(data) = event.data {
            if let Some(chunk) = data.stdout {
                stdout.extend(b64.decode(chunk).map_err(invalid_chunk)?);
            }
            if let Some(chunk) = data.stderr {
                stderr.extend(b64.decode(chunk).map_err(invalid_chunk)?);
            }
        }
        if event.end.is_some() {
            end = event.end;
        }
    }

    let end = end.ok_or_else(|| {
        EdaError::Sandbox("command stream ended without an exit status".into())
    })?;
    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_code: end.exit_code,
        error: end.error.filter(|e| !e.is_empty()),
    })
}

fn invalid_chunk(err: base64::DecodeError) -> EdaError {
    EdaError::Sandbox(format!("invalid process output chunk: {err}"))
}

fn parse_execution(body: &str) -> Result<Execution> {
    let mut execution = Execution::default();
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        match serde_json::from_str::<OutputLine>(line)? {
            OutputLine::Result(result) => execution.results.push(result),
            OutputLine::Stdout { text } => execution.logs.stdout.push(text),
            OutputLine::Stderr { text } => execution.logs.stderr.push(text),
            OutputLine::Error {
                name,
                value,
                traceback,
            } => {
                execution.error = Some(ExecutionError {
                    name,
                    value,
                    traceback,
                })
            }
            OutputLine::NumberOfExecutions { execution_count } => {
                execution.execution_count = Some(execution_count)
            }
            OutputLine::Other => {}
        }
    }
    Ok(execution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(flags: u8, payload: serde_json::Value) -> Frame {
        Frame {
            flags,
            payload: serde_json::to_vec(&payload).unwrap(),
        }
    }

    #[test]
    fn execution_stream_is_collected_by_kind() {
        let body = concat!(
            r#"{"type":"stdout","text":"hello\n"}"#,
            "\n",
            r#"{"type":"result","png":"iVBORw0KGgo=","is_main_result":false}"#,
            "\n",
            r#"{"type":"result","text":"42","is_main_result":true}"#,
            "\n",
            r#"{"type":"number_of_executions","execution_count":3}"#,
            "\n",
            r#"{"type":"end_of_execution"}"#,
            "\n"
        );
        let execution = parse_execution(body).unwrap();
        assert_eq!(execution.results.len(), 2);
        assert!(execution.results[0].has_image());
        assert_eq!(execution.results[1].text.as_deref(), Some("42"));
        assert_eq!(execution.logs.stdout, vec!["hello\n".to_string()]);
        assert_eq!(execution.execution_count, Some(3));
        assert!(execution.error.is_none());
    }

    #[test]
    fn execution_error_line_is_kept() {
        let body = r#"{"type":"error","name":"NameError","value":"name 'df' is not defined","traceback":"..."}"#;
        let execution = parse_execution(body).unwrap();
        let error = execution.error.unwrap();
        assert_eq!(error.name, "NameError");
        assert_eq!(error.to_string(), "NameError: name 'df' is not defined");
    }

    #[test]
    fn command_frames_decode_output_and_exit_code() {
        let frames = vec![
            frame(0, json!({"event": {"start": {"pid": 7}}})),
            frame(0, json!({"event": {"data": {"stdout": "ZGF0YS5jc3YK"}}})),
            frame(0, json!({"event": {"data": {"stderr": "d2Fybg=="}}})),
            frame(0, json!({"event": {"end": {"exitCode": 2, "exited": true, "status": "exit status 2"}}})),
            frame(envelope::END_STREAM_FLAG, json!({})),
        ];
        let output = command_output_from_frames(&frames).unwrap();
        assert_eq!(
            output,
            CommandOutput {
                stdout: "data.csv\n".into(),
                stderr: "warn".into(),
                exit_code: 2,
                error: None,
            }
        );
    }

    #[test]
    fn missing_end_event_is_an_error() {
        let frames = vec![frame(0, json!({"event": {"keepalive": {}}}))];
        assert!(command_output_from_frames(&frames).is_err());
    }

    #[test]
    fn host_urls_follow_domain_unless_overridden() {
        let settings = E2bSettings::builder()
            .api_key("k")
            .domain("sandbox.novita.ai")
            .build();
        assert_eq!(settings.api_url(), "https://api.sandbox.novita.ai");
        assert_eq!(
            settings.host_url(ENVD_PORT, "abc"),
            "https://49983-abc.sandbox.novita.ai"
        );

        let local = E2bSettings::builder()
            .api_key("k")
            .domain("unused")
            .endpoint_override("http://127.0.0.1:9000/")
            .build();
        assert_eq!(local.host_url(INTERPRETER_PORT, "abc"), "http://127.0.0.1:9000");
    }
}
