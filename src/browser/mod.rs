//! Dataset download through an external browser-automation agent.
//!
//! The agent is any program that accepts the task as its last argument,
//! reads model credentials from `BROWSER_AGENT_*` environment variables,
//! saves files into `BROWSER_AGENT_DOWNLOAD_DIR`, and optionally reports
//! the file name as a final JSON line on stdout:
//! `{"name_of_file_with_extension": "data.csv"}`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::EdaConfig;
use crate::error::{EdaError, Result};
use crate::util::timeout::with_timeout;

/// Task used when the user asks for the sample dataset.
pub const DEFAULT_DATASET_TASK: &str = "Go to huggingface and search for An-j96/SuperstoreData then go to the files tab and just download the data.csv, then stop.";

const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Files a browser agent left in its download directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedDataset {
    pub download_dir: PathBuf,
    pub file_names: Vec<String>,
}

impl DownloadedDataset {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.file_names
            .iter()
            .map(|name| self.download_dir.join(name))
            .collect()
    }
}

/// Model endpoint the browser agent drives its browser with.
#[derive(Clone)]
pub struct BrowserCredentials {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl std::fmt::Debug for BrowserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserCredentials")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait BrowserAgent: Send + Sync {
    /// Carry out a download task, failing if no file was produced.
    async fn download(&self, task: &str) -> Result<DownloadedDataset>;
}

#[derive(Debug, Deserialize)]
struct AgentReport {
    #[serde(default)]
    name_of_file_with_extension: Option<String>,
    #[serde(default)]
    file_names: Vec<String>,
}

/// Runs a configured command as the browser agent.
#[derive(Debug, Clone)]
pub struct CommandBrowserAgent {
    program: String,
    args: Vec<String>,
    credentials: BrowserCredentials,
    download_dir: PathBuf,
    timeout: Duration,
}

impl CommandBrowserAgent {
    pub fn new(
        command: Vec<String>,
        credentials: BrowserCredentials,
        download_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let mut parts = command.into_iter();
        let program = parts.next().filter(|p| !p.trim().is_empty()).ok_or_else(|| {
            EdaError::Configuration("browser agent command is empty".into())
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
            credentials,
            download_dir: download_dir.into(),
            timeout: DEFAULT_AGENT_TIMEOUT,
        })
    }

    pub fn from_config(config: &EdaConfig) -> Result<Self> {
        let command = config.browser_agent_command.clone().ok_or_else(|| {
            EdaError::Configuration(
                "No browser agent configured (set EDA_BROWSER_AGENT_COMMAND)".into(),
            )
        })?;
        let credentials = BrowserCredentials {
            api_key: config
                .api_key
                .clone()
                .ok_or_else(|| EdaError::Authentication("Missing NOVITA_API_KEY".into()))?,
            model: config.browser_model.clone(),
            base_url: config
                .model_base_url
                .clone()
                .ok_or_else(|| EdaError::Configuration("Missing NOVITA_BASE_URL".into()))?,
        };
        Self::new(command, credentials, config.download_dir.clone())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run_agent(&self, task: &str) -> Result<String> {
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(task)
            .env("BROWSER_AGENT_API_KEY", &self.credentials.api_key)
            .env("BROWSER_AGENT_MODEL", &self.credentials.model)
            .env("BROWSER_AGENT_BASE_URL", &self.credentials.base_url)
            .env("BROWSER_AGENT_DOWNLOAD_DIR", &self.download_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| EdaError::BrowserAgent(format!("cannot start {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(EdaError::BrowserAgent(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl BrowserAgent for CommandBrowserAgent {
    async fn download(&self, task: &str) -> Result<DownloadedDataset> {
        tokio::fs::create_dir_all(&self.download_dir).await?;
        let before = list_files(&self.download_dir)?;
        info!(program = %self.program, dir = %self.download_dir.display(), "starting browser agent");

        let stdout = with_timeout(self.timeout, self.run_agent(task)).await?;

        let mut file_names = reported_files(&stdout);
        if file_names.is_empty() {
            debug!("browser agent reported no file name, diffing download dir");
            let after = list_files(&self.download_dir)?;
            file_names = after.difference(&before).cloned().collect();
        }
        file_names.retain(|name| {
            let exists = self.download_dir.join(name).is_file();
            if !exists {
                warn!(file = %name, "browser agent reported a file that does not exist");
            }
            exists
        });

        if file_names.is_empty() {
            return Err(EdaError::BrowserAgent(format!(
                "no file was downloaded to {}",
                self.download_dir.display()
            )));
        }
        info!(files = ?file_names, "browser agent finished");
        Ok(DownloadedDataset {
            download_dir: self.download_dir.clone(),
            file_names,
        })
    }
}

/// File names from the last JSON report line on the agent's stdout.
fn reported_files(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .rev()
        .filter_map(|line| serde_json::from_str::<AgentReport>(line.trim()).ok())
        .map(|report| {
            let mut names = report.file_names;
            if let Some(name) = report.name_of_file_with_extension {
                names.insert(0, name);
            }
            names
        })
        .find(|names| !names.is_empty())
        .unwrap_or_default()
}

fn list_files(dir: &Path) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}
