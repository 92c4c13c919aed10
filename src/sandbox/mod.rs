//! Remote code sandbox: the provider trait, its data types, and helpers
//! for uploading files and scoping a sandbox's lifetime.

pub mod e2b;
pub mod envelope;
pub mod scope;
pub mod transport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use e2b::{E2bSandbox, E2bSettings};
pub use scope::with_sandbox;
pub use transport::upload_files;

/// Working directory of the sandbox user; uploads land here.
pub const SANDBOX_HOME: &str = "/home/user";

/// One value produced by a code cell (the last expression, a display call, a plot).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    /// Base64-encoded PNG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub png: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<serde_json::Value>,
    #[serde(default)]
    pub is_main_result: bool,
}

impl ExecutionResult {
    pub fn has_image(&self) -> bool {
        self.png.as_deref().is_some_and(|png| !png.is_empty())
    }
}

/// Captured stdout/stderr of a code cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Logs {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// Exception raised inside the interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionError {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub traceback: String,
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Full outcome of running one code cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Execution {
    pub results: Vec<ExecutionResult>,
    pub logs: Logs,
    pub error: Option<ExecutionError>,
    pub execution_count: Option<u32>,
}

/// Outcome of a shell command that the sandbox managed to run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Dir,
}

/// A directory entry in the sandbox filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
}

/// A remote isolated environment with files, a persistent interpreter,
/// and a shell.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Provider-assigned identifier.
    fn sandbox_id(&self) -> &str;

    /// Write `data` to `path`; relative paths resolve against [`SANDBOX_HOME`].
    async fn write_file(&self, path: &str, data: Vec<u8>) -> Result<()>;

    /// Run Python in the sandbox's persistent interpreter session.
    async fn run_code(&self, code: &str) -> Result<Execution>;

    /// Run a shell command and wait for it to exit.
    async fn run_command(&self, command: &str) -> Result<CommandOutput>;

    /// List the entries of a directory.
    async fn list_dir(&self, path: &str) -> Result<Vec<EntryInfo>>;

    /// Release the sandbox. Safe to call more than once.
    async fn close(&self) -> Result<()>;
}

/// Resolve a sandbox path against the user's home directory.
pub fn resolve_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{SANDBOX_HOME}/{}", path.trim_start_matches("./"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_under_home() {
        assert_eq!(resolve_path("data.csv"), "/home/user/data.csv");
        assert_eq!(resolve_path("./meta.csv"), "/home/user/meta.csv");
        assert_eq!(resolve_path("/tmp/x.csv"), "/tmp/x.csv");
    }

    #[test]
    fn empty_png_is_not_an_image() {
        let result = ExecutionResult {
            png: Some(String::new()),
            ..Default::default()
        };
        assert!(!result.has_image());
    }
}
