//! Error types for agentic-eda.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for all EDA operations.
///
/// Tool executors never surface sandbox command failures through this type;
/// those are folded into the tool result and handed back to the model. What
/// remains here either ends the session or never starts one.
#[derive(Error, Debug)]
pub enum EdaError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Sandbox error: {0}")]
    Sandbox(String),

    #[error("Failed to upload {path} to sandbox: {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: Box<EdaError>,
    },

    #[error("Upload needs one sandbox name per file: got {paths} paths and {names} names")]
    UploadMismatch { paths: usize, names: usize },

    #[error("Consecutive tool calls from the agent must not exceed {limit}")]
    ToolCallLimitExceeded { limit: usize },

    #[error("Unknown function call: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool_name}: {message}")]
    InvalidToolArguments { tool_name: String, message: String },

    #[error("Invalid image output: {0}")]
    InvalidImage(String),

    #[error("Browser agent error: {0}")]
    BrowserAgent(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Session interrupted")]
    Interrupted,
}

/// Coarse classification used for retry decisions and CLI help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Sandbox,
    AgentContract,
    Unknown,
}

impl EdaError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Wrap a failure for one uploaded file.
    pub fn upload(path: impl Into<PathBuf>, source: EdaError) -> Self {
        Self::Upload {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Sandbox(_) | Self::Upload { .. } | Self::UploadMismatch { .. } => {
                ErrorCategory::Sandbox
            }
            Self::ToolCallLimitExceeded { .. }
            | Self::UnknownTool(_)
            | Self::InvalidToolArguments { .. }
            | Self::InvalidImage(_) => ErrorCategory::AgentContract,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
        )
    }

    /// Whether this error ends an EDA session rather than a single request.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::AgentContract | ErrorCategory::Sandbox
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, EdaError>;
