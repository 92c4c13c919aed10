//! Convenience re-exports for common use.

pub use crate::agent_loop::{Conversation, SessionEnd, SessionLimits, UserInput};
pub use crate::config::EdaConfig;
pub use crate::error::{EdaError, Result};
pub use crate::executor::{CodeExecutionResult, CommandExecutionResult, SandboxTools, ToolOutcome};
pub use crate::present::Presenter;
pub use crate::provider::ModelProvider;
pub use crate::sandbox::Sandbox;
pub use crate::tools::{EdaTool, ToolInvocation};
pub use crate::types::{AgentToolCall, ContentPart, GenerationSettings, ModelMessage, Role, Usage};
