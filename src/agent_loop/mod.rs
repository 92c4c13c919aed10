//! Conversation loop: user turns, bounded tool-call rounds, and the
//! system prompt.

pub mod conversation;
pub mod input;
pub mod prompt;
pub mod types;

pub use conversation::Conversation;
pub use input::{is_exit_command, ScriptedInput, StdinInput, UserInput, EXIT_COMMAND};
pub use prompt::{render_system_prompt, PromptContext};
pub use types::{SessionEnd, SessionLimits, TurnReport};
