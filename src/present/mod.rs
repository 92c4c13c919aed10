//! Terminal presentation of the session.

pub mod image_grid;
pub mod layout;
pub mod terminal;

use crate::error::EdaError;
use crate::executor::{CodeExecutionResult, CommandExecutionResult};

pub use terminal::TerminalPresenter;

/// Receives everything the session shows to the user.
///
/// Implementations must not fail; rendering problems are theirs to log.
pub trait Presenter: Send {
    fn session_started(&mut self);
    fn code_submitted(&mut self, code: &str);
    fn command_submitted(&mut self, command: &str);
    fn code_result(&mut self, result: &CodeExecutionResult);
    fn command_result(&mut self, result: &CommandExecutionResult);
    fn assistant_response(&mut self, text: &str);
    fn error(&mut self, error: &EdaError);
    fn info(&mut self, message: &str);
}
