//! Sources of user messages.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use crossterm::style::Stylize;

use crate::error::{EdaError, Result};

/// Typed by the user to end a session.
pub const EXIT_COMMAND: &str = "quit()";

/// Whether `text` is the exit sentinel, ignoring case and surrounding whitespace.
pub fn is_exit_command(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Supplies user messages to the conversation loop.
#[async_trait]
pub trait UserInput: Send {
    /// The next message, or `None` once input is exhausted.
    async fn next_message(&mut self) -> Result<Option<String>>;
}

/// Reads one line per message from standard input.
#[derive(Debug, Clone)]
pub struct StdinInput {
    prompt: String,
}

impl StdinInput {
    pub fn new() -> Self {
        Self {
            prompt: ">>> User Message".to_string(),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserInput for StdinInput {
    async fn next_message(&mut self) -> Result<Option<String>> {
        let prompt = self.prompt.clone();
        let message = tokio::task::spawn_blocking(move || -> io::Result<Option<String>> {
            let mut stdout = io::stdout();
            write!(stdout, "\n{}: ", prompt.as_str().yellow().bold())?;
            stdout.flush()?;

            let mut line = String::new();
            let read = io::stdin().lock().read_line(&mut line)?;
            Ok(if read == 0 {
                None
            } else {
                Some(line.trim_end_matches(['\r', '\n']).to_string())
            })
        })
        .await
        .map_err(|e| EdaError::Io(io::Error::new(io::ErrorKind::Other, e)))??;
        Ok(message)
    }
}

/// Replays a fixed list of messages, then reports end of input.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    messages: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl UserInput for ScriptedInput {
    async fn next_message(&mut self) -> Result<Option<String>> {
        Ok(self.messages.pop_front())
    }
}
