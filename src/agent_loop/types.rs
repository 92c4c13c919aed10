//! Limits and bookkeeping for the conversation loop.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MAX_CONSECUTIVE_TOOL_CALLS;
use crate::error::{EdaError, Result};
use crate::types::Usage;

/// Bounds on one user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLimits {
    max_consecutive_tool_calls: usize,
}

impl SessionLimits {
    /// `max_consecutive_tool_calls` is the number of model requests one user
    /// message may trigger; it must be positive.
    pub fn new(max_consecutive_tool_calls: usize) -> Result<Self> {
        if max_consecutive_tool_calls == 0 {
            return Err(EdaError::InvalidArgument(
                "max_consecutive_tool_calls must be positive".into(),
            ));
        }
        Ok(Self {
            max_consecutive_tool_calls,
        })
    }

    pub fn max_consecutive_tool_calls(&self) -> usize {
        self.max_consecutive_tool_calls
    }
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_consecutive_tool_calls: DEFAULT_MAX_CONSECUTIVE_TOOL_CALLS,
        }
    }
}

/// What happened during one user turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Chat requests issued, including the one that produced the answer.
    pub rounds: usize,
    pub tool_calls: usize,
    pub usage: Usage,
    pub answer: String,
}

/// Why an interactive session stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// The user typed the exit sentinel.
    UserExit,
    /// Input was closed.
    EndOfInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_is_rejected() {
        assert!(SessionLimits::new(0).is_err());
        assert_eq!(SessionLimits::new(3).unwrap().max_consecutive_tool_calls(), 3);
        assert_eq!(SessionLimits::default().max_consecutive_tool_calls(), 12);
    }
}
