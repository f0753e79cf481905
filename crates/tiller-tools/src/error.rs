use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid parameters for {tool_name}: {message}")]
    InvalidParams { tool_name: String, message: String },

    #[error("{tool_name} failed: {message}")]
    Execution { tool_name: String, message: String },

    #[error("{0} was cancelled")]
    Cancelled(String),

    #[error("{0} timed out")]
    Timeout(String),

    #[error("could not persist output for {tool_name}: {message}")]
    OutputSpill { tool_name: String, message: String },

    #[error("Unexpected error: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn execution<T: Into<String>, M: Into<String>>(tool_name: T, message: M) -> Self {
        ToolError::Execution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_params<T: Into<String>, M: Into<String>>(tool_name: T, message: M) -> Self {
        ToolError::InvalidParams {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// True when the error means the operation was cut short by a signal,
    /// not that it failed.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ToolError::Cancelled(_))
    }
}
