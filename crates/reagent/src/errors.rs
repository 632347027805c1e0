use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    /// Failure reported by a remote tool server, carried verbatim
    #[error("{0}")]
    ToolReported(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Whether the failure only affects a single tool call. Localized failures are
    /// reported back to the model; everything else ends the run.
    pub fn is_localized(&self) -> bool {
        matches!(
            self,
            AgentError::ToolNotFound(_)
                | AgentError::InvalidParameters(_)
                | AgentError::ExecutionError(_)
                | AgentError::ToolReported(_)
        )
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
