use gstar_core::GstarError;
use thiserror::Error;

/// Failures raised while talking to a model endpoint.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AgentError {
    /// The endpoint answered with an error status, or the request never
    /// got an answer (`status_code` is `None`).
    #[error("{message}")]
    ProcessError {
        status_code: Option<u16>,
        message: String,
    },

    #[error("Agent execution failed: {0}")]
    ExecutionFailed(String),

    /// The reply arrived but did not have the expected shape.
    #[error("Failed to parse model output: {0}")]
    Parse(String),
}

impl AgentError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::ProcessError {
                status_code: Some(401 | 403),
                ..
            }
        )
    }
}

impl From<AgentError> for GstarError {
    fn from(err: AgentError) -> Self {
        GstarError::upstream(err.to_string())
    }
}
