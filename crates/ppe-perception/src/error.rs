//! Perception client error types.

use thiserror::Error;

pub type PerceptionResult<T> = Result<T, PerceptionError>;

#[derive(Debug, Error)]
pub enum PerceptionError {
    #[error("Perception service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PerceptionError {
    /// The service answered, but the payload could not be understood.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            PerceptionError::InvalidResponse(_) | PerceptionError::Json(_)
        )
    }

    /// The call may succeed on the next attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PerceptionError::ServiceUnavailable(_) | PerceptionError::Network(_)
        )
    }
}
