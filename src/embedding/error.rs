use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider not available: {reason}")]
    NotAvailable { reason: String },

    #[error("embedding request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("invalid embedding response: {reason}")]
    InvalidResponse { reason: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding timed out after {millis}ms")]
    Timeout { millis: u64 },
}

impl From<reqwest::Error> for EmbeddingError {
    /// Drops the request URL so endpoint details never reach callers or logs.
    fn from(err: reqwest::Error) -> Self {
        EmbeddingError::RequestFailed {
            reason: err.without_url().to_string(),
        }
    }
}
