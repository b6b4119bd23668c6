use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM provider not available: {reason}")]
    NotAvailable { reason: String },

    #[error("LLM request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("LLM returned no text")]
    EmptyResponse,

    #[error("LLM call timed out after {millis}ms")]
    Timeout { millis: u64 },
}

impl From<genai::Error> for LlmError {
    fn from(err: genai::Error) -> Self {
        LlmError::RequestFailed {
            reason: err.to_string(),
        }
    }
}
