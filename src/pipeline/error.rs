use serde::Serialize;
use thiserror::Error;

use crate::classifier::ClassifyError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline not ready: {reason}")]
    NotReady { reason: String },

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error("all {attempted} classifications failed, last error: {last}")]
    AllFailed { attempted: usize, last: String },
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::NotReady { .. } => "not_ready",
            PipelineError::Classify(err) => err.kind(),
            PipelineError::AllFailed { .. } => "all_failed",
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

/// Serializable form of a pipeline failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub kind: String,
    pub message: String,
}

impl From<&PipelineError> for ErrorPayload {
    fn from(err: &PipelineError) -> Self {
        err.payload()
    }
}
