use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("label set '{id}' is not loaded")]
    UnknownLabelSet { id: String },

    #[error("label set '{id}' has no embeddings loaded")]
    EmbeddingsNotLoaded { id: String },

    #[error("label set '{id}' has no classes")]
    EmptyLabelSet { id: String },

    #[error("query embedding has dimension {actual}, label set '{id}' expects {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed to embed input: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl ClassifyError {
    /// Stable machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifyError::UnknownLabelSet { .. } => "unknown_label_set",
            ClassifyError::EmbeddingsNotLoaded { .. } => "embeddings_not_loaded",
            ClassifyError::EmptyLabelSet { .. } => "empty_label_set",
            ClassifyError::DimensionMismatch { .. } => "dimension_mismatch",
            ClassifyError::Embedding(_) => "embedding_failed",
        }
    }

    /// `true` for setup problems (label set not loaded), as opposed to runtime failures.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, ClassifyError::Embedding(_))
    }
}
