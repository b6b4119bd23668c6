use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("duplicate class '{name}' in label set '{label_set}'")]
    DuplicateClass { label_set: String, name: String },

    #[error("label set '{label_set}' has no classes")]
    EmptyLabelSet { label_set: String },

    #[error("no embedding for class '{class}' in label set '{label_set}'")]
    MissingEmbedding { label_set: String, class: String },

    #[error(
        "embedding for class '{class}' in label set '{label_set}' has dimension {actual}, expected {expected}"
    )]
    DimensionMismatch {
        label_set: String,
        class: String,
        expected: usize,
        actual: usize,
    },

    #[error("label set '{id}' is not loaded")]
    UnknownLabelSet { id: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to embed class descriptions for '{label_set}': {source}")]
    Embedding {
        label_set: String,
        #[source]
        source: EmbeddingError,
    },
}

pub type LabelResult<T> = Result<T, LabelError>;
