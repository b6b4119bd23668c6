//! Label sets, their embedding tables and attribute specs.
//!
//! - [`model`] holds the value types.
//! - [`registry`] owns the loaded, read-only snapshots shared by all classifications.
//! - [`loader`] reads and writes the JSON file formats.

pub mod error;
pub mod loader;
pub mod model;
pub mod registry;


pub use error::{LabelError, LabelResult};
pub use model::{AttributeSet, ClassDefinition, EmbeddingTable, LabelSet};
pub use registry::{LabelRegistry, LabelSetSummary, LoadedLabelSet, generate_embedding_table};
