//! Single-text, single-label-set classification.

pub mod engine;
pub mod error;
pub mod types;

#[cfg(test)]
mod tests;

pub use engine::{ClassificationEngine, EngineParts};
pub use error::ClassifyError;
pub use types::{ClassificationResult, ClassifyOptions};
