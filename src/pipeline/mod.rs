//! Whole-note processing on top of the classification engine.
//!
//! - [`flat`] classifies the entire note once per category.
//! - [`enhanced`] splits the note into sections and classifies each section.
//!
//! Both embed each text once and reuse the vector across categories. A failing category
//! (or section) is recorded in the result's `errors` and does not abort the others.

pub mod datasets;
pub mod enhanced;
pub mod error;
pub mod flat;
pub mod safety;


use serde::Serialize;
use uuid::Uuid;

use crate::classifier::{ClassificationEngine, ClassifyError};
use crate::constants::DEFAULT_TOP_K;

pub use datasets::Category;
pub use enhanced::{
    DomainScore, EnhancedPipelineProcessor, EnhancedPipelineResult, EnhancedSummary, LabelSource,
    SafetyAlert, SafetyFinding, SectionResult, SectionType,
};
pub use error::{ErrorPayload, PipelineError};
pub use flat::{
    CategoryResult, ClassificationItem, KeyFinding, PipelineProcessor, PipelineResult,
    PipelineSummary,
};
pub use safety::{OverallSafety, SafetyStatus};

/// Per-note switches shared by both pipelines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub top_k: usize,
    pub use_reranking: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            use_reranking: false,
        }
    }
}

impl PipelineOptions {
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn reranking(mut self, enabled: bool) -> Self {
        self.use_reranking = enabled;
        self
    }
}

/// One isolated classification failure inside a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryFailure {
    pub category: Category,
    pub kind: String,
    pub message: String,
}

impl CategoryFailure {
    fn new(category: Category, err: &ClassifyError) -> Self {
        Self {
            category,
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Categories whose label set can currently be classified against.
fn ready_categories(engine: &ClassificationEngine) -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|c| engine.registry().is_ready(c.label_set_id()))
        .collect()
}

fn not_ready() -> PipelineError {
    PipelineError::NotReady {
        reason: format!(
            "none of the label sets {:?} has classes and embeddings loaded",
            Category::ALL.map(Category::label_set_id)
        ),
    }
}

/// Short random note id (first 8 hex digits of a v4 UUID).
fn new_note_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
