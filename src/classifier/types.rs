use serde::Serialize;

use crate::constants::DEFAULT_TOP_K;
use crate::scoring::{AttributeValidation, Candidate, RerankStatus};

/// Per-call switches for [`ClassificationEngine::classify`](super::ClassificationEngine::classify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Number of candidates returned (at least 1).
    pub top_k: usize,
    pub use_reranking: bool,
    pub use_attribute_validation: bool,
    /// Hint forwarded to the reranker (e.g. the category name).
    pub task: Option<String>,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            use_reranking: false,
            use_attribute_validation: false,
            task: None,
        }
    }
}

impl ClassifyOptions {
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn reranking(mut self, enabled: bool) -> Self {
        self.use_reranking = enabled;
        self
    }

    pub fn attribute_validation(mut self, enabled: bool) -> Self {
        self.use_attribute_validation = enabled;
        self
    }

    pub fn task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }
}

/// Ranked outcome of classifying one text against one label set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub label_set_id: String,
    pub predicted: Candidate,
    pub alternatives: Vec<Candidate>,
    pub reranked: bool,
    pub rerank_status: RerankStatus,
    pub attribute_validated: bool,
    pub attribute_validation: Option<AttributeValidation>,
    pub processing_time_ms: f64,
}

impl ClassificationResult {
    pub fn predicted_name(&self) -> &str {
        &self.predicted.name
    }

    pub fn top_score(&self) -> f32 {
        self.predicted.effective_score
    }

    /// All candidates, best first.
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        std::iter::once(&self.predicted).chain(self.alternatives.iter())
    }
}
