use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::classifier::{ClassificationEngine, ClassificationResult, ClassifyOptions};
use crate::constants::{FLAT_INPUT_PREVIEW_CHARS, KEY_FINDING_MIN_SCORE, preview};
use crate::scoring::{Candidate, RerankStatus};

use super::datasets::Category;
use super::error::PipelineError;
use super::safety::{SafetyStatus, flat_safety_message};
use super::{CategoryFailure, PipelineOptions, new_note_id, not_ready, ready_categories, unix_now};

/// One scored class as reported by the pipelines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationItem {
    pub name: String,
    pub description: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl From<&Candidate> for ClassificationItem {
    fn from(c: &Candidate) -> Self {
        Self {
            name: c.name.clone(),
            description: c.description.clone(),
            score: c.effective_score,
            reasoning: c.reasoning.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResult {
    pub category: Category,
    pub dataset_id: String,
    pub dataset_name: String,
    pub top_result: ClassificationItem,
    pub alternatives: Vec<ClassificationItem>,
    pub reranked: bool,
    pub rerank_status: RerankStatus,
    pub processing_time_ms: f64,
}

impl CategoryResult {
    fn from_classification(category: Category, result: &ClassificationResult) -> Self {
        Self {
            category,
            dataset_id: result.label_set_id.clone(),
            dataset_name: category.display_name().to_string(),
            top_result: ClassificationItem::from(&result.predicted),
            alternatives: result
                .alternatives
                .iter()
                .map(ClassificationItem::from)
                .collect(),
            reranked: result.reranked,
            rerank_status: result.rerank_status,
            processing_time_ms: result.processing_time_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyFinding {
    pub category: Category,
    pub finding: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub primary_section: Option<String>,
    pub primary_domain: Option<String>,
    pub safety_status: Option<SafetyStatus>,
    pub safety_message: Option<String>,
    pub key_findings: Vec<KeyFinding>,
}

impl PipelineSummary {
    fn from_results(results: &BTreeMap<Category, CategoryResult>) -> Self {
        let top = |category: Category| results.get(&category).map(|r| r.top_result.name.clone());
        let safety_label = top(Category::Safety);

        Self {
            primary_section: top(Category::Sections),
            primary_domain: top(Category::Domains),
            safety_status: safety_label.as_deref().map(SafetyStatus::from_label),
            safety_message: safety_label.as_deref().map(flat_safety_message),
            key_findings: results
                .values()
                .filter(|r| r.top_result.score > KEY_FINDING_MIN_SCORE)
                .map(|r| KeyFinding {
                    category: r.category,
                    finding: r.top_result.name.clone(),
                    confidence: r.top_result.score,
                })
                .collect(),
        }
    }
}

/// Result of classifying a whole note once per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub note_id: String,
    pub input_preview: String,
    pub processed_at: i64,
    pub processing_time_ms: f64,
    pub results: BTreeMap<Category, CategoryResult>,
    pub summary: PipelineSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<CategoryFailure>,
}

/// Runs every ready category's label set on the full note text.
pub struct PipelineProcessor {
    engine: Arc<ClassificationEngine>,
}

impl PipelineProcessor {
    pub fn new(engine: Arc<ClassificationEngine>) -> Self {
        Self { engine }
    }

    /// Categories that would run right now.
    pub fn ready_categories(&self) -> Vec<Category> {
        ready_categories(&self.engine)
    }

    #[instrument(skip(self, text, options), fields(text_len = text.len(), top_k = options.top_k))]
    pub async fn process_note(
        &self,
        text: &str,
        options: &PipelineOptions,
    ) -> Result<PipelineResult, PipelineError> {
        let started = Instant::now();
        let note_id = new_note_id();

        let categories = self.ready_categories();
        for skipped in Category::ALL.iter().filter(|c| !categories.contains(c)) {
            warn!(category = %skipped, label_set = skipped.label_set_id(), "Skipping unloaded label set");
        }
        if categories.is_empty() {
            let err = not_ready();
            error!(note_id = %note_id, error = %err, "Pipeline failed");
            return Err(err);
        }

        info!(note_id = %note_id, chars = text.chars().count(), "Processing note");

        let vector = self.engine.embed(text).await.map_err(|err| {
            error!(note_id = %note_id, error = %err, "Note embedding failed");
            PipelineError::from(err)
        })?;

        let runs = categories.iter().map(|&category| {
            let opts = ClassifyOptions::default()
                .top_k(options.top_k)
                .reranking(options.use_reranking)
                .task(category.as_str());
            let vector = &vector;
            async move {
                let outcome = self
                    .engine
                    .classify_vector(text, vector, category.label_set_id(), &opts)
                    .await;
                (category, outcome)
            }
        });

        let mut results = BTreeMap::new();
        let mut errors = Vec::new();
        for (category, outcome) in join_all(runs).await {
            match outcome {
                Ok(result) => {
                    info!(
                        note_id = %note_id,
                        category = %category,
                        predicted = result.predicted_name(),
                        score = result.top_score(),
                        "Category classified"
                    );
                    results.insert(category, CategoryResult::from_classification(category, &result));
                }
                Err(err) => {
                    error!(note_id = %note_id, category = %category, error = %err, "Category classification failed");
                    errors.push(CategoryFailure::new(category, &err));
                }
            }
        }

        if results.is_empty() {
            let last = errors.last().map(|e| e.message.clone()).unwrap_or_default();
            return Err(PipelineError::AllFailed {
                attempted: errors.len(),
                last,
            });
        }

        let summary = PipelineSummary::from_results(&results);
        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(note_id = %note_id, elapsed_ms = processing_time_ms, failures = errors.len(), "Note processed");

        Ok(PipelineResult {
            note_id,
            input_preview: preview(text, FLAT_INPUT_PREVIEW_CHARS),
            processed_at: unix_now(),
            processing_time_ms,
            results,
            summary,
            errors,
        })
    }
}
