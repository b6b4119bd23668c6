use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::classifier::{ClassificationEngine, ClassificationResult, ClassifyError, ClassifyOptions};
use crate::constants::{
    ENHANCED_INPUT_PREVIEW_CHARS, PRIMARY_DOMAIN_LIMIT, SAFETY_TOP_K, SECTION_PREVIEW_CHARS,
    SECTION_SUMMARY_MIN_SCORE, TRUSTED_SECTION_CONFIDENCE, UNKNOWN_SECTION, preview,
};
use crate::segmenter::{NoteSection, SectionSplitter};

use super::datasets::Category;
use super::error::PipelineError;
use super::safety::{OverallSafety, SafetyStatus};
use super::{CategoryFailure, PipelineOptions, new_note_id, not_ready, ready_categories, unix_now};

/// Where a section's `classified_type` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    /// Segmenter keyword label, confident enough to keep.
    Keyword,
    /// Re-classified against the sections label set.
    Embedding,
    /// Keyword label kept with score 0 because re-classification was impossible.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainScore {
    pub name: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyFinding {
    pub status: SafetyStatus,
    pub finding: Option<String>,
    pub score: f32,
}

impl SafetyFinding {
    pub fn unknown() -> Self {
        Self {
            status: SafetyStatus::Unknown,
            finding: None,
            score: 0.0,
        }
    }

    fn from_classification(result: &ClassificationResult) -> Self {
        Self {
            status: SafetyStatus::from_label(result.predicted_name()),
            finding: Some(result.predicted_name().to_string()),
            score: result.top_score(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionResult {
    pub section_id: usize,
    pub detected_type: String,
    pub classified_type: String,
    pub classification_score: f32,
    pub label_source: LabelSource,
    #[serde(skip)]
    pub content: String,
    pub content_preview: String,
    pub start: usize,
    pub end: usize,
    pub domains: Vec<DomainScore>,
    pub safety: SafetyFinding,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<CategoryFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionType {
    #[serde(rename = "type")]
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyAlert {
    /// Keyword-detected type of the section the finding came from.
    pub section: String,
    pub finding: Option<String>,
    pub status: SafetyStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedSummary {
    pub total_sections: usize,
    pub section_types: Vec<SectionType>,
    pub primary_domains: Vec<DomainScore>,
    pub safety_alerts: Vec<SafetyAlert>,
    pub overall_status: OverallSafety,
    pub overall_safety: String,
}

impl EnhancedSummary {
    /// Aggregates per-section results into note-level findings.
    pub fn from_sections(sections: &[SectionResult]) -> Self {
        let section_types = sections
            .iter()
            .filter(|s| s.classified_type != UNKNOWN_SECTION)
            .filter(|s| s.classification_score > SECTION_SUMMARY_MIN_SCORE)
            .map(|s| SectionType {
                label: s.classified_type.clone(),
                score: s.classification_score,
            })
            .collect();

        // Best score per domain name, in first-seen order so equal scores stay stable.
        let mut primary_domains: Vec<DomainScore> = Vec::new();
        for domain in sections.iter().flat_map(|s| &s.domains) {
            match primary_domains.iter_mut().find(|d| d.name == domain.name) {
                Some(seen) if domain.score > seen.score => seen.score = domain.score,
                Some(_) => {}
                None => primary_domains.push(domain.clone()),
            }
        }
        primary_domains.sort_by(|a, b| b.score.total_cmp(&a.score));
        primary_domains.truncate(PRIMARY_DOMAIN_LIMIT);

        let safety_alerts: Vec<SafetyAlert> = sections
            .iter()
            .filter(|s| s.safety.status.is_alerting())
            .map(|s| SafetyAlert {
                section: s.detected_type.clone(),
                finding: s.safety.finding.clone(),
                status: s.safety.status,
            })
            .collect();

        let overall_status = OverallSafety::from_statuses(safety_alerts.iter().map(|a| a.status));

        Self {
            total_sections: sections.len(),
            section_types,
            primary_domains,
            safety_alerts,
            overall_status,
            overall_safety: overall_status.message().to_string(),
        }
    }
}

/// Result of classifying a note section by section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedPipelineResult {
    pub note_id: String,
    pub input_preview: String,
    pub processed_at: i64,
    pub processing_time_ms: f64,
    pub total_sections: usize,
    pub sections: Vec<SectionResult>,
    pub summary: EnhancedSummary,
}

struct SectionOutcome {
    result: SectionResult,
    succeeded: usize,
}

/// Splits a note into sections, then types, domain-tags and safety-screens each one.
pub struct EnhancedPipelineProcessor {
    engine: Arc<ClassificationEngine>,
    splitter: Arc<SectionSplitter>,
}

impl EnhancedPipelineProcessor {
    pub fn new(engine: Arc<ClassificationEngine>, splitter: Arc<SectionSplitter>) -> Self {
        Self { engine, splitter }
    }

    pub fn ready_categories(&self) -> Vec<Category> {
        ready_categories(&self.engine)
    }

    #[instrument(skip(self, text, options), fields(text_len = text.len(), top_k = options.top_k))]
    pub async fn process_note(
        &self,
        text: &str,
        options: &PipelineOptions,
    ) -> Result<EnhancedPipelineResult, PipelineError> {
        let started = Instant::now();
        let note_id = new_note_id();

        let categories = self.ready_categories();
        if categories.is_empty() {
            let err = not_ready();
            error!(note_id = %note_id, error = %err, "Enhanced pipeline failed");
            return Err(err);
        }

        let sections = self.splitter.split(text);
        info!(note_id = %note_id, sections = sections.len(), "Processing note by section");

        let outcomes = join_all(
            sections
                .iter()
                .enumerate()
                .map(|(index, section)| self.process_section(index, section, &categories, options)),
        )
        .await;

        let succeeded: usize = outcomes.iter().map(|o| o.succeeded).sum();
        let sections: Vec<SectionResult> = outcomes.into_iter().map(|o| o.result).collect();
        let failures: Vec<&CategoryFailure> = sections.iter().flat_map(|s| &s.errors).collect();

        if succeeded == 0 {
            if let Some(last) = failures.last() {
                let err = PipelineError::AllFailed {
                    attempted: failures.len(),
                    last: last.message.clone(),
                };
                error!(note_id = %note_id, error = %err, "Enhanced pipeline failed");
                return Err(err);
            }
        }

        let summary = EnhancedSummary::from_sections(&sections);
        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            note_id = %note_id,
            sections = sections.len(),
            overall = ?summary.overall_status,
            failures = failures.len(),
            elapsed_ms = processing_time_ms,
            "Note processed"
        );

        Ok(EnhancedPipelineResult {
            note_id,
            input_preview: preview(text, ENHANCED_INPUT_PREVIEW_CHARS),
            processed_at: unix_now(),
            processing_time_ms,
            total_sections: sections.len(),
            sections,
            summary,
        })
    }

    async fn process_section(
        &self,
        index: usize,
        section: &NoteSection,
        categories: &[Category],
        options: &PipelineOptions,
    ) -> SectionOutcome {
        let content = section.content.as_str();
        let trusted = section.confidence > TRUSTED_SECTION_CONFIDENCE;
        let needed: Vec<Category> = categories
            .iter()
            .copied()
            .filter(|&c| !(trusted && c == Category::Sections))
            .collect();

        let mut errors = Vec::new();
        let mut succeeded = 0;

        let vector = if needed.is_empty() {
            None
        } else {
            match self.engine.embed(content).await {
                Ok(vector) => Some(vector),
                Err(err) => {
                    warn!(section = index, error = %err, "Section embedding failed, skipping its classifications");
                    errors.extend(needed.iter().map(|&c| CategoryFailure::new(c, &err)));
                    None
                }
            }
        };

        let vector = vector.as_deref();
        let mut record = |category: Category, outcome: Option<Result<ClassificationResult, ClassifyError>>| {
            match outcome? {
                Ok(result) => {
                    succeeded += 1;
                    Some(result)
                }
                Err(err) => {
                    warn!(section = index, category = %category, error = %err, "Section classification failed");
                    errors.push(CategoryFailure::new(category, &err));
                    None
                }
            }
        };

        let (classified_type, classification_score, label_source) = if trusted {
            (section.label.clone(), section.confidence, LabelSource::Keyword)
        } else {
            let outcome = self
                .classify_in(content, vector, &needed, Category::Sections, 1, options)
                .await;
            match record(Category::Sections, outcome) {
                Some(result) => (
                    result.predicted_name().to_string(),
                    result.top_score(),
                    LabelSource::Embedding,
                ),
                None => (section.label.clone(), 0.0, LabelSource::Fallback),
            }
        };

        let outcome = self
            .classify_in(content, vector, &needed, Category::Domains, options.top_k, options)
            .await;
        let domains = record(Category::Domains, outcome)
            .map(|result| {
                result
                    .candidates()
                    .map(|c| DomainScore {
                        name: c.name.clone(),
                        score: c.effective_score,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let outcome = self
            .classify_in(content, vector, &needed, Category::Safety, SAFETY_TOP_K, options)
            .await;
        let safety = record(Category::Safety, outcome)
            .map(|result| SafetyFinding::from_classification(&result))
            .unwrap_or_else(SafetyFinding::unknown);

        debug!(
            section = index,
            detected = %section.label,
            classified = %classified_type,
            source = ?label_source,
            safety = %safety.status,
            "Section processed"
        );

        SectionOutcome {
            result: SectionResult {
                section_id: index,
                detected_type: section.label.clone(),
                classified_type,
                classification_score,
                label_source,
                content: section.content.clone(),
                content_preview: preview(content, SECTION_PREVIEW_CHARS),
                start: section.start,
                end: section.end,
                domains,
                safety,
                errors,
            },
            succeeded,
        }
    }

    /// Classifies `content` for `category`, or `None` when it has no vector or is not needed.
    async fn classify_in(
        &self,
        content: &str,
        vector: Option<&[f32]>,
        needed: &[Category],
        category: Category,
        top_k: usize,
        options: &PipelineOptions,
    ) -> Option<Result<ClassificationResult, ClassifyError>> {
        let vector = vector?;
        if !needed.contains(&category) {
            return None;
        }
        let opts = ClassifyOptions::default()
            .top_k(top_k)
            .reranking(options.use_reranking)
            .task(category.as_str());
        Some(
            self.engine
                .classify_vector(content, vector, category.label_set_id(), &opts)
                .await,
        )
    }
}
