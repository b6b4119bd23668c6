//! Accuracy evaluation of label sets against labelled example texts.
//!
//! Each case is classified by similarity alone and scored for top-1 and top-k
//! ([`EVALUATION_TOP_K`]) correctness.

pub mod cases;

#[cfg(test)]
mod tests;

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::classifier::{ClassificationEngine, ClassifyError, ClassifyOptions};
use crate::constants::{EVALUATION_PREVIEW_CHARS, EVALUATION_TOP_K, preview};

pub use cases::builtin_cases;

/// Outcome for one labelled text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub text: String,
    pub expected: String,
    pub predicted: String,
    pub confidence: f32,
    pub top1_correct: bool,
    pub top3_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub label_set_id: String,
    pub total: usize,
    pub top1_correct: usize,
    pub top3_correct: usize,
    pub top1_accuracy: f64,
    pub top3_accuracy: f64,
    pub results: Vec<CaseResult>,
}

impl EvaluationReport {
    fn from_results(label_set_id: &str, results: Vec<CaseResult>) -> Self {
        let total = results.len();
        let top1_correct = results.iter().filter(|r| r.top1_correct).count();
        let top3_correct = results.iter().filter(|r| r.top3_correct).count();
        Self {
            label_set_id: label_set_id.to_string(),
            total,
            top1_correct,
            top3_correct,
            top1_accuracy: ratio(top1_correct, total),
            top3_accuracy: ratio(top3_correct, total),
            results,
        }
    }

    /// Cases whose top prediction was wrong.
    pub fn incorrect(&self) -> impl Iterator<Item = &CaseResult> {
        self.results.iter().filter(|r| !r.top1_correct)
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Evaluation: {}", self.label_set_id)?;
        writeln!(f, "Total cases: {}", self.total)?;
        writeln!(
            f,
            "Top-1 accuracy: {:.1}% ({}/{})",
            self.top1_accuracy * 100.0,
            self.top1_correct,
            self.total
        )?;
        writeln!(
            f,
            "Top-{EVALUATION_TOP_K} accuracy: {:.1}% ({}/{})",
            self.top3_accuracy * 100.0,
            self.top3_correct,
            self.total
        )?;

        let incorrect: Vec<&CaseResult> = self.incorrect().collect();
        if !incorrect.is_empty() {
            writeln!(f, "Incorrect predictions ({}):", incorrect.len())?;
            for r in incorrect {
                writeln!(f, "  {}", r.text)?;
                writeln!(
                    f,
                    "    expected {}, got {} ({:.2})",
                    r.expected, r.predicted, r.confidence
                )?;
            }
        }
        Ok(())
    }
}

fn ratio(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

/// Classifies every `(text, expected_class)` case against `label_set_id`.
///
/// Any classification error aborts the run: a partial accuracy figure would be misleading.
#[instrument(skip(engine, cases), fields(cases = cases.len()))]
pub async fn evaluate(
    engine: &ClassificationEngine,
    label_set_id: &str,
    cases: &[(&str, &str)],
) -> Result<EvaluationReport, ClassifyError> {
    let options = ClassifyOptions::default().top_k(EVALUATION_TOP_K);
    let mut results = Vec::with_capacity(cases.len());

    for &(text, expected) in cases {
        let classified = engine.classify(text, label_set_id, &options).await?;
        let top3_correct = classified.candidates().any(|c| c.name == expected);
        let top1_correct = classified.predicted_name() == expected;
        if !top1_correct {
            debug!(expected, predicted = classified.predicted_name(), "Misclassified case");
        }

        results.push(CaseResult {
            text: preview(text, EVALUATION_PREVIEW_CHARS),
            expected: expected.to_string(),
            predicted: classified.predicted_name().to_string(),
            confidence: classified.top_score(),
            top1_correct,
            top3_correct,
        });
    }

    let report = EvaluationReport::from_results(label_set_id, results);
    info!(
        label_set = label_set_id,
        total = report.total,
        top1_accuracy = report.top1_accuracy,
        top3_accuracy = report.top3_accuracy,
        "Evaluation finished"
    );
    Ok(report)
}
