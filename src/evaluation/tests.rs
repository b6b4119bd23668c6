use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::classifier::EngineParts;
use crate::embedding::MockEmbedder;
use crate::labels::{ClassDefinition, LabelRegistry, LabelSet};
use crate::llm::NoopLlm;
use crate::pipeline::Category;
use crate::scoring::{AttributeValidator, RerankFuser};

const SAFETY: &str = "psychiatry_safety";

fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; 4];
    v[i] = 1.0;
    v
}

fn engine(embedder: MockEmbedder) -> ClassificationEngine {
    let registry = Arc::new(LabelRegistry::new());
    let classes = [
        ("SI_Denied", axis(0)),
        ("SI_Present", axis(1)),
        ("HI_Denied", axis(2)),
        ("HI_Present", axis(3)),
    ];
    let set = LabelSet::new(
        SAFETY,
        classes
            .iter()
            .map(|(name, _)| ClassDefinition::new(*name, format!("{name} description")))
            .collect(),
    )
    .unwrap();
    registry.load_label_set(set);
    let vectors: HashMap<String, Vec<f32>> = classes
        .iter()
        .map(|(name, v)| (name.to_string(), v.clone()))
        .collect();
    registry.attach_embeddings(SAFETY, vectors, None).unwrap();

    ClassificationEngine::new(EngineParts {
        registry,
        embedder: Arc::new(embedder),
        fuser: Arc::new(RerankFuser::new(Arc::new(NoopLlm), Duration::from_secs(1))),
        validator: Arc::new(AttributeValidator::new(Arc::new(NoopLlm), Duration::from_secs(1))),
        embed_timeout: Duration::from_secs(1),
    })
}

const CASES: &[(&str, &str)] = &[
    ("Denies suicidal ideation.", "SI_Denied"),
    ("Active suicidal ideation with plan.", "SI_Present"),
    ("Denies homicidal ideation.", "HI_Denied"),
    ("Homicidal ideation toward ex-partner.", "HI_Present"),
];

fn scripted_embedder() -> MockEmbedder {
    MockEmbedder::new(4)
        .with_vector(CASES[0].0, axis(0))
        .with_vector(CASES[1].0, axis(1))
        // Closest to SI_Denied, HI_Denied second.
        .with_vector(CASES[2].0, vec![0.9, 0.0, 0.5, 0.0])
        // HI_Present falls outside the top 3 (zero-score ties keep class order).
        .with_vector(CASES[3].0, axis(0))
}

#[tokio::test]
async fn test_evaluate_counts_top1_and_top3_hits() {
    let engine = engine(scripted_embedder());

    let report = evaluate(&engine, SAFETY, CASES).await.unwrap();

    assert_eq!(report.label_set_id, SAFETY);
    assert_eq!(report.total, 4);
    assert_eq!(report.top1_correct, 2);
    assert_eq!(report.top3_correct, 3);
    assert_eq!(report.top1_accuracy, 0.5);
    assert_eq!(report.top3_accuracy, 0.75);

    let missed: Vec<(&str, &str)> = report
        .incorrect()
        .map(|r| (r.expected.as_str(), r.predicted.as_str()))
        .collect();
    assert_eq!(
        missed,
        vec![("HI_Denied", "SI_Denied"), ("HI_Present", "SI_Denied")]
    );
    assert!(report.results[2].top3_correct);
    assert!(!report.results[3].top3_correct);
}

#[tokio::test]
async fn test_report_renders_accuracy_and_misses() {
    let engine = engine(scripted_embedder());
    let report = evaluate(&engine, SAFETY, CASES).await.unwrap();

    let text = report.to_string();
    assert!(text.contains("Top-1 accuracy: 50.0% (2/4)"));
    assert!(text.contains("Top-3 accuracy: 75.0% (3/4)"));
    assert!(text.contains("Incorrect predictions (2):"));
    assert!(text.contains("expected HI_Present, got SI_Denied"));
}

#[tokio::test]
async fn test_case_text_is_previewed() {
    let long = "Patient describes persistent thoughts of death with no plan or intent today.";
    let engine = engine(MockEmbedder::new(4).with_vector(long, axis(0)));

    let report = evaluate(&engine, SAFETY, &[(long, "SI_Denied")]).await.unwrap();

    let text = &report.results[0].text;
    assert!(text.ends_with("..."));
    assert_eq!(text.chars().count(), EVALUATION_PREVIEW_CHARS + 3);
}

#[tokio::test]
async fn test_empty_case_list_reports_zero_accuracy() {
    let engine = engine(MockEmbedder::new(4));
    let report = evaluate(&engine, SAFETY, &[]).await.unwrap();
    assert_eq!(report.total, 0);
    assert_eq!(report.top1_accuracy, 0.0);
    assert!(report.incorrect().next().is_none());
}

#[tokio::test]
async fn test_unknown_label_set_aborts() {
    let engine = engine(MockEmbedder::new(4));
    let err = evaluate(&engine, "psychiatry_missing", CASES)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unknown_label_set");
}

#[tokio::test]
async fn test_embedding_failure_aborts() {
    let embedder = MockEmbedder::new(4);
    embedder.set_failing(true);
    let engine = engine(embedder);

    let err = evaluate(&engine, SAFETY, CASES).await.unwrap_err();
    assert_eq!(err.kind(), "embedding_failed");
}

#[test]
fn test_builtin_cases_cover_every_category() {
    assert_eq!(builtin_cases(Category::Sections).len(), 20);
    assert_eq!(builtin_cases(Category::Domains).len(), 30);
    assert_eq!(builtin_cases(Category::Safety).len(), 16);
    assert!(
        builtin_cases(Category::Safety)
            .iter()
            .any(|(_, expected)| *expected == "SelfHarm_Present")
    );
}
