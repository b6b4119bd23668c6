use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::*;
use crate::embedding::{Embedder, MockEmbedder};
use crate::labels::{ClassDefinition, LabelRegistry, LabelSet};
use crate::llm::{AttributeAssessment, MockReranker, MockValidator, NoopLlm};
use crate::scoring::{AttributeValidator, RerankFuser, RerankStatus, ValidationStatus};

const SAFETY: &str = "psychiatry_safety";

struct Fixture {
    engine: ClassificationEngine,
    embedder: Arc<MockEmbedder>,
    validator: Arc<MockValidator>,
}

fn registry() -> Arc<LabelRegistry> {
    let registry = Arc::new(LabelRegistry::new());
    let set = LabelSet::new(
        SAFETY,
        vec![
            ClassDefinition::new("SI_Denied", "Patient denies suicidal ideation"),
            ClassDefinition::new("SI_Present", "Patient reports suicidal ideation"),
            ClassDefinition::new("HI_Denied", "Patient denies homicidal ideation"),
            ClassDefinition::new("HI_Present", "Patient reports homicidal ideation"),
        ],
    )
    .unwrap();
    registry.load_label_set(set);

    let vectors: HashMap<String, Vec<f32>> = [
        ("SI_Denied", vec![1.0, 0.0, 0.0, 0.0]),
        ("SI_Present", vec![0.0, 1.0, 0.0, 0.0]),
        ("HI_Denied", vec![0.7, 0.0, 0.7, 0.0]),
        ("HI_Present", vec![0.0, 0.0, 0.0, 1.0]),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    registry.attach_embeddings(SAFETY, vectors, None).unwrap();
    registry
}

fn fixture(reranker: MockReranker, validator: MockValidator) -> Fixture {
    let embedder = Arc::new(
        MockEmbedder::new(4)
            .with_vector("Denies suicidal ideation. No SI or HI.", vec![0.9, 0.1, 0.2, 0.0])
            .with_vector("Active suicidal ideation with plan.", vec![0.1, 0.95, 0.0, 0.1]),
    );
    let validator = Arc::new(validator);
    let engine = ClassificationEngine::new(EngineParts {
        registry: registry(),
        embedder: embedder.clone(),
        fuser: Arc::new(RerankFuser::new(Arc::new(reranker), Duration::from_secs(1))),
        validator: Arc::new(AttributeValidator::new(
            validator.clone(),
            Duration::from_secs(1),
        )),
        embed_timeout: Duration::from_secs(1),
    });
    Fixture {
        engine,
        embedder,
        validator,
    }
}

fn plain() -> Fixture {
    fixture(
        MockReranker::failing("not used"),
        MockValidator::failing("not used"),
    )
}

fn no_rerank() -> ClassifyOptions {
    ClassifyOptions::default()
}

#[test]
fn test_reranking_is_opt_in() {
    assert!(!ClassifyOptions::default().use_reranking);
    assert!(!crate::pipeline::PipelineOptions::default().use_reranking);
}

#[tokio::test]
async fn test_denial_predicts_denied_class() {
    let f = plain();
    let result = f
        .engine
        .classify("Denies suicidal ideation. No SI or HI.", SAFETY, &no_rerank())
        .await
        .unwrap();

    assert!(result.predicted_name().contains("Denied"));
    assert_eq!(result.label_set_id, SAFETY);
    assert_eq!(result.alternatives.len(), 2);
    assert!(!result.reranked);
    assert_eq!(result.rerank_status, RerankStatus::NotRequested);
    assert!(!result.attribute_validated);
    assert!(result.processing_time_ms >= 0.0);

    let scores: Vec<f32> = result.candidates().map(|c| c.effective_score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_active_ideation_predicts_present_class() {
    let f = plain();
    let result = f
        .engine
        .classify("Active suicidal ideation with plan.", SAFETY, &no_rerank())
        .await
        .unwrap();
    assert_eq!(result.predicted_name(), "SI_Present");
}

#[tokio::test]
async fn test_top_k_is_clamped() {
    let f = plain();
    let text = "Denies suicidal ideation. No SI or HI.";

    let one = f
        .engine
        .classify(text, SAFETY, &no_rerank().top_k(0))
        .await
        .unwrap();
    assert!(one.alternatives.is_empty());

    let all = f
        .engine
        .classify(text, SAFETY, &no_rerank().top_k(50))
        .await
        .unwrap();
    assert_eq!(all.alternatives.len(), 3);
}

#[tokio::test]
async fn test_reranking_can_change_prediction() {
    let f = fixture(
        MockReranker::with_scores(&[
            ("SI_Present", 0.95),
            ("SI_Denied", 0.05),
            ("HI_Denied", 0.1),
        ]),
        MockValidator::failing("not used"),
    );
    let result = f
        .engine
        .classify(
            "Denies suicidal ideation. No SI or HI.",
            SAFETY,
            &ClassifyOptions::default().reranking(true).task("safety"),
        )
        .await
        .unwrap();

    assert!(result.reranked);
    assert_eq!(result.rerank_status, RerankStatus::Applied);
    assert_eq!(result.predicted_name(), "SI_Present");
    assert_eq!(result.predicted.rerank_score, Some(0.95));
}

#[tokio::test]
async fn test_reranker_failure_keeps_similarity_result() {
    let f = plain();
    let result = f
        .engine
        .classify(
            "Denies suicidal ideation. No SI or HI.",
            SAFETY,
            &ClassifyOptions::default().reranking(true),
        )
        .await
        .unwrap();

    assert!(!result.reranked);
    assert_eq!(result.rerank_status, RerankStatus::Failed);
    for c in result.candidates() {
        assert_eq!(c.effective_score, c.similarity_score);
    }
}

#[tokio::test]
async fn test_attribute_validation_requires_loaded_attributes() {
    let f = fixture(
        MockReranker::failing("not used"),
        MockValidator::failing("not used"),
    );
    let result = f
        .engine
        .classify(
            "Active suicidal ideation with plan.",
            SAFETY,
            &no_rerank().attribute_validation(true),
        )
        .await
        .unwrap();

    assert!(!result.attribute_validated);
    assert!(result.attribute_validation.is_none());
    assert_eq!(result.predicted.attribute_score, None);
}

#[tokio::test]
async fn test_attribute_validation_scores_only_top_candidate() {
    let f = fixture(
        MockReranker::failing("not used"),
        MockValidator::assessing(AttributeAssessment {
            is_valid: true,
            score: Some(0.8),
            conditions_met: vec!["plan".to_string()],
            conditions_not_met: vec![],
            explanation: "plan documented".to_string(),
        }),
    );
    f.engine
        .registry()
        .attach_attributes(
            SAFETY,
            vec![("SI_Present".to_string(), json!({"all_of": ["plan"]}))],
        )
        .unwrap();

    let result = f
        .engine
        .classify(
            "Active suicidal ideation with plan.",
            SAFETY,
            &no_rerank().attribute_validation(true),
        )
        .await
        .unwrap();

    assert!(result.attribute_validated);
    let validation = result.attribute_validation.as_ref().unwrap();
    assert_eq!(validation.status, ValidationStatus::Evaluated);
    assert_eq!(result.predicted.attribute_score, Some(0.8));
    assert_eq!(result.predicted.effective_score, result.predicted.similarity_score);
    assert!(result.alternatives.iter().all(|c| c.attribute_score.is_none()));
    assert_eq!(f.validator.calls(), 1);
}

#[tokio::test]
async fn test_attribute_validation_trivial_for_class_without_entry() {
    let f = plain();
    f.engine
        .registry()
        .attach_attributes(
            SAFETY,
            vec![("HI_Present".to_string(), json!({"any_of": ["target"]}))],
        )
        .unwrap();

    let result = f
        .engine
        .classify(
            "Denies suicidal ideation. No SI or HI.",
            SAFETY,
            &no_rerank().attribute_validation(true),
        )
        .await
        .unwrap();

    let validation = result.attribute_validation.unwrap();
    assert_eq!(validation.status, ValidationStatus::NoAttributes);
    assert_eq!(validation.score, 1.0);
    assert!(validation.conditions_met.is_empty());
    assert!(validation.conditions_not_met.is_empty());
    assert_eq!(f.validator.calls(), 0);
}

#[tokio::test]
async fn test_unknown_and_unready_label_sets_are_precondition_errors() {
    let f = plain();

    let err = f
        .engine
        .classify("text", "nope", &no_rerank())
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifyError::UnknownLabelSet { .. }));
    assert_eq!(err.kind(), "unknown_label_set");
    assert!(err.is_precondition());

    f.engine.registry().load_label_set(
        LabelSet::new("bare", vec![ClassDefinition::new("A", "a")]).unwrap(),
    );
    let err = f
        .engine
        .classify("text", "bare", &no_rerank())
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifyError::EmbeddingsNotLoaded { .. }));
    assert_eq!(f.embedder.calls(), 0, "precondition checked before embedding");
}

#[tokio::test]
async fn test_embedding_failure_is_surfaced() {
    let f = plain();
    f.embedder.set_failing(true);
    let err = f
        .engine
        .classify("text", SAFETY, &no_rerank())
        .await
        .unwrap_err();
    assert!(matches!(err, ClassifyError::Embedding(_)));
    assert_eq!(err.kind(), "embedding_failed");
    assert!(!err.is_precondition());
}

#[tokio::test]
async fn test_dimension_mismatch_is_reported() {
    let f = plain();
    let err = f
        .engine
        .classify_vector("text", &[1.0, 0.0], SAFETY, &no_rerank())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClassifyError::DimensionMismatch {
            expected: 4,
            actual: 2,
            ..
        }
    ));
}

#[tokio::test]
async fn test_classify_vector_skips_embedding() {
    let f = plain();
    let result = f
        .engine
        .classify_vector("anything", &[0.0, 0.0, 0.0, 1.0], SAFETY, &no_rerank())
        .await
        .unwrap();
    assert_eq!(result.predicted_name(), "HI_Present");
    assert_eq!(f.embedder.calls(), 0);
}

#[tokio::test]
async fn test_unavailable_llm_degrades_both_stages() {
    let registry = registry();
    registry
        .attach_attributes(
            SAFETY,
            vec![("SI_Denied".to_string(), json!({"all_of": ["explicit denial"]}))],
        )
        .unwrap();
    let engine = ClassificationEngine::new(EngineParts {
        registry,
        embedder: Arc::new(MockEmbedder::new(4)),
        fuser: Arc::new(RerankFuser::new(Arc::new(NoopLlm), Duration::from_secs(1))),
        validator: Arc::new(AttributeValidator::new(
            Arc::new(NoopLlm),
            Duration::from_secs(1),
        )),
        embed_timeout: Duration::from_secs(1),
    });

    let result = engine
        .classify_vector(
            "denies",
            &[1.0, 0.0, 0.0, 0.0],
            SAFETY,
            &ClassifyOptions::default()
                .reranking(true)
                .attribute_validation(true),
        )
        .await
        .unwrap();

    assert_eq!(result.rerank_status, RerankStatus::Unavailable);
    let validation = result.attribute_validation.unwrap();
    assert_eq!(validation.status, ValidationStatus::FailedOpen);
    assert_eq!(result.predicted.attribute_score, Some(1.0));
    assert!(engine.embedder().is_available());
}
