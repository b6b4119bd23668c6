use serde_json::json;

use super::parse::{parse_rerank, parse_validation, strip_code_fence};
use super::prompts::{rerank_prompt, validation_prompt};
use super::*;

#[test]
fn test_strip_code_fence_variants() {
    assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
    assert_eq!(strip_code_fence("```json{\"a\":1}"), "{\"a\":1}");
}

#[test]
fn test_parse_rerank_sorts_and_clamps() {
    let raw = r#"```json
{"rankings": [
  {"class": "SI_Denied", "score": 0.4, "reasoning": "weak"},
  {"class": "SI_Present", "score": 1.3}
]}
```"#;

    let RerankResponse::Ranked(scores) = parse_rerank(raw) else {
        panic!("expected rankings");
    };
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0].name, "SI_Present");
    assert_eq!(scores[0].score, 1.0);
    assert_eq!(scores[0].reasoning, "");
    assert_eq!(scores[1].reasoning, "weak");
}

#[test]
fn test_parse_rerank_malformed() {
    assert!(matches!(
        parse_rerank("I think it's SI_Denied"),
        RerankResponse::Malformed { .. }
    ));
    assert!(matches!(
        parse_rerank(r#"{"rankings": [{"score": 0.5}]}"#),
        RerankResponse::Malformed { .. }
    ));
    assert!(matches!(
        parse_rerank(r#"{"other": []}"#),
        RerankResponse::Malformed { .. }
    ));
}

#[test]
fn test_parse_rerank_empty_rankings_is_not_malformed() {
    assert_eq!(
        parse_rerank(r#"{"rankings": []}"#),
        RerankResponse::Ranked(vec![])
    );
}

#[test]
fn test_parse_validation_defaults() {
    let ValidationResponse::Assessed(a) = parse_validation(r#"{"explanation": "fine"}"#) else {
        panic!("expected assessment");
    };
    assert!(a.is_valid);
    assert_eq!(a.score, None);
    assert!(a.conditions_met.is_empty());
    assert_eq!(a.explanation, "fine");

    let ValidationResponse::Assessed(a) = parse_validation(
        r#"```json
{"is_valid": false, "score": 0.25, "conditions_met": ["plan"], "conditions_not_met": ["intent"], "explanation": "no intent"}
```"#,
    ) else {
        panic!("expected assessment");
    };
    assert!(!a.is_valid);
    assert_eq!(a.score, Some(0.25));
    assert_eq!(a.conditions_met, vec!["plan"]);
    assert_eq!(a.conditions_not_met, vec!["intent"]);
}

#[test]
fn test_parse_validation_malformed() {
    assert!(matches!(
        parse_validation("not json"),
        ValidationResponse::Malformed { .. }
    ));
}

#[test]
fn test_rerank_prompt_lists_candidates_and_task() {
    let prompt = rerank_prompt(
        "Denies SI",
        &[
            RerankCandidate {
                name: "SI_Denied".to_string(),
                description: "denies suicidal ideation".to_string(),
                similarity: 0.8123,
            },
            RerankCandidate {
                name: "SI_Present".to_string(),
                description: "reports suicidal ideation".to_string(),
                similarity: 0.4,
            },
        ],
        Some("safety"),
    );
    assert!(prompt.contains("Task: safety."));
    assert!(prompt.contains("1. SI_Denied: denies suicidal ideation (similarity 0.81)"));
    assert!(prompt.contains("2. SI_Present"));
    assert!(prompt.contains("\"Denies SI\""));
    assert!(prompt.contains(r#"{"rankings": "#));
}

#[test]
fn test_validation_prompt_embeds_attribute_spec() {
    let prompt = validation_prompt("text", "SI_Present", &json!({"all_of": ["plan"]}));
    assert!(prompt.contains("\"SI_Present\""));
    assert!(prompt.contains("\"all_of\""));
}

#[tokio::test]
async fn test_noop_llm_is_unavailable() {
    let providers = LlmProviders::noop();
    assert!(!providers.reranker.is_available());
    assert!(!providers.validator.is_available());
    assert!(matches!(
        providers.reranker.rerank("t", &[], None).await,
        Err(LlmError::NotAvailable { .. })
    ));
    assert!(matches!(
        providers.validator.validate("t", "c", &json!({})).await,
        Err(LlmError::NotAvailable { .. })
    ));
}

#[test]
fn test_build_llm_follows_api_key() {
    let providers = build_llm(&Config::default());
    assert!(!providers.reranker.is_available());

    let providers = build_llm(&Config {
        gemini_api_key: Some("key".to_string()),
        ..Config::default()
    });
    assert!(providers.reranker.is_available());
    assert!(providers.validator.is_available());
}

#[tokio::test]
async fn test_mock_reranker_records_task() {
    let reranker = MockReranker::with_scores(&[("A", 0.9)]);
    let response = reranker.rerank("t", &[], Some("domains")).await.unwrap();
    assert!(matches!(response, RerankResponse::Ranked(ref s) if s.len() == 1));
    assert_eq!(reranker.calls(), 1);
    assert_eq!(reranker.last_task().as_deref(), Some("domains"));
}
