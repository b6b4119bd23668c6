//! Label-set loading, embedding generation and composition from configuration.

mod common;

use std::sync::Arc;
use std::time::Duration;

use scribe::{
    ClassifyOptions, Config, LabelRegistry, MockReranker, MockValidator, PipelineOptions, Scribe,
    ScribeParts,
};

use common::{
    DENIAL_NOTE, DIM, DOMAINS, HarnessOptions, SAFETY, SECTIONS, harness, harness_unloaded,
    label_dirs, label_fixtures, mock_embedder, write_dataset,
};

fn config_for(dir: &tempfile::TempDir) -> Config {
    Config {
        datasets_dir: dir.path().join("datasets"),
        embeddings_dir: dir.path().join("embeddings"),
        gemini_api_key: None,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_reload_reports_summary() {
    let h = harness_unloaded(HarnessOptions::default());

    let summary = h.scribe.reload_label_set(SAFETY).await.unwrap();
    assert_eq!(summary.id, SAFETY);
    assert_eq!(summary.class_count, 5);
    assert_eq!(summary.embedding_dim, Some(DIM));
    assert!(!summary.attributes_loaded);
    assert!(h.scribe.registry().is_ready(SAFETY));
}

#[tokio::test]
async fn test_missing_embeddings_leave_set_not_ready() {
    let h = harness_unloaded(HarnessOptions {
        with_embeddings: false,
        ..HarnessOptions::default()
    });

    let summary = h.scribe.reload_label_set(DOMAINS).await.unwrap();
    assert_eq!(summary.embedding_dim, None);

    let err = h
        .scribe
        .classify(DENIAL_NOTE, DOMAINS, &ClassifyOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "embeddings_not_loaded");
    assert!(err.is_precondition());
}

#[tokio::test]
async fn test_missing_embeddings_are_generated_and_persisted() {
    let h = harness_unloaded(HarnessOptions {
        with_embeddings: false,
        generate_missing_embeddings: true,
        ..HarnessOptions::default()
    });

    let summary = h.scribe.reload_label_set(SECTIONS).await.unwrap();
    assert_eq!(summary.embedding_dim, Some(DIM));
    assert_eq!(h.embedder.calls(), 2, "one call per class description");

    let written = h
        .dir
        .path()
        .join("embeddings")
        .join(format!("{SECTIONS}_embeddings.json"));
    assert!(written.exists());

    // A second load reads the persisted table instead of embedding again.
    h.scribe.reload_label_set(SECTIONS).await.unwrap();
    assert_eq!(h.embedder.calls(), 2);
}

#[tokio::test]
async fn test_reload_swaps_snapshot() {
    let h = harness_unloaded(HarnessOptions::default());
    h.scribe.reload_label_set(SAFETY).await.unwrap();
    let before = h.scribe.registry().get(SAFETY).unwrap();

    h.scribe.reload_label_set(SAFETY).await.unwrap();
    let after = h.scribe.registry().get(SAFETY).unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before.label_set, after.label_set);
}

#[tokio::test]
async fn test_failed_regeneration_keeps_previous_snapshot() {
    let h = harness(HarnessOptions {
        generate_missing_embeddings: true,
        ..HarnessOptions::default()
    })
    .await;
    let before = h.scribe.registry().get(SAFETY).unwrap();

    std::fs::remove_file(
        h.dir
            .path()
            .join("embeddings")
            .join(format!("{SAFETY}_embeddings.json")),
    )
    .unwrap();
    h.embedder.set_failing(true);

    let err = h.scribe.reload_label_set(SAFETY).await.unwrap_err();
    assert!(format!("{err:#}").contains("failed to generate embeddings"));

    let after = h.scribe.registry().get(SAFETY).unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(h.scribe.registry().is_ready(SAFETY));

    h.embedder.set_failing(false);
    let result = h
        .scribe
        .classify(DENIAL_NOTE, SAFETY, &ClassifyOptions::default())
        .await
        .unwrap();
    assert!(result.predicted_name().contains("Denied"));
}

#[tokio::test]
async fn test_reload_without_storage_fails() {
    let scribe = Scribe::new(ScribeParts {
        registry: Arc::new(LabelRegistry::new()),
        embedder: mock_embedder(),
        reranker: Arc::new(MockReranker::failing("unused")),
        validator: Arc::new(MockValidator::failing("unused")),
        rerank_timeout: Duration::from_secs(1),
        validation_timeout: Duration::from_secs(1),
        embed_timeout: Duration::from_secs(1),
        default_top_k: 3,
    });

    let err = scribe.reload_label_set(SAFETY).await.unwrap_err();
    assert!(err.to_string().contains("no label storage"));
}

#[tokio::test]
async fn test_corrupt_dataset_file_is_reported() {
    let h = harness_unloaded(HarnessOptions::default());
    std::fs::write(
        h.dir.path().join("datasets").join(format!("{SAFETY}.json")),
        b"{ not json",
    )
    .unwrap();

    let err = h.scribe.reload_label_set(SAFETY).await.unwrap_err();
    assert!(format!("{err:#}").contains(SAFETY));
}

#[tokio::test]
async fn test_from_config_loads_configured_sets() {
    let dir = label_dirs(true);
    let scribe = Scribe::from_config(&config_for(&dir)).await.unwrap();

    let mut ids: Vec<String> = scribe.label_sets().into_iter().map(|s| s.id).collect();
    ids.sort();
    assert_eq!(ids, vec![DOMAINS, SAFETY, SECTIONS]);
    assert!(scribe.registry().is_ready(SAFETY));
    assert_eq!(scribe.pipeline_options().top_k, 3);
}

#[tokio::test]
async fn test_from_config_without_api_key_fails_closed() {
    let dir = label_dirs(true);
    let scribe = Scribe::from_config(&config_for(&dir)).await.unwrap();

    let err = scribe
        .classify(DENIAL_NOTE, SAFETY, &ClassifyOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "embedding_failed");

    let err = scribe
        .process_note(DENIAL_NOTE, &PipelineOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "embedding_failed");
}

#[tokio::test]
async fn test_from_config_skips_missing_dataset_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let fixtures = label_fixtures();
    let safety = fixtures.iter().find(|f| f.id == SAFETY).unwrap();
    write_dataset(&dir.path().join("datasets"), safety);

    let scribe = Scribe::from_config(&config_for(&dir)).await.unwrap();
    let summaries = scribe.label_sets();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, SAFETY);
    assert_eq!(summaries[0].embedding_dim, None);

    let err = scribe
        .process_note_enhanced(DENIAL_NOTE, &PipelineOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_ready");
}

#[tokio::test]
async fn test_from_config_rejects_missing_datasets_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = Scribe::from_config(&config_for(&dir)).await.unwrap_err();
    assert!(format!("{err:#}").contains("invalid configuration"));
}
