//! Shared fixtures: label-set files in a temp dir and a `Scribe` wired to mocks.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tempfile::TempDir;

use scribe::{LabelStorage, MockEmbedder, MockReranker, MockValidator, Scribe, ScribeParts};

pub const SECTIONS: &str = "psychiatry_sections";
pub const DOMAINS: &str = "psychiatry_domains";
pub const SAFETY: &str = "psychiatry_safety";

pub const DIM: usize = 5;

pub const DENIAL_NOTE: &str = "Denies suicidal ideation. No SI or HI.";
pub const ACTIVE_NOTE: &str = "Active suicidal ideation with plan.";
pub const PASSIVE_NOTE: &str = "Passive death wish, no intent.";
pub const MOOD_NOTE: &str = "Low mood and anhedonia for three weeks.";

// Axes: 0 denial, 1 active SI, 2 passive SI, 3 homicidal, 4 mood.
pub fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[i] = 1.0;
    v
}

pub struct LabelFixture {
    pub id: &'static str,
    pub classes: Vec<(&'static str, &'static str, Vec<f32>)>,
}

pub fn label_fixtures() -> Vec<LabelFixture> {
    vec![
        LabelFixture {
            id: SECTIONS,
            classes: vec![
                ("Chief Complaint", "Main reason for presentation", axis(4)),
                (
                    "Risk Assessment",
                    "Assessment of suicide and violence risk",
                    vec![1.0, 1.0, 1.0, 1.0, 0.0],
                ),
            ],
        },
        LabelFixture {
            id: DOMAINS,
            classes: vec![
                ("Depression", "Low mood, anhedonia, hopelessness", axis(4)),
                ("Suicidality", "Thoughts of self-harm or death", vec![0.0, 1.0, 1.0, 0.0, 0.0]),
                ("Aggression", "Hostility or violence toward others", axis(3)),
            ],
        },
        LabelFixture {
            id: SAFETY,
            classes: vec![
                ("SI_Denied", "Patient denies suicidal ideation", axis(0)),
                ("Active_SI_Present", "Active suicidal ideation", axis(1)),
                ("Passive_SI_Present", "Passive death wish", axis(2)),
                (
                    "HI_Denied",
                    "Patient denies homicidal ideation",
                    vec![0.7, 0.0, 0.0, 0.7, 0.0],
                ),
                ("HI_Present", "Homicidal ideation", axis(3)),
            ],
        },
    ]
}

pub fn write_json(path: &Path, value: &Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

pub fn write_dataset(dir: &Path, fixture: &LabelFixture) {
    let classes: Vec<Value> = fixture
        .classes
        .iter()
        .enumerate()
        .map(|(i, (name, description, _))| {
            json!({"id": format!("{}_{i}", fixture.id), "name": name, "description": description})
        })
        .collect();
    write_json(&dir.join(format!("{}.json", fixture.id)), &json!({ "classes": classes }));
}

pub fn write_embeddings(dir: &Path, fixture: &LabelFixture) {
    let embeddings: serde_json::Map<String, Value> = fixture
        .classes
        .iter()
        .map(|(name, _, vector)| (name.to_string(), json!(vector)))
        .collect();
    write_json(
        &dir.join(format!("{}_embeddings.json", fixture.id)),
        &json!({ "model_name": "mock-embedder", "embeddings": embeddings }),
    );
}

pub fn write_attributes(dir: &Path, id: &str, entries: &[(&str, Value)]) {
    let classes: Vec<Value> = entries
        .iter()
        .map(|(name, spec)| json!({"class_name": name, "required_attributes": spec}))
        .collect();
    write_json(&dir.join(format!("{id}_attributes.json")), &json!({ "classes": classes }));
}

/// Temp directory with `datasets/` and `embeddings/` populated for every fixture.
pub fn label_dirs(with_embeddings: bool) -> TempDir {
    let dir = TempDir::new().unwrap();
    for fixture in label_fixtures() {
        write_dataset(&dir.path().join("datasets"), &fixture);
        if with_embeddings {
            write_embeddings(&dir.path().join("embeddings"), &fixture);
        }
    }
    dir
}

pub fn storage(dir: &TempDir, generate_missing_embeddings: bool) -> LabelStorage {
    LabelStorage {
        datasets_dir: dir.path().join("datasets"),
        embeddings_dir: dir.path().join("embeddings"),
        generate_missing_embeddings,
    }
}

pub fn mock_embedder() -> Arc<MockEmbedder> {
    Arc::new(
        MockEmbedder::new(DIM)
            .with_vector(DENIAL_NOTE, vec![1.0, 0.0, 0.0, 0.1, 0.1])
            .with_vector(ACTIVE_NOTE, vec![0.0, 1.0, 0.2, 0.0, 0.0])
            .with_vector(PASSIVE_NOTE, axis(2))
            .with_vector(MOOD_NOTE, axis(4)),
    )
}

pub struct Harness {
    pub scribe: Scribe,
    pub embedder: Arc<MockEmbedder>,
    pub reranker: Arc<MockReranker>,
    pub validator: Arc<MockValidator>,
    pub dir: TempDir,
}

pub struct HarnessOptions {
    pub reranker: MockReranker,
    pub validator: MockValidator,
    pub rerank_timeout: Duration,
    pub with_embeddings: bool,
    pub generate_missing_embeddings: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            reranker: MockReranker::failing("reranker not scripted"),
            validator: MockValidator::failing("validator not scripted"),
            rerank_timeout: Duration::from_secs(2),
            with_embeddings: true,
            generate_missing_embeddings: false,
        }
    }
}

/// Builds a `Scribe` over mock capabilities without loading any label set.
pub fn harness_unloaded(options: HarnessOptions) -> Harness {
    let dir = label_dirs(options.with_embeddings);
    let embedder = mock_embedder();
    let reranker = Arc::new(options.reranker);
    let validator = Arc::new(options.validator);

    let scribe = Scribe::new(ScribeParts {
        registry: Arc::new(scribe::LabelRegistry::new()),
        embedder: embedder.clone(),
        reranker: reranker.clone(),
        validator: validator.clone(),
        rerank_timeout: options.rerank_timeout,
        validation_timeout: Duration::from_secs(2),
        embed_timeout: Duration::from_secs(2),
        default_top_k: 3,
    })
    .with_storage(storage(&dir, options.generate_missing_embeddings));

    Harness {
        scribe,
        embedder,
        reranker,
        validator,
        dir,
    }
}

/// Like [`harness_unloaded`], with all three label sets loaded.
pub async fn harness(options: HarnessOptions) -> Harness {
    let harness = harness_unloaded(options);
    for id in [SECTIONS, DOMAINS, SAFETY] {
        harness.scribe.reload_label_set(id).await.unwrap();
    }
    harness
}
