//! Composition root: builds every component once and hands out shared references.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use tracing::{info, warn};

use crate::classifier::{
    ClassificationEngine, ClassificationResult, ClassifyError, ClassifyOptions, EngineParts,
};
use crate::config::Config;
use crate::embedding::{Embedder, build_embedder};
use crate::evaluation::{EvaluationReport, evaluate};
use crate::labels::loader::{dataset_path, embeddings_path, load_from_dirs, save_embedding_table};
use crate::labels::{
    EmbeddingTable, LabelRegistry, LabelSet, LabelSetSummary, generate_embedding_table,
};
use crate::llm::{RerankProvider, ValidationProvider, build_llm};
use crate::pipeline::{
    EnhancedPipelineProcessor, EnhancedPipelineResult, PipelineError, PipelineOptions,
    PipelineProcessor, PipelineResult,
};
use crate::scoring::{AttributeValidator, RerankFuser};
use crate::segmenter::{NoteSection, SectionSplitter, SplitSummary};

/// Capabilities and settings [`Scribe::new`] wires together.
#[derive(Clone)]
pub struct ScribeParts {
    pub registry: Arc<LabelRegistry>,
    pub embedder: Arc<dyn Embedder>,
    pub reranker: Arc<dyn RerankProvider>,
    pub validator: Arc<dyn ValidationProvider>,
    pub rerank_timeout: Duration,
    pub validation_timeout: Duration,
    pub embed_timeout: Duration,
    pub default_top_k: usize,
}

impl ScribeParts {
    /// Real capabilities selected from `config`, with an empty registry.
    pub fn from_config(config: &Config) -> Self {
        let llm = build_llm(config);
        Self {
            registry: Arc::new(LabelRegistry::new()),
            embedder: build_embedder(config),
            reranker: llm.reranker,
            validator: llm.validator,
            rerank_timeout: config.rerank_timeout,
            validation_timeout: config.validation_timeout,
            embed_timeout: config.embed_timeout,
            default_top_k: config.default_top_k,
        }
    }
}

/// Where label-set files are read from (and generated embeddings written to).
#[derive(Debug, Clone)]
pub struct LabelStorage {
    pub datasets_dir: PathBuf,
    pub embeddings_dir: PathBuf,
    pub generate_missing_embeddings: bool,
}

impl LabelStorage {
    pub fn from_config(config: &Config) -> Self {
        Self {
            datasets_dir: config.datasets_dir.clone(),
            embeddings_dir: config.embeddings_dir.clone(),
            generate_missing_embeddings: config.generate_missing_embeddings,
        }
    }
}

pub struct Scribe {
    registry: Arc<LabelRegistry>,
    engine: Arc<ClassificationEngine>,
    splitter: Arc<SectionSplitter>,
    pipeline: PipelineProcessor,
    enhanced: EnhancedPipelineProcessor,
    storage: Option<LabelStorage>,
    default_top_k: usize,
}

impl std::fmt::Debug for Scribe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scribe")
            .field("engine", &self.engine)
            .field("storage", &self.storage)
            .field("default_top_k", &self.default_top_k)
            .finish()
    }
}

impl Scribe {
    pub fn new(parts: ScribeParts) -> Self {
        let engine = Arc::new(ClassificationEngine::new(EngineParts {
            registry: parts.registry.clone(),
            embedder: parts.embedder,
            fuser: Arc::new(RerankFuser::new(parts.reranker, parts.rerank_timeout)),
            validator: Arc::new(AttributeValidator::new(
                parts.validator,
                parts.validation_timeout,
            )),
            embed_timeout: parts.embed_timeout,
        }));
        let splitter = Arc::new(SectionSplitter::new());

        Self {
            registry: parts.registry,
            pipeline: PipelineProcessor::new(engine.clone()),
            enhanced: EnhancedPipelineProcessor::new(engine.clone(), splitter.clone()),
            engine,
            splitter,
            storage: None,
            default_top_k: parts.default_top_k,
        }
    }

    /// Enables [`reload_label_set`](Self::reload_label_set) from `storage`.
    pub fn with_storage(mut self, storage: LabelStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Builds real capabilities from `config` and loads every configured label set.
    ///
    /// Label sets without a dataset file are skipped with a warning; unreadable or
    /// inconsistent files are errors.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate().context("invalid configuration")?;

        let scribe = Self::new(ScribeParts::from_config(config))
            .with_storage(LabelStorage::from_config(config));

        for id in &config.label_set_ids {
            if !dataset_path(&config.datasets_dir, id).exists() {
                warn!(label_set = %id, dir = %config.datasets_dir.display(), "Dataset file not found, skipping");
                continue;
            }
            scribe.reload_label_set(id).await?;
        }

        let ids = scribe.registry.ids();
        let ready = ids.iter().filter(|id| scribe.registry.is_ready(id)).count();
        if ready == 0 {
            warn!("No label set is ready; pipelines will report not ready");
        }
        info!(
            label_sets = ids.len(),
            ready,
            embedder = scribe.engine.embedder().model_name(),
            "Scribe initialized"
        );
        Ok(scribe)
    }

    /// Re-reads label set `id` from storage and swaps it into the registry.
    ///
    /// Generates (and persists) embeddings when none are stored and generation is enabled.
    /// The registry changes only once the new value is complete, so a failed reload leaves
    /// the previous snapshot in place.
    pub async fn reload_label_set(&self, id: &str) -> anyhow::Result<LabelSetSummary> {
        let Some(storage) = &self.storage else {
            bail!("no label storage configured, cannot load '{id}'");
        };

        let mut loaded = load_from_dirs(id, &storage.datasets_dir, &storage.embeddings_dir)
            .with_context(|| format!("failed to load label set '{id}'"))?;

        if loaded.embeddings.is_none() && storage.generate_missing_embeddings {
            let table = self.generate_and_persist(&loaded.label_set, storage).await?;
            loaded.embeddings = Some(table);
        }

        let loaded = self.registry.insert(loaded);
        let summary = loaded.summary();
        info!(
            label_set = id,
            classes = summary.class_count,
            dim = ?summary.embedding_dim,
            attributes = summary.attributes_loaded,
            "Label set loaded"
        );
        Ok(summary)
    }

    async fn generate_and_persist(
        &self,
        label_set: &LabelSet,
        storage: &LabelStorage,
    ) -> anyhow::Result<EmbeddingTable> {
        let id = label_set.id();
        let embedder = self.engine.embedder();
        let table = generate_embedding_table(label_set, embedder.as_ref())
            .await
            .with_context(|| format!("failed to generate embeddings for '{id}'"))?;

        let path = embeddings_path(&storage.embeddings_dir, id);
        save_embedding_table(&path, label_set, &table)
            .with_context(|| format!("failed to persist embeddings for '{id}'"))?;
        info!(label_set = id, path = %path.display(), model = embedder.model_name(), "Generated class embeddings");
        Ok(table)
    }

    pub fn registry(&self) -> &Arc<LabelRegistry> {
        &self.registry
    }

    pub fn engine(&self) -> &Arc<ClassificationEngine> {
        &self.engine
    }

    pub fn label_sets(&self) -> Vec<LabelSetSummary> {
        self.registry.summaries()
    }

    /// Classification options carrying the configured `top_k`.
    pub fn classify_options(&self) -> ClassifyOptions {
        ClassifyOptions::default().top_k(self.default_top_k)
    }

    /// Pipeline options carrying the configured `top_k`.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions::default().top_k(self.default_top_k)
    }

    pub async fn classify(
        &self,
        text: &str,
        label_set_id: &str,
        options: &ClassifyOptions,
    ) -> Result<ClassificationResult, ClassifyError> {
        self.engine.classify(text, label_set_id, options).await
    }

    /// Scores label set `label_set_id` against `(text, expected_class)` cases.
    pub async fn evaluate(
        &self,
        label_set_id: &str,
        cases: &[(&str, &str)],
    ) -> Result<EvaluationReport, ClassifyError> {
        evaluate(&self.engine, label_set_id, cases).await
    }

    pub fn split_note(&self, text: &str) -> Vec<NoteSection> {
        self.splitter.split(text)
    }

    pub fn split_summary(&self, sections: &[NoteSection]) -> SplitSummary {
        self.splitter.summary(sections)
    }

    pub async fn process_note(
        &self,
        text: &str,
        options: &PipelineOptions,
    ) -> Result<PipelineResult, PipelineError> {
        self.pipeline.process_note(text, options).await
    }

    pub async fn process_note_enhanced(
        &self,
        text: &str,
        options: &PipelineOptions,
    ) -> Result<EnhancedPipelineResult, PipelineError> {
        self.enhanced.process_note(text, options).await
    }
}
