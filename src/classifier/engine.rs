use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use crate::embedding::{Embedder, EmbeddingError};
use crate::labels::{LabelRegistry, LoadedLabelSet};
use crate::ranking::rank;
use crate::scoring::{AttributeValidator, Candidate, RerankFuser, RerankStatus};

use super::error::ClassifyError;
use super::types::{ClassificationResult, ClassifyOptions};

/// Capabilities the engine runs on.
#[derive(Clone)]
pub struct EngineParts {
    pub registry: Arc<LabelRegistry>,
    pub embedder: Arc<dyn Embedder>,
    pub fuser: Arc<RerankFuser>,
    pub validator: Arc<AttributeValidator>,
    pub embed_timeout: Duration,
}

/// Embed → rank → (rerank) → (validate) for one text and one label set.
///
/// Holds no per-call state; label sets are read from the registry snapshot current at
/// the start of each call.
pub struct ClassificationEngine {
    registry: Arc<LabelRegistry>,
    embedder: Arc<dyn Embedder>,
    fuser: Arc<RerankFuser>,
    validator: Arc<AttributeValidator>,
    embed_timeout: Duration,
}

impl std::fmt::Debug for ClassificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationEngine")
            .field("label_sets", &self.registry.ids())
            .field("embedder", &self.embedder.model_name())
            .field("fuser", &self.fuser)
            .field("validator", &self.validator)
            .finish()
    }
}

impl ClassificationEngine {
    pub fn new(parts: EngineParts) -> Self {
        Self {
            registry: parts.registry,
            embedder: parts.embedder,
            fuser: parts.fuser,
            validator: parts.validator,
            embed_timeout: parts.embed_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<LabelRegistry> {
        &self.registry
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Embeds `text` with the configured timeout.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ClassifyError> {
        match tokio::time::timeout(self.embed_timeout, self.embedder.embed(text)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(EmbeddingError::Timeout {
                millis: u64::try_from(self.embed_timeout.as_millis()).unwrap_or(u64::MAX),
            }
            .into()),
        }
    }

    /// Classifies `text` against label set `label_set_id`.
    #[instrument(skip(self, text, options), fields(text_len = text.len(), top_k = options.top_k))]
    pub async fn classify(
        &self,
        text: &str,
        label_set_id: &str,
        options: &ClassifyOptions,
    ) -> Result<ClassificationResult, ClassifyError> {
        let started = Instant::now();
        let loaded = self.ready_label_set(label_set_id)?;
        let vector = self.embed(text).await?;
        self.run(text, &vector, &loaded, options, started).await
    }

    /// Like [`classify`](Self::classify) with a precomputed embedding of `text`.
    ///
    /// Lets callers embed a text once and classify it against several label sets.
    #[instrument(skip(self, text, vector, options), fields(text_len = text.len(), top_k = options.top_k))]
    pub async fn classify_vector(
        &self,
        text: &str,
        vector: &[f32],
        label_set_id: &str,
        options: &ClassifyOptions,
    ) -> Result<ClassificationResult, ClassifyError> {
        let started = Instant::now();
        let loaded = self.ready_label_set(label_set_id)?;
        self.run(text, vector, &loaded, options, started).await
    }

    fn ready_label_set(&self, id: &str) -> Result<Arc<LoadedLabelSet>, ClassifyError> {
        let loaded = self
            .registry
            .get(id)
            .ok_or_else(|| ClassifyError::UnknownLabelSet { id: id.to_string() })?;

        if loaded.label_set.is_empty() {
            return Err(ClassifyError::EmptyLabelSet { id: id.to_string() });
        }
        if loaded.embeddings.is_none() {
            return Err(ClassifyError::EmbeddingsNotLoaded { id: id.to_string() });
        }
        Ok(loaded)
    }

    async fn run(
        &self,
        text: &str,
        vector: &[f32],
        loaded: &LoadedLabelSet,
        options: &ClassifyOptions,
        started: Instant,
    ) -> Result<ClassificationResult, ClassifyError> {
        let id = loaded.label_set.id();
        let table = loaded
            .embeddings
            .as_ref()
            .ok_or_else(|| ClassifyError::EmbeddingsNotLoaded { id: id.to_string() })?;

        if vector.len() != table.dim() {
            return Err(ClassifyError::DimensionMismatch {
                id: id.to_string(),
                expected: table.dim(),
                actual: vector.len(),
            });
        }

        let top_k = options.top_k.max(1);
        let classes = loaded.label_set.classes();
        let mut candidates: Vec<Candidate> = rank(vector, table, top_k)
            .into_iter()
            .filter_map(|ranked| match classes.get(ranked.index) {
                Some(class) => Some(Candidate::from_class(class, ranked.score)),
                None => {
                    warn!(label_set = id, index = ranked.index, "Ranked row has no class, skipping");
                    None
                }
            })
            .collect();

        if candidates.is_empty() {
            return Err(ClassifyError::EmptyLabelSet { id: id.to_string() });
        }

        debug!(
            label_set = id,
            top = %candidates[0].name,
            similarity = candidates[0].similarity_score,
            "Similarity ranking complete"
        );

        let rerank_status = if options.use_reranking {
            self.fuser
                .fuse(text, &mut candidates, options.task.as_deref())
                .await
        } else {
            RerankStatus::NotRequested
        };

        let attribute_validation = match (&loaded.attributes, options.use_attribute_validation) {
            (Some(attributes), true) => {
                let validation = self
                    .validator
                    .validate(text, &candidates[0].name, attributes)
                    .await;
                candidates[0].attribute_score = Some(validation.score);
                Some(validation)
            }
            _ => None,
        };

        let mut candidates = candidates.into_iter();
        let Some(predicted) = candidates.next() else {
            return Err(ClassifyError::EmptyLabelSet { id: id.to_string() });
        };

        let result = ClassificationResult {
            label_set_id: id.to_string(),
            predicted,
            alternatives: candidates.collect(),
            reranked: rerank_status.is_applied(),
            rerank_status,
            attribute_validated: attribute_validation.is_some(),
            attribute_validation,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        };

        debug!(
            label_set = id,
            predicted = %result.predicted.name,
            effective = result.predicted.effective_score,
            reranked = result.reranked,
            attribute_validated = result.attribute_validated,
            elapsed_ms = result.processing_time_ms,
            "Classification complete"
        );

        Ok(result)
    }
}
