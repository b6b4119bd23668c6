use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::embedding::Embedder;

use super::error::{LabelError, LabelResult};
use super::model::{AttributeSet, EmbeddingTable, LabelSet};

/// Immutable snapshot of everything loaded for one label set.
#[derive(Debug, Clone)]
pub struct LoadedLabelSet {
    pub label_set: LabelSet,
    pub embeddings: Option<EmbeddingTable>,
    pub attributes: Option<AttributeSet>,
}

impl LoadedLabelSet {
    pub fn new(label_set: LabelSet) -> Self {
        Self {
            label_set,
            embeddings: None,
            attributes: None,
        }
    }

    /// `true` once the set can be classified against.
    pub fn is_ready(&self) -> bool {
        !self.label_set.is_empty() && self.embeddings.is_some()
    }

    pub fn summary(&self) -> LabelSetSummary {
        LabelSetSummary {
            id: self.label_set.id().to_string(),
            class_count: self.label_set.len(),
            embedding_dim: self.embeddings.as_ref().map(EmbeddingTable::dim),
            attributes_loaded: self.attributes.is_some(),
        }
    }
}

/// Overview of one registered label set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelSetSummary {
    pub id: String,
    pub class_count: usize,
    pub embedding_dim: Option<usize>,
    pub attributes_loaded: bool,
}

/// Registry of loaded label sets.
///
/// Entries are never mutated in place: every change builds a new [`LoadedLabelSet`] and
/// swaps the `Arc` under a short write lock, so in-flight classifications keep reading
/// the snapshot they started with.
#[derive(Debug, Default)]
pub struct LabelRegistry {
    sets: RwLock<HashMap<String, Arc<LoadedLabelSet>>>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Arc<LoadedLabelSet>> {
        self.sets.read().get(id).cloned()
    }

    pub fn is_ready(&self, id: &str) -> bool {
        self.get(id).is_some_and(|set| set.is_ready())
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sets.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn summaries(&self) -> Vec<LabelSetSummary> {
        let mut summaries: Vec<LabelSetSummary> =
            self.sets.read().values().map(|s| s.summary()).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Registers (or replaces) a fully built entry.
    pub fn insert(&self, loaded: LoadedLabelSet) -> Arc<LoadedLabelSet> {
        let id = loaded.label_set.id().to_string();
        let entry = Arc::new(loaded);
        let previous = self.sets.write().insert(id.clone(), Arc::clone(&entry));

        info!(
            label_set = %id,
            classes = entry.label_set.len(),
            embeddings = entry.embeddings.is_some(),
            attributes = entry.attributes.is_some(),
            replaced = previous.is_some(),
            "Label set registered"
        );
        entry
    }

    /// Registers a label set without embeddings (replacing any previous entry).
    pub fn load_label_set(&self, label_set: LabelSet) -> Arc<LoadedLabelSet> {
        self.insert(LoadedLabelSet::new(label_set))
    }

    /// Attaches an embedding table, aligned against the registered class order.
    pub fn attach_embeddings(
        &self,
        id: &str,
        vectors: HashMap<String, Vec<f32>>,
        model_name: Option<String>,
    ) -> LabelResult<Arc<LoadedLabelSet>> {
        let current = self.require(id)?;
        let table = EmbeddingTable::aligned(&current.label_set, vectors, model_name)?;

        let mut next = (*current).clone();
        next.embeddings = Some(table);
        Ok(self.insert(next))
    }

    /// Attaches attribute specs; entries for unknown classes are skipped.
    pub fn attach_attributes(
        &self,
        id: &str,
        entries: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) -> LabelResult<Arc<LoadedLabelSet>> {
        let current = self.require(id)?;
        let attributes = AttributeSet::for_label_set(&current.label_set, entries);

        let mut next = (*current).clone();
        next.attributes = Some(attributes);
        Ok(self.insert(next))
    }

    /// Embeds every class description once and swaps in a snapshot carrying the table.
    ///
    /// On failure the registered entry is left untouched.
    pub async fn generate_embeddings(
        &self,
        id: &str,
        embedder: &dyn Embedder,
    ) -> LabelResult<Arc<LoadedLabelSet>> {
        let current = self.require(id)?;
        let table = generate_embedding_table(&current.label_set, embedder).await?;

        let mut next = (*current).clone();
        next.embeddings = Some(table);
        Ok(self.insert(next))
    }

    pub fn remove(&self, id: &str) -> Option<Arc<LoadedLabelSet>> {
        self.sets.write().remove(id)
    }

    fn require(&self, id: &str) -> LabelResult<Arc<LoadedLabelSet>> {
        self.get(id)
            .ok_or_else(|| LabelError::UnknownLabelSet { id: id.to_string() })
    }
}

/// Embeds every class description of `label_set` once, in class order.
pub async fn generate_embedding_table(
    label_set: &LabelSet,
    embedder: &dyn Embedder,
) -> LabelResult<EmbeddingTable> {
    let id = label_set.id();
    let descriptions: Vec<String> = label_set
        .classes()
        .iter()
        .map(|c| c.description.clone())
        .collect();

    debug!(label_set = id, count = descriptions.len(), "Embedding class descriptions");

    let vectors = embedder
        .embed_batch(&descriptions)
        .await
        .map_err(|source| LabelError::Embedding {
            label_set: id.to_string(),
            source,
        })?;

    let named: HashMap<String, Vec<f32>> = label_set
        .classes()
        .iter()
        .map(|c| c.name.clone())
        .zip(vectors)
        .collect();

    EmbeddingTable::aligned(label_set, named, Some(embedder.model_name().to_string()))
}
