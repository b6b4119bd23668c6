use std::sync::Arc;

use async_trait::async_trait;
use moka::sync::Cache;
use tracing::trace;

use super::Embedder;
use super::error::EmbeddingError;
use crate::hashing::hash_embedding_key;

/// Wraps an [`Embedder`] with a bounded in-memory cache keyed by `blake3(model, text)`.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Cache<[u8; 32], Arc<Vec<f32>>>,
}

impl std::fmt::Debug for CachedEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedEmbedder")
            .field("model", &self.inner.model_name())
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::new(capacity),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    fn key(&self, text: &str) -> [u8; 32] {
        hash_embedding_key(self.inner.model_name(), text)
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn dimension(&self) -> Option<usize> {
        self.inner.dimension()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let key = self.key(text);
        if let Some(hit) = self.cache.get(&key) {
            trace!("Embedding cache hit");
            return Ok(hit.as_ref().clone());
        }

        let vector = self.inner.embed(text).await?;
        self.cache.insert(key, Arc::new(vector.clone()));
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut misses = Vec::new();
        let mut miss_idx = Vec::new();

        for (idx, text) in texts.iter().enumerate() {
            match self.cache.get(&self.key(text)) {
                Some(hit) => results.push(Some(hit.as_ref().clone())),
                None => {
                    results.push(None);
                    misses.push(text.clone());
                    miss_idx.push(idx);
                }
            }
        }

        if !misses.is_empty() {
            let fetched = self.inner.embed_batch(&misses).await?;
            if fetched.len() != misses.len() {
                return Err(EmbeddingError::InvalidResponse {
                    reason: format!("expected {} embeddings, got {}", misses.len(), fetched.len()),
                });
            }
            for ((idx, text), vector) in miss_idx.into_iter().zip(&misses).zip(fetched) {
                self.cache.insert(self.key(text), Arc::new(vector.clone()));
                results[idx] = Some(vector);
            }
        }

        results
            .into_iter()
            .map(|r| {
                r.ok_or_else(|| EmbeddingError::InvalidResponse {
                    reason: "missing embedding in batch".to_string(),
                })
            })
            .collect()
    }
}
