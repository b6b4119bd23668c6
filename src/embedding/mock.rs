//! Deterministic in-memory embedder for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::Embedder;
use super::error::EmbeddingError;
use crate::hashing::hash_text;

/// Returns fixed vectors for registered texts and a bag-of-words hash vector otherwise.
#[derive(Debug)]
pub struct MockEmbedder {
    dim: usize,
    overrides: RwLock<HashMap<String, Vec<f32>>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            overrides: RwLock::new(HashMap::new()),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Pins the vector returned for `text`.
    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.set_vector(text, vector);
        self
    }

    pub fn set_vector(&self, text: impl Into<String>, vector: Vec<f32>) {
        self.overrides.write().insert(text.into(), vector);
    }

    /// Makes every subsequent call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of texts embedded so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hashed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dim];
        if self.dim == 0 {
            return vector;
        }
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = hash_text(&token.to_lowercase());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest[..8]);
            let slot = (u64::from_le_bytes(bytes) % self.dim as u64) as usize;
            vector[slot] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn model_name(&self) -> &str {
        "mock-embedder"
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dim)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmbeddingError::RequestFailed {
                reason: "mock embedder failure".to_string(),
            });
        }
        if let Some(vector) = self.overrides.read().get(text) {
            return Ok(vector.clone());
        }
        Ok(self.hashed(text))
    }
}
