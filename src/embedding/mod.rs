//! Text embedding providers.
//!
//! - [`gemini`] calls the Gemini embeddings API.
//! - [`cache`] memoizes any provider by `(model, text)`.
//! - [`UnavailableEmbedder`] stands in when no provider is configured, so the rest of
//!   the system stays constructible and fails per request instead of at startup.

/// Content-addressed embedding cache.
pub mod cache;
mod error;
/// Gemini embeddings client.
pub mod gemini;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use cache::CachedEmbedder;
pub use error::EmbeddingError;
pub use gemini::{GEMINI_API_BASE, GeminiEmbedder, GeminiEmbedderConfig};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Config;

/// Maps text to a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the model producing the vectors.
    fn model_name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    /// Output dimension, when known up front.
    fn dimension(&self) -> Option<usize> {
        None
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds several texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Embedder that always fails with [`EmbeddingError::NotAvailable`].
#[derive(Debug, Clone)]
pub struct UnavailableEmbedder {
    reason: String,
}

impl UnavailableEmbedder {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Embedder for UnavailableEmbedder {
    fn model_name(&self) -> &str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::NotAvailable {
            reason: self.reason.clone(),
        })
    }
}

/// Picks the embedding provider for `config`.
///
/// With an API key this is a cached [`GeminiEmbedder`]; without one, an
/// [`UnavailableEmbedder`].
pub fn build_embedder(config: &Config) -> Arc<dyn Embedder> {
    let Some(api_key) = config.gemini_api_key.as_deref().filter(|k| !k.is_empty()) else {
        warn!("No Gemini API key configured; embeddings unavailable");
        return Arc::new(UnavailableEmbedder::new("no API key configured"));
    };

    let gemini_config =
        GeminiEmbedderConfig::new(api_key, &config.embedding_model, config.embedding_dim)
            .with_total_timeout(config.embed_timeout);

    info!(
        model = %config.embedding_model,
        dim = config.embedding_dim,
        cache_capacity = config.embedding_cache_capacity,
        "Using Gemini embeddings"
    );

    let inner: Arc<dyn Embedder> = Arc::new(GeminiEmbedder::new(gemini_config));
    if config.embedding_cache_capacity == 0 {
        return inner;
    }
    Arc::new(CachedEmbedder::new(inner, config.embedding_cache_capacity))
}
