//! Gemini embeddings API client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use super::Embedder;
use super::error::EmbeddingError;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Max characters sent per text; longer input is truncated.
const MAX_TEXT_CHARS: usize = 8000;
/// Max texts per `batchEmbedContents` call.
const MAX_BATCH_SIZE: usize = 50;
const RETRY_ATTEMPTS: usize = 2;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);
const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(100);
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiEmbedderConfig {
    pub api_key: String,
    pub model: String,
    pub dim: usize,
    pub timeout: Duration,
    pub base_url: String,
}

impl GeminiEmbedderConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, dim: usize) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            dim,
            timeout: Duration::from_secs(30),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// Sets the per-attempt timeout so every attempt and backoff fit within `total`.
    pub fn with_total_timeout(mut self, total: Duration) -> Self {
        let backoff = RETRY_BACKOFF * RETRY_ATTEMPTS as u32;
        let attempts = RETRY_ATTEMPTS as u32 + 1;
        self.timeout = (total.saturating_sub(backoff) / attempts).max(MIN_ATTEMPT_TIMEOUT);
        self
    }
}

pub struct GeminiEmbedder {
    config: GeminiEmbedderConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for GeminiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEmbedder")
            .field("model", &self.config.model)
            .field("dim", &self.config.dim)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiEmbedder {
    pub fn new(config: GeminiEmbedderConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, http }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.base_url, self.config.model, method)
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        json!({
            "model": format!("models/{}", self.config.model),
            "content": { "parts": [{ "text": truncate_chars(text, MAX_TEXT_CHARS) }] },
            "outputDimensionality": self.config.dim,
        })
    }

    fn parse_values(&self, value: &serde_json::Value) -> Result<Vec<f32>, EmbeddingError> {
        let values = value["values"]
            .as_array()
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                reason: "missing 'values' array".to_string(),
            })?;

        let embedding: Vec<f32> = values
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        if embedding.len() != self.config.dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.config.dim,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }

    async fn post_with_retries(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, EmbeddingError> {
        let mut last_error = None;

        for attempt in 0..=RETRY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(RETRY_BACKOFF).await;
            }

            let request = self
                .http
                .post(url)
                .header(API_KEY_HEADER, &self.config.api_key)
                .json(body);

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.json().await?);
                }
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    warn!(attempt, %status, "Embedding API returned an error");
                    last_error = Some(EmbeddingError::RequestFailed {
                        reason: format!("API error {status}: {text}"),
                    });
                }
                Err(e) => {
                    let err = EmbeddingError::from(e);
                    warn!(attempt, error = %err, "Embedding request failed");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| EmbeddingError::RequestFailed {
            reason: "no attempts made".to_string(),
        }))
    }

    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let requests: Vec<serde_json::Value> =
            texts.iter().map(|t| self.request_body(t)).collect();
        let body = json!({ "requests": requests });

        let json = self
            .post_with_retries(&self.endpoint("batchEmbedContents"), &body)
            .await?;

        let embeddings = json["embeddings"]
            .as_array()
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                reason: "missing 'embeddings' array".to_string(),
            })?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse {
                reason: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    embeddings.len()
                ),
            });
        }

        embeddings.iter().map(|e| self.parse_values(e)).collect()
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.config.dim)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if !self.is_available() {
            return Err(EmbeddingError::NotAvailable {
                reason: "no API key configured".to_string(),
            });
        }

        debug!(text_len = text.len(), model = %self.config.model, "Embedding text");
        let json = self
            .post_with_retries(&self.endpoint("embedContent"), &self.request_body(text))
            .await?;
        self.parse_values(&json["embedding"])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        if !self.is_available() {
            return Err(EmbeddingError::NotAvailable {
                reason: "no API key configured".to_string(),
            });
        }

        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH_SIZE) {
            all.extend(self.embed_chunk(chunk).await?);
        }
        Ok(all)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
