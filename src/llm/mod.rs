//! LLM capabilities: candidate reranking and attribute validation.
//!
//! Both are optional enhancements. [`build_llm`] returns a [`GenaiLlm`] when an API
//! key is configured and a [`NoopLlm`] otherwise; callers probe `is_available()`
//! instead of special-casing a missing client.

pub mod client;
mod error;
pub mod parse;
pub mod prompts;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod tests;

pub use client::{GenaiLlm, GenaiLlmConfig};
pub use error::LlmError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockReranker, MockValidator};
pub use types::{
    AttributeAssessment, RerankCandidate, RerankResponse, RerankScore, ValidationResponse,
};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Config;

/// Rescores similarity candidates for one text.
#[async_trait]
pub trait RerankProvider: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// `task` names the classification task (e.g. the category) as a prompt hint.
    async fn rerank(
        &self,
        text: &str,
        candidates: &[RerankCandidate],
        task: Option<&str>,
    ) -> Result<RerankResponse, LlmError>;
}

/// Checks a text against one class's required conditions.
#[async_trait]
pub trait ValidationProvider: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    async fn validate(
        &self,
        text: &str,
        class_name: &str,
        spec: &serde_json::Value,
    ) -> Result<ValidationResponse, LlmError>;
}

/// Stand-in used when no chat model is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLlm;

#[async_trait]
impl RerankProvider for NoopLlm {
    fn is_available(&self) -> bool {
        false
    }

    async fn rerank(
        &self,
        _text: &str,
        _candidates: &[RerankCandidate],
        _task: Option<&str>,
    ) -> Result<RerankResponse, LlmError> {
        Err(LlmError::NotAvailable {
            reason: "no chat model configured".to_string(),
        })
    }
}

#[async_trait]
impl ValidationProvider for NoopLlm {
    fn is_available(&self) -> bool {
        false
    }

    async fn validate(
        &self,
        _text: &str,
        _class_name: &str,
        _spec: &serde_json::Value,
    ) -> Result<ValidationResponse, LlmError> {
        Err(LlmError::NotAvailable {
            reason: "no chat model configured".to_string(),
        })
    }
}

/// The two LLM capabilities, selected together.
#[derive(Clone)]
pub struct LlmProviders {
    pub reranker: Arc<dyn RerankProvider>,
    pub validator: Arc<dyn ValidationProvider>,
}

impl std::fmt::Debug for LlmProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmProviders")
            .field("reranker_available", &self.reranker.is_available())
            .field("validator_available", &self.validator.is_available())
            .finish()
    }
}

impl LlmProviders {
    pub fn noop() -> Self {
        Self {
            reranker: Arc::new(NoopLlm),
            validator: Arc::new(NoopLlm),
        }
    }
}

/// Picks the LLM providers for `config`.
pub fn build_llm(config: &Config) -> LlmProviders {
    let Some(api_key) = config.gemini_api_key.as_deref().filter(|k| !k.is_empty()) else {
        warn!("No Gemini API key configured; reranking and attribute validation disabled");
        return LlmProviders::noop();
    };

    info!(
        rerank_model = %config.rerank_model,
        validation_model = %config.validation_model,
        "Using Gemini chat models"
    );

    let llm = Arc::new(GenaiLlm::new(GenaiLlmConfig {
        api_key: api_key.to_string(),
        rerank_model: config.rerank_model.clone(),
        validation_model: config.validation_model.clone(),
        temperature: config.llm_temperature,
        max_tokens: config.llm_max_tokens,
    }));

    LlmProviders {
        reranker: llm.clone(),
        validator: llm,
    }
}
