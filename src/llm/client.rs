//! Chat-model backed reranking and attribute validation.

use async_trait::async_trait;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use genai::resolver::{AuthData, AuthResolver};
use genai::{Client, ModelIden};
use tracing::debug;

use super::error::LlmError;
use super::parse::{parse_rerank, parse_validation};
use super::prompts::{rerank_prompt, validation_prompt};
use super::types::{RerankCandidate, RerankResponse, ValidationResponse};
use super::{RerankProvider, ValidationProvider};

#[derive(Debug, Clone)]
pub struct GenaiLlmConfig {
    pub api_key: String,
    pub rerank_model: String,
    pub validation_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

pub struct GenaiLlm {
    client: Client,
    config: GenaiLlmConfig,
    options: ChatOptions,
}

impl std::fmt::Debug for GenaiLlm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiLlm")
            .field("rerank_model", &self.config.rerank_model)
            .field("validation_model", &self.config.validation_model)
            .field("temperature", &self.config.temperature)
            .field("max_tokens", &self.config.max_tokens)
            .finish_non_exhaustive()
    }
}

impl GenaiLlm {
    pub fn new(config: GenaiLlmConfig) -> Self {
        let key = config.api_key.clone();
        let auth = AuthResolver::from_resolver_fn(
            move |_model: ModelIden| -> Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_single(key.clone())))
            },
        );
        let client = Client::builder().with_auth_resolver(auth).build();

        let options = ChatOptions::default()
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens);

        Self {
            client,
            config,
            options,
        }
    }

    async fn complete(&self, model: &str, prompt: String) -> Result<String, LlmError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);
        let response = self
            .client
            .exec_chat(model, request, Some(&self.options))
            .await?;

        let text = response.first_text().unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        debug!(model, response_len = text.len(), "LLM response received");
        Ok(text)
    }
}

#[async_trait]
impl RerankProvider for GenaiLlm {
    fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn rerank(
        &self,
        text: &str,
        candidates: &[RerankCandidate],
        task: Option<&str>,
    ) -> Result<RerankResponse, LlmError> {
        let raw = self
            .complete(
                &self.config.rerank_model,
                rerank_prompt(text, candidates, task),
            )
            .await?;
        Ok(parse_rerank(&raw))
    }
}

#[async_trait]
impl ValidationProvider for GenaiLlm {
    fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn validate(
        &self,
        text: &str,
        class_name: &str,
        spec: &serde_json::Value,
    ) -> Result<ValidationResponse, LlmError> {
        let raw = self
            .complete(
                &self.config.validation_model,
                validation_prompt(text, class_name, spec),
            )
            .await?;
        Ok(parse_validation(&raw))
    }
}
