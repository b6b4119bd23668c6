//! Scripted LLM providers for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::LlmError;
use super::types::{
    AttributeAssessment, RerankCandidate, RerankResponse, RerankScore, ValidationResponse,
};
use super::{RerankProvider, ValidationProvider};

#[derive(Debug, Clone)]
enum Script<T> {
    Respond(T),
    Fail(String),
    Hang(Duration),
}

/// Reranker returning a fixed response.
#[derive(Debug)]
pub struct MockReranker {
    script: Script<RerankResponse>,
    calls: AtomicUsize,
    last_task: Mutex<Option<String>>,
}

impl MockReranker {
    /// Answers with `scores` keyed by class name.
    pub fn with_scores(scores: &[(&str, f32)]) -> Self {
        let ranked = scores
            .iter()
            .map(|(name, score)| RerankScore {
                name: name.to_string(),
                score: *score,
                reasoning: format!("scored {name}"),
            })
            .collect();
        Self::responding(RerankResponse::Ranked(ranked))
    }

    pub fn responding(response: RerankResponse) -> Self {
        Self::scripted(Script::Respond(response))
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self::scripted(Script::Fail(reason.into()))
    }

    /// Sleeps for `delay` before answering with an empty ranking.
    pub fn hanging(delay: Duration) -> Self {
        Self::scripted(Script::Hang(delay))
    }

    fn scripted(script: Script<RerankResponse>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last_task: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_task(&self) -> Option<String> {
        self.last_task.lock().clone()
    }
}

#[async_trait]
impl RerankProvider for MockReranker {
    async fn rerank(
        &self,
        _text: &str,
        _candidates: &[RerankCandidate],
        task: Option<&str>,
    ) -> Result<RerankResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_task.lock() = task.map(str::to_string);

        match self.script.clone() {
            Script::Respond(response) => Ok(response),
            Script::Fail(reason) => Err(LlmError::RequestFailed { reason }),
            Script::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Ok(RerankResponse::Ranked(vec![]))
            }
        }
    }
}

/// Validator returning per-class assessments.
#[derive(Debug)]
pub struct MockValidator {
    by_class: HashMap<String, AttributeAssessment>,
    fallback: Script<ValidationResponse>,
    calls: AtomicUsize,
}

impl MockValidator {
    /// Answers every class with `assessment`.
    pub fn assessing(assessment: AttributeAssessment) -> Self {
        Self::scripted(Script::Respond(ValidationResponse::Assessed(assessment)))
    }

    pub fn responding(response: ValidationResponse) -> Self {
        Self::scripted(Script::Respond(response))
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self::scripted(Script::Fail(reason.into()))
    }

    pub fn hanging(delay: Duration) -> Self {
        Self::scripted(Script::Hang(delay))
    }

    /// Overrides the answer for one class.
    pub fn with_class(mut self, class_name: &str, assessment: AttributeAssessment) -> Self {
        self.by_class.insert(class_name.to_string(), assessment);
        self
    }

    fn scripted(script: Script<ValidationResponse>) -> Self {
        Self {
            by_class: HashMap::new(),
            fallback: script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ValidationProvider for MockValidator {
    async fn validate(
        &self,
        _text: &str,
        class_name: &str,
        _spec: &serde_json::Value,
    ) -> Result<ValidationResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(assessment) = self.by_class.get(class_name) {
            return Ok(ValidationResponse::Assessed(assessment.clone()));
        }

        match self.fallback.clone() {
            Script::Respond(response) => Ok(response),
            Script::Fail(reason) => Err(LlmError::RequestFailed { reason }),
            Script::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Err(LlmError::EmptyResponse)
            }
        }
    }
}
