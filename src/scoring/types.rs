use serde::{Deserialize, Serialize};

use crate::labels::ClassDefinition;

/// One class scored against one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub class_id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub similarity_score: f32,
    pub rerank_score: Option<f32>,
    pub attribute_score: Option<f32>,
    /// Score used for ordering.
    pub effective_score: f32,
    pub reasoning: Option<String>,
}

impl Candidate {
    pub fn from_class(class: &ClassDefinition, similarity_score: f32) -> Self {
        Self {
            class_id: class.id.clone(),
            name: class.name.clone(),
            description: class.description.clone(),
            metadata: class.metadata.clone(),
            similarity_score,
            rerank_score: None,
            attribute_score: None,
            effective_score: similarity_score,
            reasoning: None,
        }
    }
}

/// What happened to the rerank stage of one classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankStatus {
    NotRequested,
    /// At least one candidate received a rerank score.
    Applied,
    Unavailable,
    Failed,
    TimedOut,
    Malformed,
    /// The reranker answered but named none of the candidates.
    NoMatch,
}

impl RerankStatus {
    pub fn is_applied(self) -> bool {
        self == RerankStatus::Applied
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RerankStatus::NotRequested => "not_requested",
            RerankStatus::Applied => "applied",
            RerankStatus::Unavailable => "unavailable",
            RerankStatus::Failed => "failed",
            RerankStatus::TimedOut => "timed_out",
            RerankStatus::Malformed => "malformed",
            RerankStatus::NoMatch => "no_match",
        }
    }
}

impl std::fmt::Display for RerankStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an [`AttributeValidation`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// The class declares no required conditions.
    NoAttributes,
    /// The validation provider assessed the text.
    Evaluated,
    /// The provider was unavailable, failed, timed out or answered garbage.
    FailedOpen,
}

/// Result of checking the top candidate against its class's required conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValidation {
    pub status: ValidationStatus,
    pub is_valid: bool,
    pub score: f32,
    pub conditions_met: Vec<String>,
    pub conditions_not_met: Vec<String>,
    pub explanation: String,
}

impl AttributeValidation {
    pub fn no_attributes() -> Self {
        Self {
            status: ValidationStatus::NoAttributes,
            is_valid: true,
            score: 1.0,
            conditions_met: vec![],
            conditions_not_met: vec![],
            explanation: "No attributes defined for this class".to_string(),
        }
    }

    pub fn failed_open(explanation: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::FailedOpen,
            is_valid: true,
            score: 1.0,
            conditions_met: vec![],
            conditions_not_met: vec![],
            explanation: explanation.into(),
        }
    }
}
