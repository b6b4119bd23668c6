use serde::{Deserialize, Serialize};

/// One class offered to the reranker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RerankCandidate {
    pub name: String,
    pub description: String,
    pub similarity: f32,
}

/// Score the reranker assigned to one class name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankScore {
    pub name: String,
    pub score: f32,
    #[serde(default)]
    pub reasoning: String,
}

/// Outcome of a rerank call that reached the model.
#[derive(Debug, Clone, PartialEq)]
pub enum RerankResponse {
    /// Parsed rankings (possibly partial, possibly empty).
    Ranked(Vec<RerankScore>),
    /// The model answered but the payload could not be used.
    Malformed { reason: String },
}

/// The validation model's verdict on one class's required conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeAssessment {
    pub is_valid: bool,
    /// `None` when the model omitted the score.
    pub score: Option<f32>,
    pub conditions_met: Vec<String>,
    pub conditions_not_met: Vec<String>,
    pub explanation: String,
}

/// Outcome of a validation call that reached the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResponse {
    Assessed(AttributeAssessment),
    Malformed { reason: String },
}
