//! Parsing of the JSON payloads the chat model returns.
//!
//! Models often wrap JSON in a markdown fence (optionally tagged `json`); the fence is
//! stripped before parsing. Anything that still fails to parse becomes a `Malformed`
//! variant instead of an error so callers can fall back explicitly.

use serde::Deserialize;

use super::types::{AttributeAssessment, RerankResponse, RerankScore, ValidationResponse};

#[derive(Debug, Deserialize)]
struct RankingsPayload {
    rankings: Vec<RankingItem>,
}

#[derive(Debug, Deserialize)]
struct RankingItem {
    #[serde(rename = "class")]
    name: String,
    score: f32,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Deserialize)]
struct ValidationPayload {
    #[serde(default = "default_valid")]
    is_valid: bool,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    conditions_met: Vec<String>,
    #[serde(default)]
    conditions_not_met: Vec<String>,
    #[serde(default)]
    explanation: String,
}

fn default_valid() -> bool {
    true
}

/// Removes a surrounding markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split("```").next().unwrap_or(rest);
    body.strip_prefix("json").unwrap_or(body).trim()
}

pub fn parse_rerank(raw: &str) -> RerankResponse {
    match serde_json::from_str::<RankingsPayload>(strip_code_fence(raw)) {
        Ok(payload) => {
            let mut scores: Vec<RerankScore> = payload
                .rankings
                .into_iter()
                .filter(|item| item.score.is_finite())
                .map(|item| RerankScore {
                    name: item.name,
                    score: item.score.clamp(0.0, 1.0),
                    reasoning: item.reasoning,
                })
                .collect();
            scores.sort_by(|a, b| b.score.total_cmp(&a.score));
            RerankResponse::Ranked(scores)
        }
        Err(e) => RerankResponse::Malformed {
            reason: e.to_string(),
        },
    }
}

pub fn parse_validation(raw: &str) -> ValidationResponse {
    match serde_json::from_str::<ValidationPayload>(strip_code_fence(raw)) {
        Ok(payload) => ValidationResponse::Assessed(AttributeAssessment {
            is_valid: payload.is_valid,
            score: payload
                .score
                .filter(|s| s.is_finite())
                .map(|s| s.clamp(0.0, 1.0)),
            conditions_met: payload.conditions_met,
            conditions_not_met: payload.conditions_not_met,
            explanation: payload.explanation,
        }),
        Err(e) => ValidationResponse::Malformed {
            reason: e.to_string(),
        },
    }
}
