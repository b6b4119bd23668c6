use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::constants::{RERANK_WEIGHT, SIMILARITY_WEIGHT};
use crate::llm::{RerankCandidate, RerankProvider, RerankResponse, RerankScore};

use super::types::{Candidate, RerankStatus};

/// Blends LLM rerank scores into similarity-ranked candidates.
///
/// `effective = 0.3 * similarity + 0.7 * rerank` for every candidate the reranker
/// scored; the rest keep their similarity. Any reranker failure leaves the candidates
/// untouched.
pub struct RerankFuser {
    provider: Arc<dyn RerankProvider>,
    timeout: Duration,
}

impl std::fmt::Debug for RerankFuser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RerankFuser")
            .field("available", &self.provider.is_available())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RerankFuser {
    pub fn new(provider: Arc<dyn RerankProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }

    /// Reranks `candidates` in place and reports what happened.
    pub async fn fuse(
        &self,
        text: &str,
        candidates: &mut [Candidate],
        task: Option<&str>,
    ) -> RerankStatus {
        if candidates.is_empty() {
            return RerankStatus::NoMatch;
        }
        if !self.provider.is_available() {
            debug!("Reranker unavailable, keeping similarity order");
            return RerankStatus::Unavailable;
        }

        let offered: Vec<RerankCandidate> = candidates
            .iter()
            .map(|c| RerankCandidate {
                name: c.name.clone(),
                description: c.description.clone(),
                similarity: c.similarity_score,
            })
            .collect();

        let call = self.provider.rerank(text, &offered, task);
        let scores = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(RerankResponse::Ranked(scores))) => scores,
            Ok(Ok(RerankResponse::Malformed { reason })) => {
                warn!(%reason, "Reranker returned a malformed response, keeping similarity order");
                return RerankStatus::Malformed;
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Reranking failed, keeping similarity order");
                return RerankStatus::Failed;
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Reranking timed out, keeping similarity order");
                return RerankStatus::TimedOut;
            }
        };

        let matched = apply_rerank_scores(candidates, &scores);
        if matched == 0 {
            debug!(returned = scores.len(), "Reranker scored none of the candidates");
            return RerankStatus::NoMatch;
        }

        debug!(
            matched,
            offered = candidates.len(),
            top = %candidates[0].name,
            top_score = candidates[0].effective_score,
            "Rerank scores fused"
        );
        RerankStatus::Applied
    }
}

/// Applies `scores` by class name, recomputes effective scores and re-sorts.
///
/// Returns how many candidates received a rerank score. When a name appears more than
/// once, its first occurrence wins.
pub fn apply_rerank_scores(candidates: &mut [Candidate], scores: &[RerankScore]) -> usize {
    let mut by_name: HashMap<&str, &RerankScore> = HashMap::with_capacity(scores.len());
    for score in scores {
        by_name.entry(score.name.as_str()).or_insert(score);
    }

    let mut matched = 0;
    for candidate in candidates.iter_mut() {
        match by_name.get(candidate.name.as_str()) {
            Some(score) => {
                let rerank = score.score.clamp(0.0, 1.0);
                candidate.rerank_score = Some(rerank);
                candidate.effective_score =
                    SIMILARITY_WEIGHT * candidate.similarity_score + RERANK_WEIGHT * rerank;
                if !score.reasoning.is_empty() {
                    candidate.reasoning = Some(score.reasoning.clone());
                }
                matched += 1;
            }
            None => candidate.effective_score = candidate.similarity_score,
        }
    }

    candidates.sort_by(|a, b| b.effective_score.total_cmp(&a.effective_score));
    matched
}
