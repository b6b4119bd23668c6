//! Cosine-similarity ranking of a query vector against an [`EmbeddingTable`].


use crate::labels::EmbeddingTable;

/// One ranked row of an embedding table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedClass {
    /// Row (= class) index in the label set.
    pub index: usize,
    pub score: f32,
}

/// Cosine similarity with guarded division.
///
/// Length mismatch, empty input, a zero-norm vector or a non-finite result all yield `0.0`.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a_sq, norm_b_sq) = a
        .iter()
        .zip(b.iter())
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (&av, &bv)| {
            (dot + av * bv, na + av * av, nb + bv * bv)
        });

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a * norm_b);
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Scores every row against `query` and returns the best `k`, highest first.
///
/// The sort is stable, so equal scores keep class order.
pub fn rank(query: &[f32], table: &EmbeddingTable, k: usize) -> Vec<RankedClass> {
    let mut scored: Vec<RankedClass> = table
        .rows()
        .enumerate()
        .map(|(index, row)| RankedClass {
            index,
            score: cosine_similarity(query, row),
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    scored
}
