//! Cross-cutting, shared constants.
//!
//! Scoring weights and thresholds are fixed policy values; several modules (segmenter,
//! scoring, pipeline) must agree on them, so they live here rather than next to one user.

/// Weight of the embedding similarity in the fused score.
pub const SIMILARITY_WEIGHT: f32 = 0.3;
/// Weight of the LLM rerank score in the fused score.
pub const RERANK_WEIGHT: f32 = 0.7;

/// Confidence assigned to a chunk whose label came from a keyword rule.
pub const KEYWORD_CONFIDENCE: f32 = 0.9;
/// Both neighbours must exceed this confidence to be merged.
pub const MERGE_CONFIDENCE_THRESHOLD: f32 = 0.5;
/// Label used when no keyword rule matches.
pub const UNKNOWN_SECTION: &str = "Unknown";

/// Keyword confidence above which the enhanced pipeline skips embedding re-classification.
pub const TRUSTED_SECTION_CONFIDENCE: f32 = 0.7;
/// Minimum section score reported in the enhanced summary.
pub const SECTION_SUMMARY_MIN_SCORE: f32 = 0.3;
/// Minimum top score for a category to count as a key finding.
pub const KEY_FINDING_MIN_SCORE: f32 = 0.5;
/// Number of domains reported in the enhanced summary.
pub const PRIMARY_DOMAIN_LIMIT: usize = 5;

/// Default number of candidates per classification.
pub const DEFAULT_TOP_K: usize = 3;
/// Candidates requested by safety screening in the enhanced pipeline.
pub const SAFETY_TOP_K: usize = 3;

/// Preview lengths (characters) used in serialized results.
pub const FLAT_INPUT_PREVIEW_CHARS: usize = 500;
pub const ENHANCED_INPUT_PREVIEW_CHARS: usize = 300;
pub const SECTION_PREVIEW_CHARS: usize = 150;
pub const SPLIT_SUMMARY_PREVIEW_CHARS: usize = 100;

/// Default embedding dimension (Gemini `gemini-embedding-001` at reduced output size).
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Candidates considered when scoring top-k accuracy in evaluations.
pub const EVALUATION_TOP_K: usize = 3;
/// Characters of case text kept in evaluation reports.
pub const EVALUATION_PREVIEW_CHARS: usize = 50;

/// Truncates `text` to at most `max_chars` characters, appending `...` when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
