//! Post-similarity scoring stages.
//!
//! - [`RerankFuser`] blends LLM rerank scores into the similarity ranking.
//! - [`AttributeValidator`] checks the top candidate against its class's required
//!   conditions.
//!
//! Both stages fail open: whatever goes wrong, the similarity result survives and the
//! returned status says which degraded path was taken.

pub mod fuser;
pub mod types;
pub mod validator;


pub use fuser::{RerankFuser, apply_rerank_scores};
pub use types::{AttributeValidation, Candidate, RerankStatus, ValidationStatus};
pub use validator::AttributeValidator;
