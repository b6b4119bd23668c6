//! Scribe library crate: section, symptom-domain and safety classification of psychiatric
//! clinical notes.
//!
//! # Public API Surface
//!
//! ## Entry point
//! - [`Scribe`] - composition root; [`Scribe::from_config`] builds real capabilities and
//!   loads label sets, [`Scribe::new`] takes injected ones.
//! - [`Config`], [`ConfigError`] - environment configuration.
//!
//! ## Classification
//! - [`ClassificationEngine`], [`ClassifyOptions`], [`ClassificationResult`]
//! - [`LabelRegistry`], [`LabelSet`], [`EmbeddingTable`], [`AttributeSet`]
//! - [`RerankFuser`], [`AttributeValidator`] - LLM stages with fail-open behavior.
//!
//! ## Note processing
//! - [`SectionSplitter`], [`NoteSection`] - keyword segmentation.
//! - [`PipelineProcessor`] (flat) and [`EnhancedPipelineProcessor`] (per section).
//!
//! ## Evaluation
//! - [`evaluate`], [`EvaluationReport`] - top-1/top-3 accuracy over labelled texts.
//!
//! ## Capabilities
//! - [`Embedder`] with [`GeminiEmbedder`], [`CachedEmbedder`]; chosen by [`build_embedder`].
//! - [`RerankProvider`], [`ValidationProvider`] with [`GenaiLlm`] and [`NoopLlm`]; chosen by
//!   [`build_llm`].
//!
//! ## Test/Mock Support
//! Mock capabilities are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod app;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod evaluation;
pub mod hashing;
pub mod labels;
pub mod llm;
pub mod pipeline;
pub mod ranking;
pub mod scoring;
pub mod segmenter;
pub mod telemetry;

pub use app::{LabelStorage, Scribe, ScribeParts};
pub use classifier::{
    ClassificationEngine, ClassificationResult, ClassifyError, ClassifyOptions, EngineParts,
};
pub use config::{Config, ConfigError};
pub use embedding::{
    CachedEmbedder, Embedder, EmbeddingError, GeminiEmbedder, GeminiEmbedderConfig,
    UnavailableEmbedder, build_embedder,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use evaluation::{CaseResult, EvaluationReport, builtin_cases, evaluate};
pub use hashing::{hash_embedding_key, hash_text};
pub use labels::{
    AttributeSet, ClassDefinition, EmbeddingTable, LabelError, LabelRegistry, LabelSet,
    LabelSetSummary, LoadedLabelSet,
};
pub use llm::{
    GenaiLlm, GenaiLlmConfig, LlmError, LlmProviders, NoopLlm, RerankProvider, ValidationProvider,
    build_llm,
};
#[cfg(any(test, feature = "mock"))]
pub use llm::{MockReranker, MockValidator};
pub use pipeline::{
    Category, EnhancedPipelineProcessor, EnhancedPipelineResult, ErrorPayload, OverallSafety,
    PipelineError, PipelineOptions, PipelineProcessor, PipelineResult, SafetyStatus,
};
pub use ranking::{RankedClass, cosine_similarity, rank};
pub use scoring::{
    AttributeValidation, AttributeValidator, Candidate, RerankFuser, RerankStatus,
    ValidationStatus,
};
pub use segmenter::{KeywordMatch, NoteSection, SectionSplitter};
pub use telemetry::init_tracing;
