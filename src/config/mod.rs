//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `SCRIBE_*` environment variables; the API
//! key is also read from the conventional `GEMINI_API_KEY`.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_EMBEDDING_DIM, DEFAULT_TOP_K};

/// Default chat model for reranking and attribute validation.
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash-exp";
/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";
/// Label sets processed by the note pipelines unless overridden.
pub const DEFAULT_LABEL_SET_IDS: [&str; 3] =
    ["psychiatry_sections", "psychiatry_domains", "psychiatry_safety"];

/// Runtime configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SCRIBE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `{id}.json` and `{id}_attributes.json`. Default: `./data/datasets`.
    pub datasets_dir: PathBuf,

    /// Directory holding `{id}_embeddings.json`. Default: `./data/embeddings`.
    pub embeddings_dir: PathBuf,

    /// Label sets loaded at startup (comma-separated in the environment).
    pub label_set_ids: Vec<String>,

    /// Gemini API key. Without one, embeddings and LLM stages are unavailable.
    pub gemini_api_key: Option<String>,

    /// Fallback chat model. Default: `gemini-2.0-flash-exp`.
    pub llm_model: String,

    /// Chat model used for reranking. Default: [`Config::llm_model`].
    pub rerank_model: String,

    /// Chat model used for attribute validation. Default: [`Config::llm_model`].
    pub validation_model: String,

    /// Sampling temperature for both LLM stages. Default: `0.1`.
    pub llm_temperature: f64,

    /// Max output tokens for both LLM stages. Default: `1000`.
    pub llm_max_tokens: u32,

    /// Embedding model name. Default: `gemini-embedding-001`.
    pub embedding_model: String,

    /// Embedding output dimension. Default: `768`.
    pub embedding_dim: usize,

    /// Upper bound on one rerank call. Default: 20s.
    pub rerank_timeout: Duration,

    /// Upper bound on one validation call. Default: 20s.
    pub validation_timeout: Duration,

    /// Upper bound on one embedding call. Default: 30s.
    pub embed_timeout: Duration,

    /// Max cached query embeddings (`0` disables the cache). Default: `10_000`.
    pub embedding_cache_capacity: u64,

    /// Candidates returned per classification. Default: `3`.
    pub default_top_k: usize,

    /// Embed class descriptions when a label set has no embeddings file. Default: `false`.
    pub generate_missing_embeddings: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            datasets_dir: PathBuf::from("./data/datasets"),
            embeddings_dir: PathBuf::from("./data/embeddings"),
            label_set_ids: DEFAULT_LABEL_SET_IDS.iter().map(|s| s.to_string()).collect(),
            gemini_api_key: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            rerank_model: DEFAULT_LLM_MODEL.to_string(),
            validation_model: DEFAULT_LLM_MODEL.to_string(),
            llm_temperature: 0.1,
            llm_max_tokens: 1000,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            rerank_timeout: Duration::from_secs(20),
            validation_timeout: Duration::from_secs(20),
            embed_timeout: Duration::from_secs(30),
            embedding_cache_capacity: 10_000,
            default_top_k: DEFAULT_TOP_K,
            generate_missing_embeddings: false,
        }
    }
}

impl Config {
    const ENV_DATASETS_DIR: &'static str = "SCRIBE_DATASETS_DIR";
    const ENV_EMBEDDINGS_DIR: &'static str = "SCRIBE_EMBEDDINGS_DIR";
    const ENV_LABEL_SETS: &'static str = "SCRIBE_LABEL_SETS";
    const ENV_API_KEY: &'static str = "SCRIBE_GEMINI_API_KEY";
    const ENV_API_KEY_FALLBACK: &'static str = "GEMINI_API_KEY";
    const ENV_LLM_MODEL: &'static str = "SCRIBE_LLM_MODEL";
    const ENV_RERANK_MODEL: &'static str = "SCRIBE_RERANK_MODEL";
    const ENV_VALIDATION_MODEL: &'static str = "SCRIBE_VALIDATION_MODEL";
    const ENV_LLM_TEMPERATURE: &'static str = "SCRIBE_LLM_TEMPERATURE";
    const ENV_LLM_MAX_TOKENS: &'static str = "SCRIBE_LLM_MAX_TOKENS";
    const ENV_EMBEDDING_MODEL: &'static str = "SCRIBE_EMBEDDING_MODEL";
    const ENV_EMBEDDING_DIM: &'static str = "SCRIBE_EMBEDDING_DIM";
    const ENV_RERANK_TIMEOUT_MS: &'static str = "SCRIBE_RERANK_TIMEOUT_MS";
    const ENV_VALIDATION_TIMEOUT_MS: &'static str = "SCRIBE_VALIDATION_TIMEOUT_MS";
    const ENV_EMBED_TIMEOUT_MS: &'static str = "SCRIBE_EMBED_TIMEOUT_MS";
    const ENV_EMBEDDING_CACHE: &'static str = "SCRIBE_EMBEDDING_CACHE_CAPACITY";
    const ENV_TOP_K: &'static str = "SCRIBE_TOP_K";
    const ENV_GENERATE_EMBEDDINGS: &'static str = "SCRIBE_GENERATE_EMBEDDINGS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let llm_model = Self::parse_string_from_env(Self::ENV_LLM_MODEL, defaults.llm_model);
        let rerank_model = Self::parse_string_from_env(Self::ENV_RERANK_MODEL, llm_model.clone());
        let validation_model =
            Self::parse_string_from_env(Self::ENV_VALIDATION_MODEL, llm_model.clone());

        let gemini_api_key = Self::parse_optional_string_from_env(Self::ENV_API_KEY)
            .or_else(|| Self::parse_optional_string_from_env(Self::ENV_API_KEY_FALLBACK));

        let label_set_ids = match Self::parse_optional_string_from_env(Self::ENV_LABEL_SETS) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.label_set_ids,
        };

        let llm_temperature = match env::var(Self::ENV_LLM_TEMPERATURE) {
            Ok(value) => value
                .trim()
                .parse::<f64>()
                .map_err(|e| ConfigError::FloatParseError {
                    name: Self::ENV_LLM_TEMPERATURE,
                    value: value.clone(),
                    source: e,
                })?,
            Err(_) => defaults.llm_temperature,
        };

        Ok(Self {
            datasets_dir: Self::parse_path_from_env(Self::ENV_DATASETS_DIR, defaults.datasets_dir),
            embeddings_dir: Self::parse_path_from_env(
                Self::ENV_EMBEDDINGS_DIR,
                defaults.embeddings_dir,
            ),
            label_set_ids,
            gemini_api_key,
            llm_model,
            rerank_model,
            validation_model,
            llm_temperature,
            llm_max_tokens: Self::parse_num_from_env(
                Self::ENV_LLM_MAX_TOKENS,
                defaults.llm_max_tokens,
            )?,
            embedding_model: Self::parse_string_from_env(
                Self::ENV_EMBEDDING_MODEL,
                defaults.embedding_model,
            ),
            embedding_dim: Self::parse_num_from_env(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim)?,
            rerank_timeout: Self::parse_millis_from_env(
                Self::ENV_RERANK_TIMEOUT_MS,
                defaults.rerank_timeout,
            )?,
            validation_timeout: Self::parse_millis_from_env(
                Self::ENV_VALIDATION_TIMEOUT_MS,
                defaults.validation_timeout,
            )?,
            embed_timeout: Self::parse_millis_from_env(
                Self::ENV_EMBED_TIMEOUT_MS,
                defaults.embed_timeout,
            )?,
            embedding_cache_capacity: Self::parse_num_from_env(
                Self::ENV_EMBEDDING_CACHE,
                defaults.embedding_cache_capacity,
            )?,
            default_top_k: Self::parse_num_from_env(Self::ENV_TOP_K, defaults.default_top_k)?,
            generate_missing_embeddings: Self::parse_bool_from_env(
                Self::ENV_GENERATE_EMBEDDINGS,
                defaults.generate_missing_embeddings,
            ),
        })
    }

    /// Validates paths and numeric ranges (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for dir in [&self.datasets_dir, &self.embeddings_dir] {
            if dir.exists() && !dir.is_dir() {
                return Err(ConfigError::NotADirectory { path: dir.clone() });
            }
        }

        if !self.datasets_dir.exists() {
            return Err(ConfigError::PathNotFound {
                path: self.datasets_dir.clone(),
            });
        }

        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(ConfigError::OutOfRange {
                name: "llm_temperature",
                value: self.llm_temperature.to_string(),
                reason: "must be between 0.0 and 2.0",
            });
        }

        if self.embedding_dim == 0 {
            return Err(ConfigError::OutOfRange {
                name: "embedding_dim",
                value: "0".to_string(),
                reason: "must be positive",
            });
        }

        if self.default_top_k == 0 {
            return Err(ConfigError::OutOfRange {
                name: "default_top_k",
                value: "0".to_string(),
                reason: "must be positive",
            });
        }

        if self.label_set_ids.is_empty() {
            return Err(ConfigError::OutOfRange {
                name: "label_set_ids",
                value: String::new(),
                reason: "at least one label set is required",
            });
        }

        Ok(())
    }

    /// `true` when an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.gemini_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        Self::parse_optional_string_from_env(var_name).unwrap_or(default)
    }

    fn parse_num_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e| ConfigError::IntParseError {
                    name: var_name,
                    value,
                    source: e,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_millis_from_env(
        var_name: &'static str,
        default: Duration,
    ) -> Result<Duration, ConfigError> {
        let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
        Self::parse_num_from_env(var_name, default_ms).map(Duration::from_millis)
    }

    fn parse_bool_from_env(var_name: &str, default: bool) -> bool {
        match env::var(var_name) {
            Ok(value) => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
            Err(_) => default,
        }
    }
}
