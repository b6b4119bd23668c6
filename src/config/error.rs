//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Integer setting could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    IntParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Floating-point setting could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    FloatParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Parsed value is outside its accepted range.
    #[error("invalid {name} '{value}': {reason}")]
    OutOfRange {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
