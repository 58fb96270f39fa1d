//! Error types for the Sift classification engine.
//!
//! Errors are organized by stage (load, predict, evaluate) so callers can tell
//! a broken artifact apart from a bad request. Each variant carries the path or
//! the expected/actual values that explain what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Sift operations.
#[derive(Error, Debug)]
pub enum SiftError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model loading errors
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Prediction errors
    #[error("Predict error: {0}")]
    Predict(#[from] PredictError),

    /// Evaluation errors
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while reading or assembling a model.
///
/// A failed load never produces a partially usable model.
#[derive(Error, Debug)]
pub enum LoadError {
    /// No file at the given path
    #[error("Model file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read
    #[error("Failed to read model {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Magic, version, header, checksum or payload length is wrong
    #[error("Corrupt model file {}: {message}", path.display())]
    CorruptFormat { path: PathBuf, message: String },

    /// Declared matrix shapes disagree with the hyperparameters
    #[error("Dimension mismatch in {what}: expected {expected}, found {actual}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// In-memory model parts are inconsistent (not tied to a file)
    #[error("Invalid model parts: {0}")]
    InvalidParts(String),
}

/// Errors raised by prediction requests.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// The classifier has no model loaded (never loaded, or released)
    #[error("No model loaded")]
    NotLoaded,

    /// A request argument is out of range
    #[error("Invalid argument `{arg}`: {message}")]
    InvalidArgument { arg: &'static str, message: String },
}

/// Errors raised while evaluating a labeled test file.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Test file does not exist
    #[error("Test file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Test file exists but could not be read
    #[error("Failed to read test file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file content is not a usable labeled test set
    #[error("Bad test file {} (line {line}): {message}", path.display())]
    FormatError {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The underlying prediction failed
    #[error(transparent)]
    Predict(#[from] PredictError),
}

/// Convenience type alias for Sift results.
pub type Result<T> = std::result::Result<T, SiftError>;

/// Convenience type alias for load results.
pub type LoadResult<T> = std::result::Result<T, LoadError>;
