//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where trained models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.sift/models"),
        }
    }
}

/// How a loaded model reads its input.
///
/// These are fixed when a model is loaded and travel with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Marker that distinguishes label tokens from words in raw text
    pub label_prefix: String,

    /// Encoding of text files fed to `test` and `predict`
    pub encoding: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            label_prefix: "__label__".to_string(),
            encoding: "utf-8".to_string(),
        }
    }
}

/// Prediction defaults used when a request leaves them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictConfig {
    /// Number of labels to return per text
    pub k: usize,

    /// Minimum probability for a label to be reported.
    /// 0.0 disables filtering.
    pub threshold: f64,

    /// Worker threads for batch prediction
    pub workers: usize,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            k: 1,
            threshold: 0.0,
            workers: 4,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("text", "json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
