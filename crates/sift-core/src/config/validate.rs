//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::output::OutputFormat;

use super::{Config, ModelConfig};

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate()?;

        if self.predict.k == 0 {
            return Err(ConfigError::ValidationError(
                "predict.k must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.predict.threshold) {
            return Err(ConfigError::ValidationError(
                "predict.threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.predict.workers == 0 {
            return Err(ConfigError::ValidationError(
                "predict.workers must be > 0".into(),
            ));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be one of text, json, jsonl (got {:?})",
                self.output.format
            )));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {} (got {:?})",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }
        if self.logging.format != "pretty" && self.logging.format != "json" {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}

impl ModelConfig {
    /// Check the label prefix and resolve the encoding label.
    ///
    /// Only ASCII-compatible encodings are accepted: the tokenizer splits on
    /// ASCII whitespace, which is meaningless in UTF-16.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.label_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "model.label_prefix must not be empty".into(),
            ));
        }
        if self.label_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::ValidationError(
                "model.label_prefix must not contain whitespace".into(),
            ));
        }
        self.text_encoding().map(|_| ())
    }

    /// The `encoding_rs` encoding named by `encoding`.
    pub fn text_encoding(&self) -> Result<&'static encoding_rs::Encoding, ConfigError> {
        let encoding = encoding_rs::Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "model.encoding {:?} is not a known encoding",
                    self.encoding
                ))
            })?;
        if !encoding.is_ascii_compatible() {
            return Err(ConfigError::ValidationError(format!(
                "model.encoding {:?} is not ASCII-compatible",
                self.encoding
            )));
        }
        Ok(encoding)
    }
}
