//! Core data types produced by inference.

use serde::{Deserialize, Serialize};

/// One ranked label with its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Label name, without the label prefix
    pub label: String,

    /// Probability in `[0, 1]`
    pub probability: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:.6}", self.label, self.probability)
    }
}

/// Outcome of one prediction inside a batch.
pub type PredictionResult = Result<Vec<Prediction>, crate::error::PredictError>;
