//! Stateful classifier handle with an explicit load/release lifecycle.
//!
//! ```text
//! Unloaded ──load──▶ Loaded ──release──▶ Released
//!                      ▲                    │
//!                      └──────load──────────┘
//! ```
//!
//! A failed load leaves the current state untouched.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{EvalError, LoadResult, PredictError};
use crate::evaluate::Evaluation;
use crate::model::Model;
use crate::types::{Prediction, PredictionResult};

/// Lifecycle state of a [`Classifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loaded,
    Released,
}

#[derive(Debug)]
enum Slot {
    Unloaded,
    Loaded(Arc<Model>),
    Released,
}

/// Owns at most one model and applies configured defaults to requests.
#[derive(Debug)]
pub struct Classifier {
    config: Config,
    slot: Slot,
}

impl Classifier {
    /// Create an unloaded classifier.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            slot: Slot::Unloaded,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> ModelState {
        match self.slot {
            Slot::Unloaded => ModelState::Unloaded,
            Slot::Loaded(_) => ModelState::Loaded,
            Slot::Released => ModelState::Released,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.slot, Slot::Loaded(_))
    }

    /// Load the model at `path`, replacing any current model.
    pub fn load(&mut self, path: impl AsRef<Path>) -> LoadResult<()> {
        let model = Model::load_with(path, self.config.model.clone())?;
        self.slot = Slot::Loaded(Arc::new(model));
        Ok(())
    }

    /// Drop this handle's reference to the model.
    ///
    /// Clones returned by [`Classifier::model`] stay valid until they are dropped.
    pub fn release(&mut self) {
        if self.is_loaded() {
            tracing::debug!("Releasing model");
            self.slot = Slot::Released;
        }
    }

    /// Shared handle to the loaded model.
    pub fn model(&self) -> Result<Arc<Model>, PredictError> {
        match &self.slot {
            Slot::Loaded(model) => Ok(Arc::clone(model)),
            Slot::Unloaded | Slot::Released => Err(PredictError::NotLoaded),
        }
    }

    fn loaded(&self) -> Result<&Model, PredictError> {
        match &self.slot {
            Slot::Loaded(model) => Ok(model.as_ref()),
            Slot::Unloaded | Slot::Released => Err(PredictError::NotLoaded),
        }
    }

    /// Top-`k` labels for `text`, filtered by the configured threshold.
    pub fn predict(&self, text: &str, k: usize) -> Result<Vec<Prediction>, PredictError> {
        self.loaded()?
            .predict_with_threshold(text, k, self.config.predict.threshold)
    }

    /// Predict a batch with the configured threshold and worker count.
    ///
    /// Without a model every item fails with [`PredictError::NotLoaded`].
    pub fn predict_batch<S: AsRef<str> + Sync>(
        &self,
        texts: &[S],
        k: usize,
    ) -> Vec<PredictionResult> {
        match self.loaded() {
            Ok(model) => {
                let options = crate::config::PredictConfig {
                    k,
                    ..self.config.predict.clone()
                };
                model.predict_batch_with(texts, &options)
            }
            Err(e) => texts.iter().map(|_| Err(e.clone())).collect(),
        }
    }

    /// Precision and recall at `k` on a labeled file.
    pub fn evaluate(&self, path: impl AsRef<Path>, k: usize) -> Result<Evaluation, EvalError> {
        self.loaded()?
            .evaluate_with(path, k, self.config.predict.threshold, |_| {})
    }
}
