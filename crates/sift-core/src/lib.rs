//! Sift Core - embeddable supervised text classification.
//!
//! Sift loads a trained linear text classifier and labels raw text with
//! ranked `(label, probability)` pairs at line rate.
//!
//! # Architecture
//!
//! ```text
//! text → Tokenizer → Vocabulary (+ hashed n-grams) → Embedding average → Head → top-k
//! ```
//!
//! The head is either a flat softmax or a hierarchical softmax over a Huffman
//! tree, chosen by the loss the model was trained with.
//!
//! # Usage
//!
//! ```rust,no_run
//! fn main() -> sift_core::Result<()> {
//!     let model = sift_core::load_model("news.bin")?;
//!
//!     for p in model.predict("the election results are in", 2)? {
//!         println!("{} {:.3}", p.label, p.probability);
//!     }
//!
//!     let eval = model.evaluate("news.test", 1)?;
//!     println!("P@1 {:.3} R@1 {:.3}", eval.precision, eval.recall);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod classifier;
pub mod config;
pub mod error;
pub mod evaluate;
mod inference;
pub mod math;
pub mod model;
pub mod output;
pub mod text;
pub mod types;

// Re-exports for convenient access
pub use classifier::{Classifier, ModelState};
pub use config::Config;
pub use error::{ConfigError, EvalError, LoadError, LoadResult, PredictError, Result, SiftError};
pub use evaluate::Evaluation;
pub use model::{Loss, Model, ModelArgs, ModelInfo};
pub use output::{OutputFormat, OutputWriter};
pub use types::{Prediction, PredictionResult};

use std::path::Path;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Load a model with the default label prefix and encoding.
pub fn load_model(path: impl AsRef<Path>) -> LoadResult<Model> {
    Model::load(path)
}

/// Compile-time check that models can be shared across threads.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Model>();
    assert_send_sync::<Classifier>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_load_model_nonexistent() {
        let err = load_model("/nonexistent").unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }
}
