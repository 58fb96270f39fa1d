//! Hyperparameters stored with every model.

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, LoadResult};

/// Loss the model was trained with. Selects the classifier head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    /// Flat softmax over all labels
    Softmax,
    /// Negative sampling. Scored with a flat softmax at inference time.
    NegativeSampling,
    /// Huffman-coded binary tree over labels
    HierarchicalSoftmax,
}

impl Loss {
    /// Whether this loss uses the tree-structured head.
    pub fn is_hierarchical(self) -> bool {
        matches!(self, Loss::HierarchicalSoftmax)
    }
}

impl std::fmt::Display for Loss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Loss::Softmax => write!(f, "softmax"),
            Loss::NegativeSampling => write!(f, "negative_sampling"),
            Loss::HierarchicalSoftmax => write!(f, "hierarchical_softmax"),
        }
    }
}

/// Model hyperparameters, parsed once at load and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelArgs {
    /// Embedding dimension
    pub dim: usize,

    /// Shortest character n-gram
    pub minn: usize,

    /// Longest character n-gram. 0 disables character n-grams.
    pub maxn: usize,

    /// Longest word n-gram. 1 means unigrams only.
    pub word_ngrams: usize,

    /// Number of hashed bucket rows after the vocabulary rows
    pub bucket: usize,

    /// Training loss
    pub loss: Loss,
}

impl ModelArgs {
    /// Unigram model without hashed features.
    pub fn new(dim: usize, loss: Loss) -> Self {
        Self {
            dim,
            minn: 0,
            maxn: 0,
            word_ngrams: 1,
            bucket: 0,
            loss,
        }
    }

    /// Enable character n-grams of length `minn..=maxn`.
    pub fn with_char_ngrams(mut self, minn: usize, maxn: usize) -> Self {
        self.minn = minn;
        self.maxn = maxn;
        self
    }

    /// Enable word n-grams up to length `n`.
    pub fn with_word_ngrams(mut self, n: usize) -> Self {
        self.word_ngrams = n;
        self
    }

    /// Set the number of hashed bucket rows.
    pub fn with_bucket(mut self, bucket: usize) -> Self {
        self.bucket = bucket;
        self
    }

    /// Character n-grams are active.
    pub fn char_ngrams_enabled(&self) -> bool {
        self.maxn > 0 && self.minn <= self.maxn && self.bucket > 0
    }

    /// Word n-grams are active.
    pub fn word_ngrams_enabled(&self) -> bool {
        self.word_ngrams > 1 && self.bucket > 0
    }

    pub(crate) fn validate(&self) -> LoadResult<()> {
        if self.dim == 0 {
            return Err(LoadError::InvalidParts("dim must be > 0".into()));
        }
        if self.word_ngrams == 0 {
            return Err(LoadError::InvalidParts("word_ngrams must be > 0".into()));
        }
        if self.bucket > u32::MAX as usize {
            return Err(LoadError::InvalidParts(format!(
                "bucket {} does not fit a 32-bit index",
                self.bucket
            )));
        }
        Ok(())
    }
}
