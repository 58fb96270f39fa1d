//! Inference: text → features → document vector → ranked labels.

use std::time::Instant;

use ndarray::Array1;

use crate::config::PredictConfig;
use crate::error::PredictError;
use crate::model::{hash, Model};
use crate::text::{normalize_line, tokens, EOS, MAX_LINE_TOKENS};
use crate::types::{Prediction, PredictionResult};

/// Feature rows of one document.
#[derive(Debug, Default)]
pub(crate) struct Features {
    pub rows: Vec<u32>,
    /// Whether any token other than end-of-sentence produced a row.
    pub has_content: bool,
}

impl Model {
    /// Collect the embedding rows that represent `text`.
    ///
    /// Label tokens are skipped. Word n-grams are built from the hashes of all
    /// remaining tokens, known or not.
    pub(crate) fn features(&self, text: &str) -> Features {
        let line = normalize_line(text);
        let prefix = self.options().label_prefix.as_str();
        let vocab = self.vocabulary();

        let mut features = Features::default();
        let mut hashes = Vec::new();
        let mut has_words = false;
        for token in tokens(&line)
            .filter(|t| !t.starts_with(prefix))
            .take(MAX_LINE_TOKENS)
        {
            let before = features.rows.len();
            vocab.push_features(token, &mut features.rows);
            if token != EOS {
                has_words = true;
                if features.rows.len() > before {
                    features.has_content = true;
                }
            }
            hashes.push(hash(token));
        }

        // Any word sits inside at least one word n-gram window.
        let before = features.rows.len();
        vocab.push_word_ngrams(&hashes, &mut features.rows);
        if has_words && features.rows.len() > before {
            features.has_content = true;
        }
        features
    }

    /// Document vector of `text`: the mean of its feature rows.
    pub fn text_vector(&self, text: &str) -> Vec<f32> {
        let features = self.features(text);
        self.embeddings().average(&features.rows).to_vec()
    }

    /// Vector of a single word: the mean of its id row and n-gram rows.
    ///
    /// Unknown words without subword features give the zero vector.
    pub fn word_vector(&self, word: &str) -> Vec<f32> {
        let mut rows = Vec::new();
        self.vocabulary().push_features(word, &mut rows);
        self.embeddings().average(&rows).to_vec()
    }

    /// Top-`k` labels for `text`, most probable first.
    ///
    /// `k` larger than the number of labels returns every label. Text with no
    /// usable tokens gives an empty list.
    pub fn predict(&self, text: &str, k: usize) -> Result<Vec<Prediction>, PredictError> {
        self.predict_with_threshold(text, k, 0.0)
    }

    /// Like [`Model::predict`], dropping labels below `threshold`.
    pub fn predict_with_threshold(
        &self,
        text: &str,
        k: usize,
        threshold: f64,
    ) -> Result<Vec<Prediction>, PredictError> {
        check_request(k, threshold)?;

        let features = self.features(text);
        if !features.has_content {
            return Ok(Vec::new());
        }

        let hidden: Array1<f32> = self.embeddings().average(&features.rows);
        let k = k.min(self.num_labels());
        let labels = self.labels();
        Ok(self
            .head()
            .top_k(hidden.view(), k, threshold)
            .into_iter()
            .map(|(id, probability)| Prediction::new(labels[id].as_str(), probability))
            .collect())
    }

    /// Predict every text in order on the calling thread.
    ///
    /// A failing item does not affect the others.
    pub fn predict_batch<S: AsRef<str>>(&self, texts: &[S], k: usize) -> Vec<PredictionResult> {
        texts
            .iter()
            .map(|t| self.predict(t.as_ref(), k))
            .collect()
    }

    /// Predict a batch using `options.k`, `options.threshold` and up to
    /// `options.workers` threads.
    ///
    /// Texts are split into contiguous chunks, one per worker, and results are
    /// returned in input order.
    pub fn predict_batch_with<S: AsRef<str> + Sync>(
        &self,
        texts: &[S],
        options: &PredictConfig,
    ) -> Vec<PredictionResult> {
        if texts.is_empty() {
            return Vec::new();
        }
        let start = Instant::now();
        let workers = options.workers.clamp(1, texts.len());
        let chunk_size = texts.len().div_ceil(workers);
        let run = |chunk: &[S]| -> Vec<PredictionResult> {
            chunk
                .iter()
                .map(|t| self.predict_with_threshold(t.as_ref(), options.k, options.threshold))
                .collect()
        };
        let run = &run;

        let results: Vec<PredictionResult> = if workers == 1 {
            run(texts)
        } else {
            std::thread::scope(|scope| {
                let handles: Vec<_> = texts
                    .chunks(chunk_size)
                    .map(|chunk| scope.spawn(move || run(chunk)))
                    .collect();
                handles
                    .into_iter()
                    .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                    .collect()
            })
        };

        tracing::debug!(
            "Predicted {} texts on {} worker(s) in {:.1}ms",
            texts.len(),
            workers,
            start.elapsed().as_secs_f64() * 1000.0
        );
        results
    }
}

fn check_request(k: usize, threshold: f64) -> Result<(), PredictError> {
    if k == 0 {
        return Err(PredictError::InvalidArgument {
            arg: "k",
            message: "must be at least 1".into(),
        });
    }
    if !(0.0..=1.0).contains(&threshold) {
        return Err(PredictError::InvalidArgument {
            arg: "threshold",
            message: format!("must be between 0.0 and 1.0, got {threshold}"),
        });
    }
    Ok(())
}
