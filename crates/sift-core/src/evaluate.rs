//! Precision and recall at k over a labeled test file.
//!
//! Test files hold one example per line. Tokens that start with the label
//! prefix are the gold labels of that line; everything else is the text.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::error::{EvalError, PredictError};
use crate::model::Model;
use crate::text::{tokens, DecodedLines, EOS};

/// Aggregate scores of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Examples scored (lines with at least one label and one word)
    pub examples: usize,
    /// Requested number of labels per example
    pub k: usize,
    /// Predictions returned across all examples
    pub predictions: usize,
    /// Gold labels across all examples
    pub gold: usize,
    /// Predictions that matched a gold label
    pub correct: usize,
    /// `correct / predictions`
    pub precision: f64,
    /// `correct / gold`
    pub recall: f64,
}

impl Evaluation {
    /// Harmonic mean of precision and recall.
    pub fn f1(&self) -> f64 {
        if self.precision + self.recall == 0.0 {
            0.0
        } else {
            2.0 * self.precision * self.recall / (self.precision + self.recall)
        }
    }
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "N\t{}", self.examples)?;
        writeln!(f, "P@{}\t{:.3}", self.k, self.precision)?;
        write!(f, "R@{}\t{:.3}", self.k, self.recall)
    }
}

#[derive(Default)]
struct Tally {
    examples: usize,
    predictions: usize,
    gold: usize,
    correct: usize,
}

impl Model {
    /// Evaluate the model on the labeled file at `path`.
    pub fn evaluate(&self, path: impl AsRef<Path>, k: usize) -> Result<Evaluation, EvalError> {
        self.evaluate_with(path, k, 0.0, |_| {})
    }

    /// Evaluate with a probability threshold, reporting the byte length of each
    /// consumed line to `progress`.
    pub fn evaluate_with(
        &self,
        path: impl AsRef<Path>,
        k: usize,
        threshold: f64,
        progress: impl FnMut(u64),
    ) -> Result<Evaluation, EvalError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                EvalError::NotFound(path.to_path_buf())
            } else {
                EvalError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        self.evaluate_reader(BufReader::new(file), path, k, threshold, progress)
    }

    /// Evaluate examples read from `reader`. `origin` names the source in
    /// error messages.
    pub fn evaluate_reader<R: BufRead>(
        &self,
        reader: R,
        origin: &Path,
        k: usize,
        threshold: f64,
        mut progress: impl FnMut(u64),
    ) -> Result<Evaluation, EvalError> {
        if k == 0 {
            return Err(PredictError::InvalidArgument {
                arg: "k",
                message: "must be at least 1".into(),
            }
            .into());
        }

        let encoding = self
            .options()
            .text_encoding()
            .map_err(|e| EvalError::FormatError {
                path: origin.to_path_buf(),
                line: 0,
                message: e.to_string(),
            })?;
        let prefix = self.options().label_prefix.as_str();

        let mut tally = Tally::default();
        let mut line_no = 0;
        for line in DecodedLines::new(reader, encoding) {
            let line = line.map_err(|source| EvalError::Read {
                path: origin.to_path_buf(),
                source,
            })?;
            line_no = line.number;
            progress(line.bytes as u64);

            let line = line.text.ok_or_else(|| EvalError::FormatError {
                path: origin.to_path_buf(),
                line: line_no,
                message: format!("not valid {}", encoding.name()),
            })?;

            let mut gold: Vec<&str> = Vec::new();
            let mut has_words = false;
            for token in tokens(&line) {
                if let Some(label) = token.strip_prefix(prefix) {
                    if !gold.contains(&label) {
                        gold.push(label);
                    }
                } else if token != EOS {
                    has_words = true;
                }
            }
            if gold.is_empty() || !has_words {
                if !line.trim().is_empty() {
                    tracing::warn!(
                        "Skipping line {} of {:?}: needs at least one label and one word",
                        line_no,
                        origin
                    );
                }
                continue;
            }

            let predicted = self.predict_with_threshold(&line, k, threshold)?;
            let gold_set: HashSet<&str> = gold.iter().copied().collect();
            tally.examples += 1;
            tally.gold += gold.len();
            tally.predictions += predicted.len();
            tally.correct += predicted
                .iter()
                .filter(|p| gold_set.contains(p.label.as_str()))
                .count();
        }

        if tally.examples == 0 {
            return Err(EvalError::FormatError {
                path: origin.to_path_buf(),
                line: line_no,
                message: "no labeled examples".into(),
            });
        }

        let ratio = |num: usize, den: usize| {
            if den == 0 {
                0.0
            } else {
                num as f64 / den as f64
            }
        };
        let evaluation = Evaluation {
            examples: tally.examples,
            k,
            predictions: tally.predictions,
            gold: tally.gold,
            correct: tally.correct,
            precision: ratio(tally.correct, tally.predictions),
            recall: ratio(tally.correct, tally.gold),
        };
        tracing::debug!(
            "Evaluated {} examples from {:?}: P@{} {:.3}, R@{} {:.3}",
            evaluation.examples,
            origin,
            k,
            evaluation.precision,
            k,
            evaluation.recall
        );
        Ok(evaluation)
    }
}
