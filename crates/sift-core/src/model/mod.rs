//! Trained classification models.
//!
//! A [`Model`] bundles the vocabulary, the input embedding table and the
//! classifier head with the hyperparameters they were trained under. It is
//! immutable once built and can be shared freely between threads.

mod args;
mod embedding;
pub mod format;
pub mod head;
mod vocabulary;

pub use args::{Loss, ModelArgs};
pub use embedding::EmbeddingTable;
pub use head::{ClassifierHead, FlatSoftmax, HierarchicalSoftmax};
pub use vocabulary::{hash, Entry, Vocabulary};

use std::path::Path;

use ndarray::Array2;
use serde::Serialize;

use crate::config::ModelConfig;
use crate::error::{LoadError, LoadResult};

/// A loaded classifier.
#[derive(Debug)]
pub struct Model {
    args: ModelArgs,
    options: ModelConfig,
    vocabulary: Vocabulary,
    embeddings: EmbeddingTable,
    head: Box<dyn ClassifierHead>,
    /// Label names with the label prefix removed, indexed by label id.
    label_names: Vec<String>,
}

/// Summary of a model for display.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub args: ModelArgs,
    pub words: usize,
    pub labels: usize,
    pub input_rows: usize,
    pub output_rows: usize,
    pub label_prefix: String,
}

impl std::fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "dim          {}", self.args.dim)?;
        writeln!(f, "loss         {}", self.args.loss)?;
        writeln!(f, "char ngrams  {}..={}", self.args.minn, self.args.maxn)?;
        writeln!(f, "word ngrams  {}", self.args.word_ngrams)?;
        writeln!(f, "bucket       {}", self.args.bucket)?;
        writeln!(f, "words        {}", self.words)?;
        writeln!(f, "labels       {}", self.labels)?;
        writeln!(
            f,
            "matrices     input {}x{}, output {}x{}",
            self.input_rows, self.args.dim, self.output_rows, self.args.dim
        )?;
        write!(f, "label prefix {}", self.label_prefix)
    }
}

impl Model {
    /// Load a model with the default label prefix and encoding.
    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        Self::load_with(path, ModelConfig::default())
    }

    /// Load a model, reading its input with the given options.
    ///
    /// The file is read and checked in full before anything is returned.
    pub fn load_with(path: impl AsRef<Path>, options: ModelConfig) -> LoadResult<Self> {
        let path = path.as_ref();
        let raw = format::read(path)?;
        let model = Self::from_parts(
            raw.args,
            raw.words,
            raw.labels,
            raw.input,
            raw.output,
            options,
        )
        .map_err(|e| match e {
            // Inconsistent parts read from disk mean the file is bad.
            LoadError::InvalidParts(message) => LoadError::CorruptFormat {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        tracing::info!(
            "Loaded model {:?}: {} words, {} labels, dim {}, {}",
            path,
            model.vocabulary.nwords(),
            model.num_labels(),
            model.dimension(),
            model.args.loss
        );
        Ok(model)
    }

    /// Assemble a model from trained weights.
    ///
    /// `input` must be `(words + bucket) × dim`. `output` must be
    /// `labels × dim`, or `(labels - 1) × dim` for hierarchical softmax.
    pub fn from_parts(
        args: ModelArgs,
        words: Vec<Entry>,
        labels: Vec<Entry>,
        input: Array2<f32>,
        output: Array2<f32>,
        options: ModelConfig,
    ) -> LoadResult<Self> {
        args.validate()?;
        options
            .validate()
            .map_err(|e| LoadError::InvalidParts(e.to_string()))?;

        let vocabulary = Vocabulary::new(words, labels, &args)?;

        check_dim("input matrix rows", vocabulary.nwords() + args.bucket, input.nrows())?;
        check_dim("input matrix columns", args.dim, input.ncols())?;
        check_dim(
            "output matrix rows",
            head::expected_output_rows(args.loss, vocabulary.nlabels()),
            output.nrows(),
        )?;
        check_dim("output matrix columns", args.dim, output.ncols())?;

        let counts: Vec<u64> = vocabulary.labels().iter().map(|e| e.count).collect();
        let head = head::build(args.loss, output, &counts);
        let label_names = vocabulary
            .labels()
            .iter()
            .map(|e| {
                e.token
                    .strip_prefix(options.label_prefix.as_str())
                    .unwrap_or(&e.token)
                    .to_string()
            })
            .collect();

        Ok(Self {
            args,
            options,
            vocabulary,
            embeddings: EmbeddingTable::new(input),
            head,
            label_names,
        })
    }

    /// Write the model to `path` in the binary model format.
    pub fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();
        let bytes = format::encode(
            &self.args,
            self.vocabulary.words(),
            self.vocabulary.labels(),
            self.embeddings.weights().view(),
            self.head.weights().view(),
        )?;
        std::fs::write(path, &bytes)?;
        tracing::info!(
            "Saved model to {:?} ({:.1} MB)",
            path,
            bytes.len() as f64 / 1_000_000.0
        );
        Ok(())
    }

    pub fn args(&self) -> &ModelArgs {
        &self.args
    }

    /// Label prefix and encoding this model was loaded with.
    pub fn options(&self) -> &ModelConfig {
        &self.options
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn embeddings(&self) -> &EmbeddingTable {
        &self.embeddings
    }

    pub fn head(&self) -> &dyn ClassifierHead {
        self.head.as_ref()
    }

    /// Embedding dimension.
    pub fn dimension(&self) -> usize {
        self.args.dim
    }

    pub fn num_labels(&self) -> usize {
        self.head.num_labels()
    }

    /// Label names (prefix removed) in label-id order.
    pub fn labels(&self) -> &[String] {
        &self.label_names
    }

    pub fn words(&self) -> &[Entry] {
        self.vocabulary.words()
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            args: self.args.clone(),
            words: self.vocabulary.nwords(),
            labels: self.num_labels(),
            input_rows: self.embeddings.rows(),
            output_rows: self.head.weights().nrows(),
            label_prefix: self.options.label_prefix.clone(),
        }
    }
}

fn check_dim(what: &str, expected: usize, actual: usize) -> LoadResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(LoadError::DimensionMismatch {
            what: what.to_string(),
            expected,
            actual,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use ndarray::array;

    fn parts(
        args: ModelArgs,
        input: Array2<f32>,
        output: Array2<f32>,
    ) -> LoadResult<Model> {
        Model::from_parts(
            args,
            vec![Entry::new("a", 1), Entry::new("b", 1)],
            vec![Entry::new("__label__x", 1), Entry::new("__label__y", 1)],
            input,
            output,
            ModelConfig::default(),
        )
    }

    #[test]
    fn test_labels_are_stripped() {
        let model = sports_politics();
        assert_eq!(model.labels(), &["sports".to_string(), "politics".to_string()]);
        assert_eq!(model.num_labels(), 2);
        assert_eq!(model.dimension(), 2);
    }

    #[test]
    fn test_custom_prefix_strips_only_that_prefix() {
        let options = ModelConfig {
            label_prefix: "#".into(),
            ..ModelConfig::default()
        };
        let model = Model::from_parts(
            ModelArgs::new(1, Loss::Softmax),
            vec![Entry::new("w", 1)],
            vec![Entry::new("#tag", 1), Entry::new("plain", 1)],
            array![[1.0]],
            array![[1.0], [0.0]],
            options,
        )
        .unwrap();
        assert_eq!(model.labels(), &["tag".to_string(), "plain".to_string()]);
    }

    #[test]
    fn test_input_rows_must_cover_buckets() {
        let args = ModelArgs::new(2, Loss::Softmax)
            .with_char_ngrams(2, 3)
            .with_bucket(5);
        let err = parts(args, Array2::zeros((2, 2)), Array2::zeros((2, 2))).unwrap_err();
        match err {
            LoadError::DimensionMismatch {
                what,
                expected,
                actual,
            } => {
                assert_eq!(what, "input matrix rows");
                assert_eq!(expected, 7);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_column_mismatch() {
        let args = ModelArgs::new(3, Loss::Softmax);
        let err = parts(args, Array2::zeros((2, 2)), Array2::zeros((2, 3))).unwrap_err();
        assert!(matches!(err, LoadError::DimensionMismatch { .. }));
        assert!(err.to_string().contains("input matrix columns"));
    }

    #[test]
    fn test_hierarchical_output_rows() {
        let args = ModelArgs::new(2, Loss::HierarchicalSoftmax);
        assert!(parts(args.clone(), Array2::zeros((2, 2)), Array2::zeros((1, 2))).is_ok());
        let err = parts(args, Array2::zeros((2, 2)), Array2::zeros((2, 2))).unwrap_err();
        assert!(err.to_string().contains("output matrix rows"));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = ModelConfig {
            encoding: "utf-16be".into(),
            ..ModelConfig::default()
        };
        let err = Model::from_parts(
            ModelArgs::new(1, Loss::Softmax),
            vec![],
            vec![Entry::new("__label__x", 1)],
            Array2::zeros((0, 1)),
            Array2::zeros((1, 1)),
            options,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidParts(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let model = sports_politics_hs();
        model.save(&path).unwrap();

        let loaded = Model::load(&path).unwrap();
        assert_eq!(loaded.args(), model.args());
        assert_eq!(loaded.words(), model.words());
        assert_eq!(loaded.labels(), model.labels());
        assert_eq!(loaded.embeddings().weights(), model.embeddings().weights());
        assert_eq!(loaded.head().weights(), model.head().weights());
    }

    #[test]
    fn test_load_nonexistent() {
        let err = Model::load("/nonexistent").unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_load_reports_bad_shapes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        let bytes = format::encode(
            &ModelArgs::new(4, Loss::Softmax),
            &[Entry::new("a", 1)],
            &[Entry::new("__label__x", 1)],
            Array2::<f32>::zeros((1, 3)).view(),
            Array2::<f32>::zeros((1, 4)).view(),
        )
        .unwrap();
        std::fs::write(&path, bytes).unwrap();

        let err = Model::load(&path).unwrap_err();
        assert!(matches!(
            err,
            LoadError::DimensionMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_words_on_disk_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.bin");
        let bytes = format::encode(
            &ModelArgs::new(1, Loss::Softmax),
            &[Entry::new("a", 1), Entry::new("a", 1)],
            &[Entry::new("__label__x", 1)],
            Array2::<f32>::zeros((2, 1)).view(),
            Array2::<f32>::zeros((1, 1)).view(),
        )
        .unwrap();
        std::fs::write(&path, bytes).unwrap();

        let err = Model::load(&path).unwrap_err();
        assert!(matches!(err, LoadError::CorruptFormat { .. }));
    }

    #[test]
    fn test_info() {
        let info = sports_politics().info();
        assert_eq!(info.words, 2);
        assert_eq!(info.labels, 2);
        assert_eq!(info.input_rows, 2);
        assert!(info.to_string().contains("softmax"));
    }
}
