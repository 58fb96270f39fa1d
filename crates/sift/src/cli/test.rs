//! The `sift test` command: precision and recall at k.

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use sift_core::{Config, Evaluation, Model};

use super::types::FormatArg;

/// Arguments for the `test` command.
#[derive(Args, Debug)]
pub struct TestArgs {
    /// Model file, or a model name in the model directory
    pub model: String,

    /// Labeled test file, one example per line
    pub test_file: PathBuf,

    /// Number of labels predicted per example [default: predict.k]
    #[arg(short)]
    pub k: Option<usize>,

    /// Drop labels below this probability [default: predict.threshold]
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Output format [default: output.format]
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,
}

/// Execute the test command.
pub fn execute(args: TestArgs, config: &Config) -> anyhow::Result<()> {
    let k = args.k.unwrap_or(config.predict.k);
    let threshold = args.threshold.unwrap_or(config.predict.threshold);
    let model = super::load_model(&args.model, config)?;

    let evaluation = evaluate_with_progress(&model, &args, k, threshold)?;

    let format = super::output_format(args.format, config);
    let mut writer = super::open_output(None, format, config)?;
    writer.write(&evaluation)?;
    writer.flush()?;
    Ok(())
}

fn evaluate_with_progress(
    model: &Model,
    args: &TestArgs,
    k: usize,
    threshold: f64,
) -> anyhow::Result<Evaluation> {
    let total = std::fs::metadata(&args.test_file)
        .map(|m| m.len())
        .unwrap_or(0);
    let progress = create_progress_bar(total);
    let start = std::time::Instant::now();

    let result = model.evaluate_with(&args.test_file, k, threshold, |bytes| {
        progress.inc(bytes)
    });
    progress.finish_and_clear();
    let evaluation = result?;

    tracing::info!(
        "Evaluated {} examples in {:.2}s (F1 {:.3})",
        evaluation.examples,
        start.elapsed().as_secs_f64(),
        evaluation.f1()
    );
    Ok(evaluation)
}

/// Byte-based progress bar over the test file.
fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%)",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::fixtures;

    #[test]
    fn test_evaluate_file() {
        let dir = tempfile::tempdir().unwrap();
        let test_file = dir.path().join("news.test");
        std::fs::write(
            &test_file,
            "__label__sports game game\n__label__politics election\n__label__sports election\n",
        )
        .unwrap();
        let args = TestArgs {
            model: "news".into(),
            test_file,
            k: None,
            threshold: None,
            format: None,
        };

        let evaluation = evaluate_with_progress(&fixtures::model(), &args, 1, 0.0).unwrap();
        assert_eq!(evaluation.examples, 3);
        assert_eq!(evaluation.correct, 2);
        assert_eq!(evaluation.to_string(), "N\t3\nP@1\t0.667\nR@1\t0.667");
    }

    #[test]
    fn test_missing_test_file() {
        let args = TestArgs {
            model: "news".into(),
            test_file: PathBuf::from("/nonexistent/news.test"),
            k: None,
            threshold: None,
            format: None,
        };
        let err = evaluate_with_progress(&fixtures::model(), &args, 1, 0.0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<sift_core::EvalError>(),
            Some(sift_core::EvalError::NotFound(_))
        ));
    }
}
