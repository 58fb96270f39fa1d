//! The `sift predict` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Args;
use sift_core::config::PredictConfig;
use sift_core::output::PredictionRecord;
use sift_core::text::{DecodedLine, DecodedLines};
use sift_core::{Config, Model, OutputFormat, OutputWriter};

use super::types::FormatArg;

/// Lines handed to the worker threads at a time.
const BATCH_SIZE: usize = 1024;

/// Arguments for the `predict` command.
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Model file, or a model name in the model directory
    pub model: String,

    /// Text file with one document per line (stdin if omitted or `-`)
    pub input: Option<PathBuf>,

    /// Number of labels per line [default: predict.k]
    #[arg(short)]
    pub k: Option<usize>,

    /// Drop labels below this probability [default: predict.threshold]
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Print probabilities next to labels (text format)
    #[arg(short, long)]
    pub prob: bool,

    /// Output format [default: output.format]
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of worker threads [default: predict.workers]
    #[arg(short, long)]
    pub workers: Option<usize>,
}

impl PredictArgs {
    /// Merge the flags over the `[predict]` config section.
    fn options(&self, config: &Config) -> anyhow::Result<PredictConfig> {
        let options = PredictConfig {
            k: self.k.unwrap_or(config.predict.k),
            threshold: self.threshold.unwrap_or(config.predict.threshold),
            workers: self.workers.unwrap_or(config.predict.workers),
        };
        if options.k == 0 {
            anyhow::bail!("-k must be at least 1");
        }
        if !(0.0..=1.0).contains(&options.threshold) {
            anyhow::bail!(
                "--threshold must be between 0.0 and 1.0, got {}",
                options.threshold
            );
        }
        if options.workers == 0 {
            anyhow::bail!("--workers must be at least 1");
        }
        Ok(options)
    }
}

/// Totals reported after a run.
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    lines: usize,
    failed: usize,
}

/// Execute the predict command.
pub fn execute(args: PredictArgs, config: &Config) -> anyhow::Result<()> {
    let options = args.options(config)?;
    let model = super::load_model(&args.model, config)?;
    let format = super::output_format(args.format, config);
    let input = super::open_input(args.input.as_deref())?;
    let mut writer = super::open_output(args.output.as_deref(), format, config)?;

    let start = std::time::Instant::now();
    let summary = run(&model, input, &options, args.prob, &mut writer)?;
    writer.flush()?;

    if summary.failed > 0 {
        tracing::warn!("{} of {} lines failed", summary.failed, summary.lines);
    }
    tracing::info!(
        "Predicted {} lines in {:.2}s",
        summary.lines,
        start.elapsed().as_secs_f64()
    );
    if let Some(path) = &args.output {
        tracing::info!("Output written to {:?}", path);
    }
    Ok(())
}

/// Stream `input` through the model in batches.
///
/// Records are written as each batch completes, except for the JSON format
/// which needs the whole array.
fn run<R: BufRead, W: Write>(
    model: &Model,
    input: R,
    options: &PredictConfig,
    show_probability: bool,
    writer: &mut OutputWriter<W>,
) -> anyhow::Result<Summary> {
    let encoding = model.options().text_encoding()?;
    let collect = writer.format() == OutputFormat::Json;
    let mut collected = Vec::new();
    let mut summary = Summary::default();
    let mut batch: Vec<DecodedLine> = Vec::with_capacity(BATCH_SIZE);

    let mut lines = DecodedLines::new(input, encoding).peekable();
    while let Some(line) = lines.next() {
        batch.push(line?);
        if batch.len() < BATCH_SIZE && lines.peek().is_some() {
            continue;
        }

        let records = predict_lines(model, &batch, options, show_probability, encoding.name());
        batch.clear();
        summary.lines += records.len();
        summary.failed += records.iter().filter(|r| r.error.is_some()).count();
        if collect {
            collected.extend(records);
        } else {
            writer.write_all(&records)?;
        }
    }

    if collect {
        writer.write_all(&collected)?;
    }
    Ok(summary)
}

fn predict_lines(
    model: &Model,
    lines: &[DecodedLine],
    options: &PredictConfig,
    show_probability: bool,
    encoding: &str,
) -> Vec<PredictionRecord> {
    let texts: Vec<&str> = lines.iter().filter_map(|l| l.text.as_deref()).collect();
    let mut results = model
        .predict_batch_with(texts.as_slice(), options)
        .into_iter();

    lines
        .iter()
        .map(|line| {
            let outcome = match line.text {
                Some(_) => results
                    .next()
                    .unwrap_or_else(|| Ok(Vec::new()))
                    .map_err(|e| e.to_string()),
                None => {
                    tracing::warn!("Line {} is not valid {}", line.number, encoding);
                    Err(format!("line is not valid {encoding}"))
                }
            };
            let (predictions, error) = match outcome {
                Ok(predictions) => (predictions, None),
                Err(message) => (Vec::new(), Some(message)),
            };
            PredictionRecord {
                line: line.number,
                predictions,
                error,
                show_probability,
            }
        })
        .collect()
}
