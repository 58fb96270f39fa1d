//! The `sift vectors` command: sentence and word vectors.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Args;
use sift_core::output::VectorRecord;
use sift_core::text::{tokens, DecodedLines, EOS};
use sift_core::{Config, Model, OutputFormat, OutputWriter};

use super::types::FormatArg;

/// Arguments for the `vectors` command.
#[derive(Args, Debug)]
pub struct VectorsArgs {
    /// Model file, or a model name in the model directory
    pub model: String,

    /// Text file (stdin if omitted or `-`)
    pub input: Option<PathBuf>,

    /// One vector per word instead of one per line
    #[arg(long)]
    pub words: bool,

    /// Output format [default: output.format]
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the vectors command.
pub fn execute(args: VectorsArgs, config: &Config) -> anyhow::Result<()> {
    let model = super::load_model(&args.model, config)?;
    let format = super::output_format(args.format, config);
    let input = super::open_input(args.input.as_deref())?;
    let mut writer = super::open_output(args.output.as_deref(), format, config)?;

    let count = run(&model, input, args.words, &mut writer)?;
    writer.flush()?;
    tracing::debug!("Wrote {} vectors", count);
    Ok(())
}

fn run<R: BufRead, W: Write>(
    model: &Model,
    input: R,
    words: bool,
    writer: &mut OutputWriter<W>,
) -> anyhow::Result<usize> {
    let encoding = model.options().text_encoding()?;
    let collect = writer.format() == OutputFormat::Json;
    let mut collected = Vec::new();
    let mut count = 0;

    for line in DecodedLines::new(input, encoding) {
        let line = line?;
        let Some(text) = line.text else {
            tracing::warn!("Skipping line {}: not valid {}", line.number, encoding.name());
            continue;
        };

        let records: Vec<VectorRecord> = if words {
            tokens(&text)
                .filter(|t| *t != EOS)
                .map(|t| VectorRecord {
                    key: t.to_string(),
                    vector: model.word_vector(t),
                })
                .collect()
        } else {
            vec![VectorRecord {
                key: text.trim_end().to_string(),
                vector: model.text_vector(&text),
            }]
        };

        count += records.len();
        if collect {
            collected.extend(records);
        } else {
            writer.write_all(&records)?;
        }
    }

    if collect {
        writer.write_all(&collected)?;
    }
    Ok(count)
}
