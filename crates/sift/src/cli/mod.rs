//! Command implementations and the helpers they share.

pub mod config;
pub mod info;
pub mod models;
pub mod predict;
pub mod test;
pub mod types;
pub mod vectors;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use sift_core::{Config, Model, OutputFormat, OutputWriter};

use types::FormatArg;

/// Resolve `name` against the model directory and load it with the
/// configured label prefix and encoding.
pub fn load_model(name: &str, config: &Config) -> anyhow::Result<Model> {
    let path = config.resolve_model(name);
    Model::load_with(&path, config.model.clone())
        .with_context(|| format!("Failed to load model {name:?}"))
}

/// Open `input` for line reading. No path, or `-`, reads stdin.
pub fn open_input(input: Option<&Path>) -> anyhow::Result<Box<dyn BufRead>> {
    match input {
        None => Ok(Box::new(io::stdin().lock())),
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdin().lock())),
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

/// Create a record writer on `output`, or stdout when no path is given.
pub fn open_output(
    output: Option<&Path>,
    format: OutputFormat,
    config: &Config,
) -> anyhow::Result<OutputWriter<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    Ok(OutputWriter::new(sink, format, config.output.pretty))
}

/// The `--format` flag if given, otherwise the configured default.
pub fn output_format(arg: Option<FormatArg>, config: &Config) -> OutputFormat {
    arg.map(OutputFormat::from)
        .or_else(|| OutputFormat::parse(&config.output.format))
        .unwrap_or(OutputFormat::Text)
}
