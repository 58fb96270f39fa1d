//! The `sift info` command.

use std::fmt;

use clap::Args;
use serde::Serialize;
use sift_core::model::Entry;
use sift_core::{Config, Model, ModelInfo};

use super::types::FormatArg;

/// Arguments for the `info` command.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Model file, or a model name in the model directory
    pub model: String,

    /// List every label with its training count
    #[arg(long)]
    pub labels: bool,

    /// List every word with its training count
    #[arg(long)]
    pub words: bool,

    /// Output format [default: output.format]
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,
}

/// Model summary plus the optional vocabulary listings.
#[derive(Debug, Serialize)]
struct InfoReport {
    #[serde(flatten)]
    info: ModelInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    label_counts: Option<Vec<Entry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    word_counts: Option<Vec<Entry>>,
}

impl InfoReport {
    fn new(model: &Model, labels: bool, words: bool) -> Self {
        Self {
            info: model.info(),
            label_counts: labels.then(|| model.vocabulary().labels().to_vec()),
            word_counts: words.then(|| model.words().to_vec()),
        }
    }
}

impl fmt::Display for InfoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info)?;
        let sections = [("labels", &self.label_counts), ("words", &self.word_counts)];
        for (title, entries) in sections {
            if let Some(entries) = entries {
                write!(f, "\n\n{title}:")?;
                for entry in entries {
                    write!(f, "\n  {:30} {}", entry.token, entry.count)?;
                }
            }
        }
        Ok(())
    }
}

/// Execute the info command.
pub fn execute(args: InfoArgs, config: &Config) -> anyhow::Result<()> {
    let model = super::load_model(&args.model, config)?;
    let report = InfoReport::new(&model, args.labels, args.words);

    let format = super::output_format(args.format, config);
    let mut writer = super::open_output(None, format, config)?;
    writer.write(&report)?;
    writer.flush()?;
    Ok(())
}
