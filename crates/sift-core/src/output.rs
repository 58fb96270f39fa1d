//! Output formatting for text, JSON and JSONL output.
//!
//! Every record type implements both `Serialize` (for JSON) and `Display`
//! (for the plain text format), so one writer handles all three formats.

use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

use crate::types::Prediction;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text, one line per record
    Text,
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// A writer that emits records in one of the [`OutputFormat`]s.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// `pretty` only affects the JSON format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write a single record.
    pub fn write<T: Serialize + fmt::Display>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.writer, "{item}")?,
            OutputFormat::Json if self.pretty => {
                serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Json | OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
        }
        Ok(())
    }

    /// Write multiple records.
    ///
    /// For JSON format, writes a single array. Other formats write one line
    /// per record.
    pub fn write_all<T: Serialize + fmt::Display>(&mut self, items: &[T]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, items)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, items).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
            }
            OutputFormat::Text | OutputFormat::JsonLines => {
                for item in items {
                    self.write(item)?;
                }
            }
        }
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Predictions for one input line.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    /// 1-based input line number
    pub line: usize,
    pub predictions: Vec<Prediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Text format only: print probabilities after labels
    #[serde(skip)]
    pub show_probability: bool,
}

impl fmt::Display for PredictionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            return write!(f, "error: {error}");
        }
        for (i, p) in self.predictions.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if self.show_probability {
                write!(f, "{p}")?;
            } else {
                f.write_str(&p.label)?;
            }
        }
        Ok(())
    }
}

/// A named vector: a word, or the text of an input line.
#[derive(Debug, Clone, Serialize)]
pub struct VectorRecord {
    pub key: String,
    pub vector: Vec<f32>,
}

impl fmt::Display for VectorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)?;
        for x in &self.vector {
            write!(f, " {x:.5}")?;
        }
        Ok(())
    }
}
