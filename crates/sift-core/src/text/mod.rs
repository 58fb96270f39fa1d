//! Text handling shared by prediction and evaluation.

mod lines;
mod tokenizer;

pub use lines::{DecodedLine, DecodedLines};
pub use tokenizer::{normalize_line, tokens, Tokens, EOS, MAX_LINE_TOKENS};
