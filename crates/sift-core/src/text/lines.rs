//! Line reader that decodes each line with a configured encoding.

use std::io::{self, BufRead};

use encoding_rs::Encoding;

/// One raw input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLine {
    /// 1-based line number
    pub number: usize,
    /// Bytes consumed, including the newline
    pub bytes: usize,
    /// Decoded text with its newline, or `None` when the bytes are not valid
    /// in the encoding
    pub text: Option<String>,
}

/// Iterator over the decoded lines of a reader.
///
/// A UTF-8 byte order mark at the very start is dropped. Undecodable lines are
/// reported rather than patched with replacement characters.
pub struct DecodedLines<R> {
    reader: R,
    encoding: &'static Encoding,
    buf: Vec<u8>,
    number: usize,
}

impl<R: BufRead> DecodedLines<R> {
    pub fn new(reader: R, encoding: &'static Encoding) -> Self {
        Self {
            reader,
            encoding,
            buf: Vec::new(),
            number: 0,
        }
    }
}

impl<R: BufRead> Iterator for DecodedLines<R> {
    type Item = io::Result<DecodedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        let n = match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => return None,
            Ok(n) => n,
            Err(e) => return Some(Err(e)),
        };
        self.number += 1;

        let mut bytes = self.buf.as_slice();
        if self.number == 1 && self.encoding == encoding_rs::UTF_8 {
            bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        }
        let text = self
            .encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|cow| cow.into_owned());

        Some(Ok(DecodedLine {
            number: self.number,
            bytes: n,
            text,
        }))
    }
}
