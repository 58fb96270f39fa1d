//! Whitespace tokenizer.
//!
//! Input is treated as a byte stream split on ASCII whitespace and NUL, so
//! multi-byte UTF-8 sequences are never cut. Every newline becomes an explicit
//! end-of-sentence token.

use std::borrow::Cow;

/// End-of-sentence token emitted for every `\n`.
pub const EOS: &str = "</s>";

/// Maximum number of tokens read from a single document.
pub const MAX_LINE_TOKENS: usize = 1024;

fn is_separator(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\r' | b'\t' | 0x0b | 0x0c | 0)
}

/// Append the terminating newline a document must carry.
///
/// Returns the input unchanged (borrowed) when it already ends with `\n`.
pub fn normalize_line(text: &str) -> Cow<'_, str> {
    if text.ends_with('\n') {
        Cow::Borrowed(text)
    } else {
        let mut owned = String::with_capacity(text.len() + 1);
        owned.push_str(text);
        owned.push('\n');
        Cow::Owned(owned)
    }
}

/// Lazily split `text` into tokens.
///
/// The iterator borrows `text` and can be cloned to restart from the current
/// position.
pub fn tokens(text: &str) -> Tokens<'_> {
    Tokens { rest: text }
}

/// Iterator over the tokens of a document. See [`tokens`].
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let bytes = self.rest.as_bytes();
        let start = bytes
            .iter()
            .position(|&b| b == b'\n' || !is_separator(b))?;

        if bytes[start] == b'\n' {
            self.rest = &self.rest[start + 1..];
            return Some(EOS);
        }

        let end = bytes[start..]
            .iter()
            .position(|&b| is_separator(b))
            .map_or(bytes.len(), |n| start + n);

        // Separators are ASCII, so both offsets sit on char boundaries.
        let token = &self.rest[start..end];
        self.rest = &self.rest[end..];
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> Vec<&str> {
        tokens(text).collect()
    }

    #[test]
    fn test_splits_on_whitespace() {
        assert_eq!(
            collect("the quick\tbrown  fox\n"),
            vec!["the", "quick", "brown", "fox", EOS]
        );
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(collect("").is_empty());
        assert!(collect(" \t\r ").is_empty());
        assert_eq!(collect("\n"), vec![EOS]);
    }

    #[test]
    fn test_each_newline_is_eos() {
        assert_eq!(collect("a\n\nb"), vec!["a", EOS, EOS, "b"]);
    }

    #[test]
    fn test_carriage_return_is_plain_separator() {
        assert_eq!(collect("a\r\nb\r\n"), vec!["a", EOS, "b", EOS]);
    }

    #[test]
    fn test_vertical_tab_form_feed_and_nul() {
        assert_eq!(collect("a\x0bb\x0cc\0d"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_multibyte_tokens_survive() {
        assert_eq!(collect("naïve café\n"), vec!["naïve", "café", EOS]);
        assert_eq!(collect("東京 大阪"), vec!["東京", "大阪"]);
    }

    #[test]
    fn test_unicode_whitespace_is_not_a_separator() {
        // U+00A0 (no-break space) stays inside the token
        assert_eq!(collect("a\u{a0}b"), vec!["a\u{a0}b"]);
    }

    #[test]
    fn test_iterator_is_restartable() {
        let mut iter = tokens("one two three");
        assert_eq!(iter.next(), Some("one"));
        let snapshot = iter.clone();
        assert_eq!(iter.collect::<Vec<_>>(), vec!["two", "three"]);
        assert_eq!(snapshot.collect::<Vec<_>>(), vec!["two", "three"]);
    }

    #[test]
    fn test_normalize_line() {
        assert!(matches!(normalize_line("done\n"), Cow::Borrowed("done\n")));
        assert_eq!(normalize_line("open"), "open\n");
        assert_eq!(normalize_line(""), "\n");
    }
}
