//! Token to row-index mapping.
//!
//! Words own rows `0..nwords` of the embedding table; hashed features
//! (character n-grams, word n-grams, unseen tokens) share the bucket rows
//! `nwords..nwords + bucket`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, LoadResult};
use crate::text::EOS;

use super::args::ModelArgs;

/// Multiplier used to chain token hashes into word n-gram hashes.
const WORD_NGRAM_MULTIPLIER: u64 = 116_049_371;

/// A vocabulary or label entry with its training frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub token: String,
    pub count: u64,
}

impl Entry {
    pub fn new(token: impl Into<String>, count: u64) -> Self {
        Self {
            token: token.into(),
            count,
        }
    }
}

/// 32-bit FNV-1a over the token's bytes.
///
/// Bytes are sign-extended before mixing, which keeps ids compatible with
/// models trained by tools that hash `char` values.
pub fn hash(token: &str) -> u32 {
    let mut h: u32 = 2_166_136_261;
    for &b in token.as_bytes() {
        h ^= b as i8 as u32;
        h = h.wrapping_mul(16_777_619);
    }
    h
}

/// Word and label tables plus the hashing rules of one model.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    words: Vec<Entry>,
    labels: Vec<Entry>,
    word2id: HashMap<String, u32>,
    /// Per word: its own id followed by its character n-gram buckets.
    subwords: Vec<Vec<u32>>,
    minn: usize,
    maxn: usize,
    bucket: u32,
    char_ngrams: bool,
    word_ngrams: usize,
}

impl Vocabulary {
    /// Build the lookup tables. Ids follow insertion order.
    pub fn new(words: Vec<Entry>, labels: Vec<Entry>, args: &ModelArgs) -> LoadResult<Self> {
        if words.len() + args.bucket > u32::MAX as usize {
            return Err(LoadError::InvalidParts(format!(
                "{} words + {} buckets overflow a 32-bit index",
                words.len(),
                args.bucket
            )));
        }
        if labels.is_empty() {
            return Err(LoadError::InvalidParts("model has no labels".into()));
        }

        let mut word2id = HashMap::with_capacity(words.len());
        for (id, entry) in words.iter().enumerate() {
            if word2id.insert(entry.token.clone(), id as u32).is_some() {
                return Err(LoadError::InvalidParts(format!(
                    "duplicate word {:?}",
                    entry.token
                )));
            }
        }
        let mut seen = HashSet::with_capacity(labels.len());
        for entry in &labels {
            if !seen.insert(entry.token.as_str()) {
                return Err(LoadError::InvalidParts(format!(
                    "duplicate label {:?}",
                    entry.token
                )));
            }
        }

        let mut vocab = Self {
            words,
            labels,
            word2id,
            subwords: Vec::new(),
            minn: args.minn,
            maxn: args.maxn,
            bucket: args.bucket as u32,
            char_ngrams: args.char_ngrams_enabled(),
            word_ngrams: if args.word_ngrams_enabled() {
                args.word_ngrams
            } else {
                1
            },
        };
        vocab.subwords = vocab
            .words
            .iter()
            .enumerate()
            .map(|(id, entry)| {
                let mut ids = vec![id as u32];
                if entry.token != EOS {
                    vocab.push_char_ngrams(&entry.token, &mut ids);
                }
                ids
            })
            .collect();
        Ok(vocab)
    }

    /// Number of words (rows owned by the vocabulary).
    pub fn nwords(&self) -> usize {
        self.words.len()
    }

    /// Number of labels.
    pub fn nlabels(&self) -> usize {
        self.labels.len()
    }

    /// Number of hashed bucket rows.
    pub fn bucket(&self) -> usize {
        self.bucket as usize
    }

    pub fn words(&self) -> &[Entry] {
        &self.words
    }

    pub fn labels(&self) -> &[Entry] {
        &self.labels
    }

    /// Id of an in-vocabulary word.
    pub fn id(&self, token: &str) -> Option<u32> {
        self.word2id.get(token).copied()
    }

    /// Map a token to the row that stands for it: the first row
    /// [`Vocabulary::push_features`] emits for it.
    ///
    /// Known words get their fixed id. Unseen tokens get the bucket row of
    /// their first character n-gram, in `nwords..nwords + bucket`. `None`
    /// means the token contributes no feature at all.
    pub fn lookup(&self, token: &str) -> Option<u32> {
        self.id(token).or_else(|| {
            if token == EOS {
                return None;
            }
            self.char_ngrams(token)
                .first()
                .map(|gram| self.bucket_row(u64::from(hash(gram))))
        })
    }

    /// Append the feature rows of one token: its own id when known, then its
    /// character n-gram buckets. The end-of-sentence token never gets n-grams.
    pub fn push_features(&self, token: &str, out: &mut Vec<u32>) {
        match self.id(token) {
            Some(id) => out.extend_from_slice(&self.subwords[id as usize]),
            None if token != EOS => self.push_char_ngrams(token, out),
            None => {}
        }
    }

    /// Append word n-gram buckets for the token hashes of one document.
    ///
    /// Every window spans at least two tokens.
    pub fn push_word_ngrams(&self, hashes: &[u32], out: &mut Vec<u32>) {
        if self.word_ngrams <= 1 {
            return;
        }
        for i in 0..hashes.len() {
            // Hashes are widened as signed 32-bit values.
            let mut h = hashes[i] as i32 as i64 as u64;
            for &next in hashes.iter().take(i + self.word_ngrams).skip(i + 1) {
                h = h
                    .wrapping_mul(WORD_NGRAM_MULTIPLIER)
                    .wrapping_add(next as i32 as i64 as u64);
                out.push(self.bucket_row(h));
            }
        }
    }

    /// Character n-grams of `<token>` in Unicode scalar values.
    pub fn char_ngrams(&self, token: &str) -> Vec<String> {
        let mut grams = Vec::new();
        if !self.char_ngrams {
            return grams;
        }
        let chars: Vec<char> = std::iter::once('<')
            .chain(token.chars())
            .chain(std::iter::once('>'))
            .collect();
        for start in 0..chars.len() {
            for n in self.minn.max(1)..=self.maxn {
                let end = start + n;
                if end > chars.len() {
                    break;
                }
                // Lone boundary markers carry no information.
                if n == 1 && (start == 0 || end == chars.len()) {
                    continue;
                }
                grams.push(chars[start..end].iter().collect());
            }
        }
        grams
    }

    fn push_char_ngrams(&self, token: &str, out: &mut Vec<u32>) {
        for gram in self.char_ngrams(token) {
            out.push(self.bucket_row(u64::from(hash(&gram))));
        }
    }

    fn bucket_row(&self, h: u64) -> u32 {
        // Callers only reach here with bucket > 0.
        self.words.len() as u32 + (h % u64::from(self.bucket)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Loss;

    fn entries(tokens: &[&str]) -> Vec<Entry> {
        tokens.iter().map(|t| Entry::new(*t, 1)).collect()
    }

    fn vocab(args: &ModelArgs) -> Vocabulary {
        Vocabulary::new(
            entries(&["game", "election", EOS]),
            entries(&["__label__sports", "__label__politics"]),
            args,
        )
        .unwrap()
    }

    #[test]
    fn test_hash_known_values() {
        // FNV-1a offset basis for the empty string
        assert_eq!(hash(""), 2_166_136_261);
        assert_eq!(hash("a"), 0xe40c292c);
        assert_eq!(hash("foobar"), 0xbf9cf968);
    }

    #[test]
    fn test_hash_sign_extends_high_bytes() {
        let plain = {
            let mut h: u32 = 2_166_136_261;
            for &b in "é".as_bytes() {
                h ^= b as u32;
                h = h.wrapping_mul(16_777_619);
            }
            h
        };
        assert_ne!(hash("é"), plain);
    }

    #[test]
    fn test_ids_follow_insertion_order() {
        let v = vocab(&ModelArgs::new(2, Loss::Softmax));
        assert_eq!(v.id("game"), Some(0));
        assert_eq!(v.id("election"), Some(1));
        assert_eq!(v.id("weather"), None);
        assert_eq!(v.nwords(), 3);
        assert_eq!(v.nlabels(), 2);
    }

    #[test]
    fn test_lookup_without_subwords() {
        let v = vocab(&ModelArgs::new(2, Loss::Softmax));
        assert_eq!(v.lookup("election"), Some(1));
        assert_eq!(v.lookup("weather"), None);
    }

    #[test]
    fn test_lookup_buckets_unseen_tokens() {
        let args = ModelArgs::new(2, Loss::Softmax)
            .with_char_ngrams(2, 4)
            .with_bucket(50);
        let v = vocab(&args);

        let row = v.lookup("weather").unwrap();
        assert!((3..53).contains(&row));
        // stable across calls and across rebuilt vocabularies
        assert_eq!(v.lookup("weather"), Some(row));
        assert_eq!(vocab(&args).lookup("weather"), Some(row));
    }

    #[test]
    fn test_lookup_row_is_a_feature_row() {
        let args = ModelArgs::new(2, Loss::Softmax)
            .with_char_ngrams(3, 6)
            .with_bucket(1000);
        let v = vocab(&args);

        for token in ["weather", "game", "x"] {
            let mut rows = Vec::new();
            v.push_features(token, &mut rows);
            let row = v.lookup(token).unwrap();
            assert_eq!(rows.first(), Some(&row), "token {token}");
        }
    }

    #[test]
    fn test_lookup_none_without_features() {
        let args = ModelArgs::new(2, Loss::Softmax)
            .with_char_ngrams(5, 6)
            .with_bucket(100);
        let v = vocab(&args);
        // "<a>" is shorter than the smallest n-gram
        assert_eq!(v.lookup("a"), None);
        assert_eq!(v.lookup(EOS), Some(2));
    }

    #[test]
    fn test_char_ngrams_of_short_word() {
        let args = ModelArgs::new(2, Loss::Softmax)
            .with_char_ngrams(1, 2)
            .with_bucket(10);
        let v = vocab(&args);
        assert_eq!(
            v.char_ngrams("ab"),
            vec!["<a", "a", "ab", "b", "b>"]
        );
    }

    #[test]
    fn test_char_ngrams_count_chars_not_bytes() {
        let args = ModelArgs::new(2, Loss::Softmax)
            .with_char_ngrams(3, 3)
            .with_bucket(10);
        let v = vocab(&args);
        assert_eq!(v.char_ngrams("né"), vec!["<né", "né>"]);
    }

    #[test]
    fn test_char_ngrams_disabled() {
        let args = ModelArgs::new(2, Loss::Softmax)
            .with_char_ngrams(4, 3)
            .with_bucket(10);
        let v = vocab(&args);
        assert!(v.char_ngrams("anything").is_empty());

        let mut out = Vec::new();
        v.push_features("unknown", &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_features_of_known_word_start_with_id() {
        let args = ModelArgs::new(2, Loss::Softmax)
            .with_char_ngrams(3, 3)
            .with_bucket(10);
        let v = vocab(&args);

        let mut out = Vec::new();
        v.push_features("game", &mut out);
        // "<ga" "gam" "ame" "me>"
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], 0);
        assert!(out[1..].iter().all(|&r| (3..13).contains(&r)));
    }

    #[test]
    fn test_eos_has_no_ngrams() {
        let args = ModelArgs::new(2, Loss::Softmax)
            .with_char_ngrams(2, 3)
            .with_bucket(10);
        let v = vocab(&args);
        let mut out = Vec::new();
        v.push_features(EOS, &mut out);
        assert_eq!(out, vec![2]);
    }

    #[test]
    fn test_word_ngrams() {
        let args = ModelArgs::new(2, Loss::Softmax)
            .with_word_ngrams(3)
            .with_bucket(100);
        let v = vocab(&args);
        let hashes: Vec<u32> = ["a", "b", "c"].iter().map(|t| hash(t)).collect();

        let mut out = Vec::new();
        v.push_word_ngrams(&hashes, &mut out);
        // ab, abc, bc
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|&r| (3..103).contains(&r)));

        let mut again = Vec::new();
        v.push_word_ngrams(&hashes, &mut again);
        assert_eq!(out, again);
    }

    #[test]
    fn test_word_ngrams_off_for_unigram_models() {
        let v = vocab(&ModelArgs::new(2, Loss::Softmax).with_bucket(100));
        let mut out = Vec::new();
        v.push_word_ngrams(&[1, 2, 3], &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_duplicate_word_rejected() {
        let err = Vocabulary::new(
            entries(&["a", "a"]),
            entries(&["__label__x"]),
            &ModelArgs::new(2, Loss::Softmax),
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate word"));
    }

    #[test]
    fn test_no_labels_rejected() {
        let err = Vocabulary::new(entries(&["a"]), vec![], &ModelArgs::new(2, Loss::Softmax))
            .unwrap_err();
        assert!(err.to_string().contains("no labels"));
    }
}
