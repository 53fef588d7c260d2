// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Maps tokens to integer ids and back. The first four ids are
// reserved for special tokens:
//
//   0 <pad>   — padding, excluded from the seq2seq loss
//   1 <unk>   — any token not seen while building the vocab
//   2 <start> — prepended to decoder inputs
//   3 <stop>  — appended to decoder targets
//
// A vocab is either built from a training corpus (first-seen
// order) or loaded from a one-token-per-line file passed with
// --source-vocab.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub const PAD: usize = 0;
pub const UNK: usize = 1;
pub const START: usize = 2;
pub const STOP: usize = 3;

const SPECIALS: [&str; 4] = ["<pad>", "<unk>", "<start>", "<stop>"];

#[derive(Debug, Clone)]
pub struct Vocab {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocab {
    /// Build a vocab from an iterator of tokens, keeping the first
    /// occurrence of each token. Special tokens are always present.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Self::empty();
        for token in tokens {
            vocab.insert(token.as_ref());
        }
        vocab
    }

    /// Build a vocab from tokenized lines (e.g. a training source file).
    pub fn from_corpus<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a Vec<String>>,
    {
        Self::from_tokens(lines.into_iter().flatten().map(|t| t.as_str()))
    }

    /// Load a vocab from a file with one token per line.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read vocab file '{}'", path.display()))?;
        Ok(Self::from_tokens(
            text.lines().map(str::trim).filter(|l| !l.is_empty()),
        ))
    }

    fn empty() -> Self {
        let tokens: Vec<String> = SPECIALS.iter().map(|s| s.to_string()).collect();
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { tokens, index }
    }

    fn insert(&mut self, token: &str) {
        if !self.index.contains_key(token) {
            self.index.insert(token.to_string(), self.tokens.len());
            self.tokens.push(token.to_string());
        }
    }

    /// Token id, or UNK for out-of-vocabulary tokens.
    pub fn id(&self, token: &str) -> usize {
        self.index.get(token).copied().unwrap_or(UNK)
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.tokens.get(id).map(String::as_str)
    }

    pub fn encode(&self, tokens: &[String]) -> Vec<usize> {
        tokens.iter().map(|t| self.id(t)).collect()
    }

    /// Total size including the special tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        // Specials are always present.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specials_come_first() {
        let vocab = Vocab::from_tokens(["a", "b"]);
        assert_eq!(vocab.id("<pad>"), PAD);
        assert_eq!(vocab.id("<unk>"), UNK);
        assert_eq!(vocab.id("<start>"), START);
        assert_eq!(vocab.id("<stop>"), STOP);
        assert_eq!(vocab.id("a"), 4);
        assert_eq!(vocab.id("b"), 5);
    }

    #[test]
    fn unknown_tokens_map_to_unk() {
        let vocab = Vocab::from_tokens(["a"]);
        assert_eq!(vocab.id("never-seen"), UNK);
    }

    #[test]
    fn duplicates_are_collapsed() {
        let vocab = Vocab::from_tokens(["a", "b", "a", "b", "c"]);
        assert_eq!(vocab.len(), 4 + 3);
        assert_eq!(vocab.token(6), Some("c"));
    }

    #[test]
    fn encode_roundtrip() {
        let vocab = Vocab::from_tokens(["x", "y"]);
        let ids = vocab.encode(&["y".to_string(), "x".to_string(), "?".to_string()]);
        assert_eq!(ids, vec![5, 4, UNK]);
    }
}
