// ============================================================
// Layer 4 — Parallel Text Dataset (seq2seq)
// ============================================================
// Loads aligned source/target files where line i of the target
// file is the reference output for line i of the source file.
// Tokenization is whitespace splitting; ids come from a Vocab.

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use burn::data::dataset::Dataset;

use crate::data::vocab::Vocab;

/// One tokenized source/target pair, already mapped to ids.
#[derive(Debug, Clone)]
pub struct Seq2SeqItem {
    pub source_ids: Vec<usize>,
    pub target_ids: Vec<usize>,
}

pub struct Seq2SeqDataset {
    items: Vec<Seq2SeqItem>,
}

impl Seq2SeqDataset {
    pub fn new(items: Vec<Seq2SeqItem>) -> Self {
        Self { items }
    }
}

impl Dataset<Seq2SeqItem> for Seq2SeqDataset {
    fn get(&self, index: usize) -> Option<Seq2SeqItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Read a file of whitespace-tokenized sequences, one per line.
/// Blank lines are skipped.
pub fn read_token_lines(path: &Path) -> Result<Vec<Vec<String>>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    Ok(text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.split_whitespace().map(str::to_string).collect())
        .collect())
}

/// Pair up source and target lines and encode them.
pub fn encode_parallel(
    source_lines: &[Vec<String>],
    target_lines: &[Vec<String>],
    source_vocab: &Vocab,
    target_vocab: &Vocab,
) -> Result<Vec<Seq2SeqItem>> {
    ensure!(
        source_lines.len() == target_lines.len(),
        "source has {} sequences but target has {}",
        source_lines.len(),
        target_lines.len()
    );
    Ok(source_lines
        .iter()
        .zip(target_lines)
        .map(|(src, tgt)| Seq2SeqItem {
            source_ids: source_vocab.encode(src),
            target_ids: target_vocab.encode(tgt),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn toks(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn reads_and_tokenizes_lines() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "a b c").expect("write");
        writeln!(file).expect("write");
        writeln!(file, "  d e ").expect("write");
        let lines = read_token_lines(file.path()).expect("read");
        assert_eq!(lines, vec![toks("a b c"), toks("d e")]);
    }

    #[test]
    fn encodes_aligned_pairs() {
        let source_vocab = Vocab::from_tokens(["a", "b"]);
        let target_vocab = Vocab::from_tokens(["x"]);
        let items = encode_parallel(
            &[toks("a b"), toks("b")],
            &[toks("x"), toks("x x")],
            &source_vocab,
            &target_vocab,
        )
        .expect("encode");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source_ids, vec![4, 5]);
        assert_eq!(items[0].target_ids, vec![4]);
        assert_eq!(items[1].target_ids, vec![4, 4]);
    }

    #[test]
    fn rejects_misaligned_files() {
        let vocab = Vocab::from_tokens(["a"]);
        let result = encode_parallel(&[toks("a")], &[], &vocab, &vocab);
        assert!(result.is_err());
    }
}
