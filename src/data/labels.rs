// ============================================================
// Layer 4 — Labeled Dataset (seq2clf)
// ============================================================
// Classification targets are JSON lines: each line is an object
// mapping a label-field name to a label string, e.g.
//
//   {"genre": "news", "register": "formal"}
//
// Every record must carry the same field set. One LabelVocab is
// built per field from the training targets (sorted unique
// values) so label ids are stable across runs.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use burn::data::dataset::Dataset;

use crate::data::vocab::Vocab;

pub type LabelRecord = BTreeMap<String, String>;

/// Label vocabulary for one classification field.
#[derive(Debug, Clone)]
pub struct LabelVocab {
    pub field: String,
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelVocab {
    pub fn new(field: impl Into<String>, mut labels: Vec<String>) -> Self {
        labels.sort();
        labels.dedup();
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self {
            field: field.into(),
            labels,
            index,
        }
    }

    pub fn id(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn label(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// One encoded classification sample. `labels` is aligned with the
/// LabelVocab order used to encode it.
#[derive(Debug, Clone)]
pub struct Seq2ClfItem {
    pub source_ids: Vec<usize>,
    pub labels: Vec<usize>,
}

pub struct Seq2ClfDataset {
    items: Vec<Seq2ClfItem>,
}

impl Seq2ClfDataset {
    pub fn new(items: Vec<Seq2ClfItem>) -> Self {
        Self { items }
    }
}

impl Dataset<Seq2ClfItem> for Seq2ClfDataset {
    fn get(&self, index: usize) -> Option<Seq2ClfItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Read a JSON-lines label file. Blank lines are skipped.
pub fn read_label_lines(path: &Path) -> Result<Vec<LabelRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            serde_json::from_str(l)
                .with_context(|| format!("bad label record on line {} of '{}'", i + 1, path.display()))
        })
        .collect()
}

/// Build one LabelVocab per field from the training records.
pub fn build_label_vocabs(records: &[LabelRecord]) -> Result<Vec<LabelVocab>> {
    ensure!(!records.is_empty(), "label file contains no records");
    let fields: Vec<&String> = records[0].keys().collect();
    ensure!(!fields.is_empty(), "label records have no fields");

    for (i, record) in records.iter().enumerate() {
        ensure!(
            record.len() == fields.len() && fields.iter().all(|f| record.contains_key(*f)),
            "label record {} does not match the field set of the first record",
            i + 1
        );
    }

    Ok(fields
        .into_iter()
        .map(|field| {
            let values = records.iter().map(|r| r[field].clone()).collect();
            LabelVocab::new(field.clone(), values)
        })
        .collect())
}

/// Inverse-frequency class weights, one Vec<f32> per field, aligned
/// with `vocabs`. weight(c) = total / (classes * count(c)), so a
/// perfectly balanced field gets all-ones.
pub fn balanced_weights(records: &[LabelRecord], vocabs: &[LabelVocab]) -> Vec<Vec<f32>> {
    vocabs
        .iter()
        .map(|vocab| {
            let mut counts = vec![0usize; vocab.len()];
            for record in records {
                if let Some(id) = record.get(&vocab.field).and_then(|v| vocab.id(v)) {
                    counts[id] += 1;
                }
            }
            let total: usize = counts.iter().sum();
            counts
                .iter()
                .map(|&c| {
                    if c == 0 {
                        0.0
                    } else {
                        total as f32 / (vocab.len() * c) as f32
                    }
                })
                .collect()
        })
        .collect()
}

/// Encode source sequences and label records into samples.
pub fn encode_labeled(
    source_lines: &[Vec<String>],
    records: &[LabelRecord],
    source_vocab: &Vocab,
    label_vocabs: &[LabelVocab],
) -> Result<Vec<Seq2ClfItem>> {
    ensure!(
        source_lines.len() == records.len(),
        "source has {} sequences but target has {} label records",
        source_lines.len(),
        records.len()
    );
    source_lines
        .iter()
        .zip(records)
        .enumerate()
        .map(|(i, (src, record))| {
            let labels = label_vocabs
                .iter()
                .map(|vocab| {
                    let value = record
                        .get(&vocab.field)
                        .with_context(|| format!("record {} is missing field '{}'", i + 1, vocab.field))?;
                    vocab.id(value).with_context(|| {
                        format!(
                            "record {} has label '{}' for field '{}' not seen in training",
                            i + 1,
                            value,
                            vocab.field
                        )
                    })
                })
                .collect::<Result<Vec<usize>>>()?;
            Ok(Seq2ClfItem {
                source_ids: source_vocab.encode(src),
                labels,
            })
        })
        .collect()
}
