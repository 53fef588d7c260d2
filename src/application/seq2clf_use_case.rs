// ============================================================
// Layer 2 — seq2clf Use Case
// ============================================================
// Loads source sequences and JSON-lines label files, builds the
// source vocab (from a file when --source-vocab is given,
// otherwise from the training split) and one label vocab per
// field, then runs the classifier training loop. With
// --balance-weights, per-class inverse-frequency weights from the
// training labels are applied to the training loss.

use std::path::PathBuf;

use anyhow::Result;
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::wgpu::WgpuDevice;
use burn::backend::{Autodiff, NdArray, Wgpu};

use crate::data::labels::{
    balanced_weights, build_label_vocabs, encode_labeled, read_label_lines, Seq2ClfDataset,
};
use crate::data::parallel::read_token_lines;
use crate::data::vocab::Vocab;
use crate::ml::seq2clf_trainer::{train_loop, Seq2ClfTrainConfig};

pub struct Seq2ClfUseCase {
    pub train_source: PathBuf,
    pub train_target: PathBuf,
    pub valid_source: PathBuf,
    pub valid_target: PathBuf,
    pub source_vocab: Option<PathBuf>,
    pub balance_weights: bool,
    pub gpu: i32,
    pub train: Seq2ClfTrainConfig,
}

impl Seq2ClfUseCase {
    pub fn run(self) -> Result<()> {
        let train_source = read_token_lines(&self.train_source)?;
        let train_records = read_label_lines(&self.train_target)?;
        let valid_source = read_token_lines(&self.valid_source)?;
        let valid_records = read_label_lines(&self.valid_target)?;

        let source_vocab = match &self.source_vocab {
            Some(path) => Vocab::from_file(path)?,
            None => Vocab::from_corpus(&train_source),
        };
        let label_vocabs = build_label_vocabs(&train_records)?;
        tracing::info!(
            "vocab size: {}; label fields: {}",
            source_vocab.len(),
            label_vocabs
                .iter()
                .map(|v| format!("{}({})", v.field, v.len()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let label_weights = self
            .balance_weights
            .then(|| balanced_weights(&train_records, &label_vocabs));

        let train_dataset = Seq2ClfDataset::new(encode_labeled(
            &train_source,
            &train_records,
            &source_vocab,
            &label_vocabs,
        )?);
        let valid_dataset = Seq2ClfDataset::new(encode_labeled(
            &valid_source,
            &valid_records,
            &source_vocab,
            &label_vocabs,
        )?);

        if self.gpu >= 0 {
            train_loop::<Autodiff<Wgpu>>(
                &self.train,
                source_vocab.len(),
                &label_vocabs,
                label_weights,
                train_dataset,
                valid_dataset,
                WgpuDevice::DiscreteGpu(self.gpu as usize),
            )
        } else {
            train_loop::<Autodiff<NdArray>>(
                &self.train,
                source_vocab.len(),
                &label_vocabs,
                label_weights,
                train_dataset,
                valid_dataset,
                NdArrayDevice::Cpu,
            )
        }
    }
}
