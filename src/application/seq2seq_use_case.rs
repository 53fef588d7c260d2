// ============================================================
// Layer 2 — seq2seq Use Case
// ============================================================
// Loads aligned source/target files, builds one vocab per side
// from the training data, encodes both splits and hands the
// datasets to the seq2seq training loop on the chosen backend.

use std::path::PathBuf;

use anyhow::Result;
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::wgpu::WgpuDevice;
use burn::backend::{Autodiff, NdArray, Wgpu};

use crate::data::parallel::{encode_parallel, read_token_lines, Seq2SeqDataset};
use crate::data::vocab::Vocab;
use crate::ml::seq2seq_trainer::{train_loop, Seq2SeqTrainConfig};

pub struct Seq2SeqUseCase {
    pub train_source: PathBuf,
    pub train_target: PathBuf,
    pub valid_source: PathBuf,
    pub valid_target: PathBuf,
    pub gpu: i32,
    pub train: Seq2SeqTrainConfig,
}

impl Seq2SeqUseCase {
    pub fn run(self) -> Result<()> {
        let train_source = read_token_lines(&self.train_source)?;
        let train_target = read_token_lines(&self.train_target)?;
        let valid_source = read_token_lines(&self.valid_source)?;
        let valid_target = read_token_lines(&self.valid_target)?;

        // Vocabs come from the training split only; validation
        // tokens outside them map to <unk>.
        let source_vocab = Vocab::from_corpus(&train_source);
        let target_vocab = Vocab::from_corpus(&train_target);
        tracing::info!(
            "vocab sizes: source={} target={}",
            source_vocab.len(),
            target_vocab.len()
        );

        let train_dataset = Seq2SeqDataset::new(encode_parallel(
            &train_source,
            &train_target,
            &source_vocab,
            &target_vocab,
        )?);
        let valid_dataset = Seq2SeqDataset::new(encode_parallel(
            &valid_source,
            &valid_target,
            &source_vocab,
            &target_vocab,
        )?);

        if self.gpu >= 0 {
            train_loop::<Autodiff<Wgpu>>(
                &self.train,
                source_vocab.len(),
                target_vocab.len(),
                train_dataset,
                valid_dataset,
                WgpuDevice::DiscreteGpu(self.gpu as usize),
            )
        } else {
            train_loop::<Autodiff<NdArray>>(
                &self.train,
                source_vocab.len(),
                target_vocab.len(),
                train_dataset,
                valid_dataset,
                NdArrayDevice::Cpu,
            )
        }
    }
}
