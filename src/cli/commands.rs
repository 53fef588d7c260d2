// ============================================================
// Layer 1 — Subcommand Arguments
// ============================================================
// Flags shared by every trainer live in CommonTrainArgs and are
// flattened into each subcommand. `--gpu -1` selects the CPU
// backend, hence allow_negative_numbers.

use std::path::PathBuf;

use clap::Args;

use crate::application::copy_task_use_case::CopyTaskUseCase;
use crate::application::seq2clf_use_case::Seq2ClfUseCase;
use crate::application::seq2seq_use_case::Seq2SeqUseCase;
use crate::infra::scheduler::TrainMetric;
use crate::ml::seq2clf_trainer::Seq2ClfTrainConfig;
use crate::ml::seq2seq_trainer::Seq2SeqTrainConfig;

#[derive(Args, Debug)]
pub struct CommonTrainArgs {
    /// GPU index, or -1 for CPU
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub gpu: i32,

    /// Dataloader worker threads
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    /// Gradients are clamped to [-grad-clip, grad-clip]
    #[arg(long, default_value_t = 5.0)]
    pub grad_clip: f32,

    /// Seed for data shuffling (and copy-task generation)
    #[arg(long, default_value_t = 83419234)]
    pub seed: u64,

    /// Directory-plus-prefix for checkpoint files; no checkpoints
    /// are written when omitted
    #[arg(long)]
    pub model_path: Option<PathBuf>,

    /// JSON file receiving the per-epoch metric history
    #[arg(long)]
    pub results_path: Option<PathBuf>,

    /// Replace existing checkpoint files for this model path
    #[arg(long)]
    pub overwrite_model: bool,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub opt_lr: f64,

    /// LR multiplier applied when the target metric plateaus
    #[arg(long, default_value_t = 0.5)]
    pub sch_factor: f64,

    /// Epochs without improvement before the LR is reduced
    #[arg(long, default_value_t = 5)]
    pub sch_patience: usize,

    /// Validation metric driving the scheduler and checkpoints
    /// (x-entropy, accuracy, or f1)
    #[arg(long, default_value = "x-entropy")]
    pub sch_metric: TrainMetric,
}

#[derive(Args, Debug)]
pub struct Seq2SeqArgs {
    #[arg(long)]
    pub train_source: PathBuf,
    #[arg(long)]
    pub train_target: PathBuf,
    #[arg(long)]
    pub valid_source: PathBuf,
    #[arg(long)]
    pub valid_target: PathBuf,

    /// Embedding dimension for both sides
    #[arg(long, default_value_t = 128)]
    pub emb_size: usize,

    /// LSTM hidden size, shared by encoder and decoder
    #[arg(long, default_value_t = 256)]
    pub hidden_size: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    #[command(flatten)]
    pub common: CommonTrainArgs,
}

impl Seq2SeqArgs {
    pub fn into_use_case(self) -> Seq2SeqUseCase {
        Seq2SeqUseCase {
            train_source: self.train_source,
            train_target: self.train_target,
            valid_source: self.valid_source,
            valid_target: self.valid_target,
            gpu: self.common.gpu,
            train: seq2seq_train_config(
                self.emb_size,
                self.hidden_size,
                self.dropout,
                &self.common,
            ),
        }
    }
}

#[derive(Args, Debug)]
pub struct Seq2ClfArgs {
    #[arg(long)]
    pub train_source: PathBuf,
    /// JSON-lines file: one {"field": "label", ...} object per line
    #[arg(long)]
    pub train_target: PathBuf,
    #[arg(long)]
    pub valid_source: PathBuf,
    #[arg(long)]
    pub valid_target: PathBuf,

    /// One-token-per-line vocab file; built from the training
    /// source when omitted
    #[arg(long)]
    pub source_vocab: Option<PathBuf>,

    /// Weight the training loss by inverse class frequency
    #[arg(long)]
    pub balance_weights: bool,

    #[arg(long, default_value_t = 128)]
    pub emb_size: usize,

    /// Convolutional encoder output channels
    #[arg(long, default_value_t = 100)]
    pub enc_filters: usize,

    #[arg(long, default_value_t = 3)]
    pub enc_kernel_width: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    #[command(flatten)]
    pub common: CommonTrainArgs,
}

impl Seq2ClfArgs {
    pub fn into_use_case(self) -> Seq2ClfUseCase {
        let common = &self.common;
        Seq2ClfUseCase {
            train_source: self.train_source,
            train_target: self.train_target,
            valid_source: self.valid_source,
            valid_target: self.valid_target,
            source_vocab: self.source_vocab,
            balance_weights: self.balance_weights,
            gpu: common.gpu,
            train: Seq2ClfTrainConfig {
                epochs: common.epochs,
                batch_size: common.batch_size,
                workers: common.workers,
                grad_clip: common.grad_clip,
                seed: common.seed,
                emb_size: self.emb_size,
                enc_filters: self.enc_filters,
                enc_kernel_width: self.enc_kernel_width,
                dropout: self.dropout,
                opt_lr: common.opt_lr,
                sch_factor: common.sch_factor,
                sch_patience: common.sch_patience,
                sch_metric: common.sch_metric,
                model_path: common.model_path.clone(),
                results_path: common.results_path.clone(),
                overwrite_model: common.overwrite_model,
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct CopyTaskArgs {
    /// Number of distinct tokens to sample from
    #[arg(long, default_value_t = 50)]
    pub vocab_size: usize,

    /// Sequence lengths are uniform in [1, max-length]
    #[arg(long, default_value_t = 10)]
    pub max_length: usize,

    #[arg(long, default_value_t = 2000)]
    pub train_size: usize,

    #[arg(long, default_value_t = 500)]
    pub valid_size: usize,

    #[arg(long, default_value_t = 128)]
    pub emb_size: usize,

    #[arg(long, default_value_t = 256)]
    pub hidden_size: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    #[command(flatten)]
    pub common: CommonTrainArgs,
}

impl CopyTaskArgs {
    pub fn into_use_case(self) -> CopyTaskUseCase {
        CopyTaskUseCase {
            vocab_size: self.vocab_size,
            max_length: self.max_length,
            train_size: self.train_size,
            valid_size: self.valid_size,
            gpu: self.common.gpu,
            train: seq2seq_train_config(
                self.emb_size,
                self.hidden_size,
                self.dropout,
                &self.common,
            ),
        }
    }
}

fn seq2seq_train_config(
    emb_size: usize,
    hidden_size: usize,
    dropout: f64,
    common: &CommonTrainArgs,
) -> Seq2SeqTrainConfig {
    Seq2SeqTrainConfig {
        epochs: common.epochs,
        batch_size: common.batch_size,
        workers: common.workers,
        grad_clip: common.grad_clip,
        seed: common.seed,
        emb_size,
        hidden_size,
        dropout,
        opt_lr: common.opt_lr,
        sch_factor: common.sch_factor,
        sch_patience: common.sch_patience,
        sch_metric: common.sch_metric,
        model_path: common.model_path.clone(),
        results_path: common.results_path.clone(),
        overwrite_model: common.overwrite_model,
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use super::*;
    use clap::Parser;

    #[test]
    fn copy_task_defaults_parse() {
        let cli = Cli::parse_from(["seqtrain", "copy-task"]);
        let Commands::CopyTask(args) = cli.command else {
            panic!("expected copy-task");
        };
        assert_eq!(args.vocab_size, 50);
        assert_eq!(args.common.gpu, -1);
        assert_eq!(args.common.sch_metric, TrainMetric::XEntropy);
    }

    #[test]
    fn negative_gpu_and_metric_flags_parse() {
        let cli = Cli::parse_from([
            "seqtrain",
            "copy-task",
            "--gpu",
            "-1",
            "--sch-metric",
            "accuracy",
            "--epochs",
            "3",
        ]);
        let Commands::CopyTask(args) = cli.command else {
            panic!("expected copy-task");
        };
        assert_eq!(args.common.gpu, -1);
        assert_eq!(args.common.sch_metric, TrainMetric::Accuracy);
        assert_eq!(args.common.epochs, 3);
    }

    #[test]
    fn seq2clf_requires_paths() {
        let result = Cli::try_parse_from(["seqtrain", "seq2clf"]);
        assert!(result.is_err());
    }

    #[test]
    fn seq2seq_args_become_a_train_config() {
        let cli = Cli::parse_from([
            "seqtrain",
            "seq2seq",
            "--train-source",
            "ts.txt",
            "--train-target",
            "tt.txt",
            "--valid-source",
            "vs.txt",
            "--valid-target",
            "vt.txt",
            "--hidden-size",
            "64",
            "--grad-clip",
            "2.5",
        ]);
        let Commands::Seq2Seq(args) = cli.command else {
            panic!("expected seq2seq");
        };
        let use_case = args.into_use_case();
        assert_eq!(use_case.train.hidden_size, 64);
        assert_eq!(use_case.train.grad_clip, 2.5);
        assert_eq!(use_case.train.epochs, 50);
    }
}
