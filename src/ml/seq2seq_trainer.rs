// ============================================================
// Layer 5 — seq2seq Training Loop
// ============================================================
// Teacher-forced cross-entropy over decoder positions. Padding
// targets are excluded from the loss and from token accuracy, so
// the per-epoch averages are weighted by real token count rather
// than by batch count.
//
// Validation tracks x-entropy and token accuracy; there is no F1
// for a token-level task, so keying the scheduler on f1 is
// rejected up front.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use console::style;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};

use crate::data::batcher::Seq2SeqBatcher;
use crate::data::parallel::Seq2SeqDataset;
use crate::data::vocab::PAD;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::LossAccumulator;
use crate::infra::results::TrainingHistory;
use crate::infra::scheduler::{OptimizerScheduler, TrainMetric};
use crate::ml::seq2seq::Seq2SeqModelConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seq2SeqTrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub workers: usize,
    pub grad_clip: f32,
    pub seed: u64,
    pub emb_size: usize,
    pub hidden_size: usize,
    pub dropout: f64,
    pub opt_lr: f64,
    pub sch_factor: f64,
    pub sch_patience: usize,
    pub sch_metric: TrainMetric,
    pub model_path: Option<PathBuf>,
    pub results_path: Option<PathBuf>,
    pub overwrite_model: bool,
}

pub fn train_loop<B: AutodiffBackend>(
    cfg: &Seq2SeqTrainConfig,
    source_vocab_size: usize,
    target_vocab_size: usize,
    train_dataset: Seq2SeqDataset,
    valid_dataset: Seq2SeqDataset,
    device: B::Device,
) -> Result<()> {
    ensure!(
        cfg.sch_metric != TrainMetric::F1,
        "seq2seq training does not produce an f1 metric; use x-entropy or accuracy"
    );

    // ── Model ─────────────────────────────────────────────────────────────────
    let model_cfg = Seq2SeqModelConfig::new(source_vocab_size, target_vocab_size)
        .with_emb_size(cfg.emb_size)
        .with_hidden_size(cfg.hidden_size)
        .with_dropout(cfg.dropout);
    let mut model = model_cfg.init::<B>(&device);

    let mut checkpoint = match &cfg.model_path {
        Some(path) => {
            let manager = CheckpointManager::new(path, cfg.sch_metric, cfg.overwrite_model)?;
            manager.save_config(&model_cfg)?;
            Some(manager)
        }
        None => None,
    };

    // ── Optimizer + scheduler ─────────────────────────────────────────────────
    let mut optim = AdamConfig::new()
        .with_grad_clipping(Some(GradientClippingConfig::Value(cfg.grad_clip)))
        .init();
    let mut scheduler = OptimizerScheduler::new(
        cfg.opt_lr,
        cfg.sch_metric,
        cfg.sch_factor,
        cfg.sch_patience,
    );

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_loader = DataLoaderBuilder::new(Seq2SeqBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.workers)
        .build(train_dataset);
    let valid_loader =
        DataLoaderBuilder::new(Seq2SeqBatcher::<B::InnerBackend>::new(device.clone()))
            .batch_size(cfg.batch_size)
            .num_workers(cfg.workers)
            .build(valid_dataset);

    // Padding targets come from length alignment, not the data.
    let train_loss_fn = CrossEntropyLossConfig::new()
        .with_pad_tokens(Some(vec![PAD]))
        .init(&device);
    let valid_loss_fn = CrossEntropyLossConfig::new()
        .with_pad_tokens(Some(vec![PAD]))
        .init(&device);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut history = TrainingHistory::default();
    let mut best_xent = f64::INFINITY;
    let mut best_acc = f64::NEG_INFINITY;

    for epoch in 1..=cfg.epochs {
        let epoch_start = Instant::now();

        // ── Training pass ─────────────────────────────────────────────────────
        let progress = ProgressBar::new_spinner();
        let mut train_loss = LossAccumulator::new();

        for batch in train_loader.iter() {
            let [batch_size, tgt_len] = batch.decoder_targets.dims();
            let logits = model.forward(batch.source_ids, batch.decoder_inputs);

            let flat_logits = logits.reshape([batch_size * tgt_len, target_vocab_size]);
            let flat_targets = batch.decoder_targets.reshape([batch_size * tgt_len]);

            let token_count = flat_targets
                .clone()
                .not_equal_elem(PAD as i32)
                .int()
                .sum()
                .into_scalar()
                .elem::<i64>() as usize;

            let objective = train_loss_fn.forward(flat_logits, flat_targets);
            train_loss.update(objective.clone().into_scalar().elem::<f64>(), token_count);

            let grads = GradientsParams::from_grads(objective.backward(), &model);
            model = optim.step(scheduler.lr(), model, grads);

            progress.set_message(format!(
                "Epoch[{epoch}] Training x-entropy: {:.3}",
                train_loss.average()
            ));
            progress.inc(1);
        }
        progress.finish_and_clear();

        let train_xent = train_loss.average();
        history.training.x_entropy.push(train_xent);
        println!("Epoch[{epoch}] Training x-entropy={train_xent:.3}");

        // ── Validation pass ───────────────────────────────────────────────────
        let model_valid = model.valid();
        let mut valid_loss = LossAccumulator::new();
        let mut correct_tokens: i64 = 0;
        let mut total_tokens: i64 = 0;

        for batch in valid_loader.iter() {
            let [batch_size, tgt_len] = batch.decoder_targets.dims();
            let logits = model_valid.forward(batch.source_ids, batch.decoder_inputs);

            let flat_logits = logits.reshape([batch_size * tgt_len, target_vocab_size]);
            let flat_targets = batch.decoder_targets.reshape([batch_size * tgt_len]);
            let mask = flat_targets.clone().not_equal_elem(PAD as i32);

            let token_count = mask.clone().int().sum().into_scalar().elem::<i64>();
            total_tokens += token_count;

            let loss = valid_loss_fn.forward(flat_logits.clone(), flat_targets.clone());
            valid_loss.update(loss.into_scalar().elem::<f64>(), token_count as usize);

            let predictions = flat_logits.argmax(1).flatten::<1>(0, 1);
            correct_tokens += predictions
                .equal(flat_targets)
                .int()
                .mul(mask.int())
                .sum()
                .into_scalar()
                .elem::<i64>();
        }

        let valid_xent = valid_loss.average();
        let accuracy = if total_tokens > 0 {
            correct_tokens as f64 / total_tokens as f64
        } else {
            0.0
        };

        // ── Best tracking + display ───────────────────────────────────────────
        let xent_text = format!("x-entropy={valid_xent:.3}");
        let xent_text = if valid_xent < best_xent {
            best_xent = valid_xent;
            style(xent_text).green().to_string()
        } else {
            xent_text
        };
        let acc_text = format!("accuracy={accuracy:.3}");
        let acc_text = if accuracy > best_acc {
            best_acc = accuracy;
            style(acc_text).green().to_string()
        } else {
            acc_text
        };
        println!("Epoch[{epoch}] Validation {xent_text} {acc_text}");

        history.validation.x_entropy.push(valid_xent);
        history.validation.accuracy.push(accuracy);

        // ── Scheduler + checkpoint, both keyed on --sch-metric ───────────────
        let keyed = history
            .last_validation(scheduler.metric())
            .context("validation history is empty after an epoch")?;
        scheduler.step(keyed);

        if let Some(manager) = checkpoint.as_mut() {
            let value = history
                .last_validation(manager.metric())
                .context("validation history is empty after an epoch")?;
            if manager.save_if_better(model.clone(), value)? {
                tracing::info!(
                    "epoch {epoch}: new best {}={value:.4}, checkpoint saved",
                    manager.metric()
                );
            }
        }

        if let Some(path) = &cfg.results_path {
            history.write(path)?;
        }

        println!(
            "Epoch[{epoch}] Time taken: {:.1}s\n",
            epoch_start.elapsed().as_secs_f64()
        );
    }

    Ok(())
}
