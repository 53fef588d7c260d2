// ============================================================
// Layer 5 — seq2clf Training Loop
// ============================================================
// Full train + validation loop over Burn's DataLoader:
//
//   per step:  forward → per-field cross-entropy averaged across
//              label fields → backward → Adam step at the
//              scheduler's current lr (gradients value-clipped
//              to [-grad_clip, grad_clip] by the optimizer)
//   per epoch: full validation pass on the inner backend
//              (model.valid(), no autodiff overhead) computing
//              x-entropy plus per-field accuracy and macro F1,
//              best-metric tracking with green highlighting,
//              plateau scheduler step and checkpoint save keyed
//              on --sch-metric, results JSON rewrite
//
// Error handling stays with the framework: a bad batch or device
// failure propagates out of the loop unchanged.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use console::style;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};

use crate::data::batcher::Seq2ClfBatcher;
use crate::data::labels::{LabelVocab, Seq2ClfDataset};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{ClassificationMetrics, LossAccumulator};
use crate::infra::results::TrainingHistory;
use crate::infra::scheduler::{OptimizerScheduler, TrainMetric};
use crate::ml::seq2clf::Seq2ClfModelConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seq2ClfTrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub workers: usize,
    pub grad_clip: f32,
    pub seed: u64,
    pub emb_size: usize,
    pub enc_filters: usize,
    pub enc_kernel_width: usize,
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
    cfg: &Seq2ClfTrainConfig,
    vocab_size: usize,
    label_vocabs: &[LabelVocab],
    label_weights: Option<Vec<Vec<f32>>>,
    train_dataset: Seq2ClfDataset,
    valid_dataset: Seq2ClfDataset,
    device: B::Device,
) -> Result<()> {
    ensure!(
        !label_vocabs.is_empty(),
        "seq2clf training needs at least one label field"
    );
    let num_fields = label_vocabs.len();

    // ── Model ─────────────────────────────────────────────────────────────────
    let label_sizes: Vec<usize> = label_vocabs.iter().map(|v| v.len()).collect();
    let model_cfg = Seq2ClfModelConfig::new(vocab_size, label_sizes)
        .with_emb_size(cfg.emb_size)
        .with_filters(cfg.enc_filters)
        .with_kernel_width(cfg.enc_kernel_width)
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
    // Value clipping reproduces clamping every gradient entry to
    // the [-grad_clip, grad_clip] range.
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
    let train_loader = DataLoaderBuilder::new(Seq2ClfBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.workers)
        .build(train_dataset);
    let valid_loader =
        DataLoaderBuilder::new(Seq2ClfBatcher::<B::InnerBackend>::new(device.clone()))
            .batch_size(cfg.batch_size)
            .num_workers(cfg.workers)
            .build(valid_dataset);

    // ── Loss functions (per label field) ─────────────────────────────────────
    let train_losses: Vec<CrossEntropyLoss<B>> = (0..num_fields)
        .map(|f| {
            let mut config = CrossEntropyLossConfig::new();
            if let Some(weights) = &label_weights {
                config = config.with_weights(Some(weights[f].clone()));
            }
            config.init(&device)
        })
        .collect();
    // Validation loss is unweighted so runs with and without
    // --balance-weights stay comparable.
    let valid_losses: Vec<CrossEntropyLoss<B::InnerBackend>> = (0..num_fields)
        .map(|_| CrossEntropyLossConfig::new().init(&device))
        .collect();

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut history = TrainingHistory::default();
    let mut best_xent = f64::INFINITY;
    let mut best_acc = f64::NEG_INFINITY;
    let mut best_f1 = f64::NEG_INFINITY;

    for epoch in 1..=cfg.epochs {
        let epoch_start = Instant::now();

        // ── Training pass ─────────────────────────────────────────────────────
        let progress = ProgressBar::new_spinner();
        let mut train_loss = LossAccumulator::new();

        for batch in train_loader.iter() {
            let batch_size = batch.source_lengths.dims()[0];
            let logits = model.forward(batch.source_ids, batch.source_mask);

            let mut field_losses = Vec::with_capacity(num_fields);
            for ((logits, targets), loss_fn) in
                logits.into_iter().zip(batch.targets).zip(&train_losses)
            {
                field_losses.push(loss_fn.forward(logits, targets));
            }
            // num_fields >= 1 was checked up front.
            let mut total = field_losses.remove(0);
            for loss in field_losses {
                total = total + loss;
            }
            let objective = total / num_fields as f64;

            train_loss.update(objective.clone().into_scalar().elem::<f64>(), batch_size);

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
        let mut clf_metrics: Vec<ClassificationMetrics> = label_vocabs
            .iter()
            .map(|v| ClassificationMetrics::new(v.len()))
            .collect();

        for batch in valid_loader.iter() {
            let batch_size = batch.source_lengths.dims()[0];
            let logits = model_valid.forward(batch.source_ids, batch.source_mask);

            let mut batch_xent = 0.0;
            for (f, (logits, targets)) in logits.into_iter().zip(batch.targets).enumerate() {
                batch_xent += valid_losses[f]
                    .forward(logits.clone(), targets.clone())
                    .into_scalar()
                    .elem::<f64>();

                let predictions = logits.argmax(1).flatten::<1>(0, 1).into_data();
                let predictions: Vec<i64> = predictions.iter::<i64>().collect();
                let truths = targets.into_data();
                let truths: Vec<i64> = truths.iter::<i64>().collect();
                clf_metrics[f].update(&predictions, &truths);
            }
            valid_loss.update(batch_xent / num_fields as f64, batch_size);
        }

        let valid_xent = valid_loss.average();
        let accuracy =
            clf_metrics.iter().map(|m| m.accuracy()).sum::<f64>() / num_fields as f64;
        let f1 = clf_metrics.iter().map(|m| m.macro_f1()).sum::<f64>() / num_fields as f64;

        // ── Best tracking + display ───────────────────────────────────────────
        // Improved values are printed green.
        let xent_text = format!("x-entropy={valid_xent:.3}");
        let xent_text = if valid_xent < best_xent {
            best_xent = valid_xent;
            style(xent_text).green().to_string()
        } else {
            xent_text
        };
        println!("Epoch[{epoch}] Validation {xent_text}");

        let f1_text = format!("avg: {f1:.3}");
        let f1_text = if f1 > best_f1 {
            best_f1 = f1;
            style(f1_text).green().to_string()
        } else {
            f1_text
        };
        let per_field_f1: Vec<String> = label_vocabs
            .iter()
            .zip(&clf_metrics)
            .map(|(v, m)| format!("{}: {:.3}", v.field, m.macro_f1()))
            .collect();
        println!("  F1  {f1_text} {}", per_field_f1.join(" "));

        let acc_text = format!("avg: {accuracy:.3}");
        let acc_text = if accuracy > best_acc {
            best_acc = accuracy;
            style(acc_text).green().to_string()
        } else {
            acc_text
        };
        let per_field_acc: Vec<String> = label_vocabs
            .iter()
            .zip(&clf_metrics)
            .map(|(v, m)| format!("{}: {:.3}", v.field, m.accuracy()))
            .collect();
        println!("  ACC {acc_text} {}", per_field_acc.join(" "));

        history.validation.x_entropy.push(valid_xent);
        history.validation.accuracy.push(accuracy);
        history.validation.f1.push(f1);

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
