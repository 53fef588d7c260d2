// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves model weights with Burn's gzipped MessagePack recorder
// (half precision) whenever the
// keyed validation metric improves, keeping only the best file.
//
// File naming convention (model path "runs/model", keyed on
// x-entropy, value 2.3456):
//
//   runs/
//     model_x-entropy=2_3456.mpk.gz  ← current best weights
//     model_config.json              ← model hyperparameters
//
// The score's decimal point is written as '_' because Burn's
// file recorders call set_extension on the path, which would
// truncate the name at the last dot.
//
// Comparison goes through TrainMetric::score, so x-entropy
// checkpoints treat lower values as better while accuracy/F1
// treat higher as better.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use burn::module::Module;
use burn::record::{HalfPrecisionSettings, NamedMpkGzFileRecorder, Recorder};
use burn::tensor::backend::Backend;
use serde::Serialize;

use crate::infra::scheduler::TrainMetric;

pub struct CheckpointManager {
    dir: PathBuf,
    prefix: String,
    metric: TrainMetric,
    best: f64,
    current: Option<PathBuf>,
}

impl CheckpointManager {
    /// `model_path` is the directory-plus-prefix the checkpoint
    /// files are derived from. Unless `overwrite` is set, a
    /// directory that already contains files for this prefix is
    /// refused so a rerun cannot silently clobber trained weights.
    pub fn new(model_path: &Path, metric: TrainMetric, overwrite: bool) -> Result<Self> {
        let prefix = model_path
            .file_name()
            .with_context(|| format!("model path '{}' has no file name", model_path.display()))?
            .to_string_lossy()
            .into_owned();
        let dir = match model_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        fs::create_dir_all(&dir).with_context(|| {
            format!("cannot create checkpoint directory '{}'", dir.display())
        })?;

        if !overwrite {
            for entry in fs::read_dir(&dir)? {
                let name = entry?.file_name().to_string_lossy().into_owned();
                if name.starts_with(&prefix) {
                    bail!(
                        "checkpoint directory '{}' already contains '{}'; \
                         pass --overwrite-model to replace it",
                        dir.display(),
                        name
                    );
                }
            }
        }

        Ok(Self {
            dir,
            prefix,
            metric,
            best: f64::NEG_INFINITY,
            current: None,
        })
    }

    pub fn metric(&self) -> TrainMetric {
        self.metric
    }

    /// Record the model if `value` beats the best seen so far for
    /// the keyed metric. The previously best file is removed.
    /// Returns whether a checkpoint was written.
    pub fn save_if_better<B, M>(&mut self, model: M, value: f64) -> Result<bool>
    where
        B: Backend,
        M: Module<B>,
    {
        let score = self.metric.score(value);
        if score <= self.best {
            return Ok(false);
        }

        let stem = format!(
            "{}_{}={}",
            self.prefix,
            self.metric.name(),
            format!("{value:.4}").replace('.', "_")
        );
        let path = self.dir.join(stem);
        NamedMpkGzFileRecorder::<HalfPrecisionSettings>::new()
            .record(model.into_record(), path.clone())
            .map_err(|e| {
                anyhow::anyhow!("failed to save checkpoint '{}': {e:?}", path.display())
            })?;

        if let Some(old) = self.current.take() {
            // Best effort: a stale file is not worth failing the run.
            let _ = fs::remove_file(old);
        }
        self.current = Some(PathBuf::from(format!("{}.mpk.gz", path.display())));
        self.best = score;
        Ok(true)
    }

    /// Persist the model hyperparameters next to the weights so the
    /// exact architecture can be rebuilt before loading them.
    pub fn save_config<C: Serialize>(&self, config: &C) -> Result<()> {
        let path = self.dir.join(format!("{}_config.json", self.prefix));
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&path, json)
            .with_context(|| format!("cannot write config to '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;
    use burn::nn::LinearConfig;

    fn checkpoint_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("read dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".mpk.gz"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn saves_on_improvement_and_keeps_only_best() {
        let dir = tempfile::tempdir().expect("temp dir");
        let model_path = dir.path().join("model");
        let mut manager =
            CheckpointManager::new(&model_path, TrainMetric::XEntropy, false).expect("manager");

        let device = NdArrayDevice::Cpu;
        let model = LinearConfig::new(2, 2).init::<NdArray>(&device);

        // First epoch always improves on -inf.
        assert!(manager.save_if_better(model.clone(), 2.5).expect("save"));
        assert_eq!(
            checkpoint_files(dir.path()),
            vec!["model_x-entropy=2_5000.mpk.gz"]
        );

        // Higher x-entropy is worse: no save, file unchanged.
        assert!(!manager.save_if_better(model.clone(), 3.0).expect("save"));
        assert_eq!(
            checkpoint_files(dir.path()),
            vec!["model_x-entropy=2_5000.mpk.gz"]
        );

        // Lower x-entropy is better: old file replaced.
        assert!(manager.save_if_better(model, 1.75).expect("save"));
        assert_eq!(
            checkpoint_files(dir.path()),
            vec!["model_x-entropy=1_7500.mpk.gz"]
        );
    }

    #[test]
    fn accuracy_treats_higher_as_better() {
        let dir = tempfile::tempdir().expect("temp dir");
        let model_path = dir.path().join("clf");
        let mut manager =
            CheckpointManager::new(&model_path, TrainMetric::Accuracy, false).expect("manager");

        let device = NdArrayDevice::Cpu;
        let model = LinearConfig::new(2, 2).init::<NdArray>(&device);

        assert!(manager.save_if_better(model.clone(), 0.5).expect("save"));
        assert!(!manager.save_if_better(model.clone(), 0.4).expect("save"));
        assert!(manager.save_if_better(model, 0.6).expect("save"));
        assert_eq!(
            checkpoint_files(dir.path()),
            vec!["clf_accuracy=0_6000.mpk.gz"]
        );
    }

    #[test]
    fn refuses_non_empty_directory_without_overwrite() {
        let dir = tempfile::tempdir().expect("temp dir");
        let model_path = dir.path().join("model");
        fs::write(dir.path().join("model_x-entropy=9_0000.mpk.gz"), b"old").expect("seed file");

        assert!(CheckpointManager::new(&model_path, TrainMetric::XEntropy, false).is_err());
        assert!(CheckpointManager::new(&model_path, TrainMetric::XEntropy, true).is_ok());
    }

    #[test]
    fn unrelated_files_do_not_block() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("notes.txt"), b"unrelated").expect("seed file");
        let model_path = dir.path().join("model");
        assert!(CheckpointManager::new(&model_path, TrainMetric::F1, false).is_ok());
    }
}
