// ============================================================
// Layer 6 — Results History
// ============================================================
// Append-only per-epoch metric series, rewritten to the results
// file as JSON after every epoch so a crashed run still leaves
// the history up to its last completed epoch on disk:
//
//   {"training": {"x-entropy": [...]},
//    "validation": {"x-entropy": [...], "accuracy": [...], "f1": [...]}}

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::infra::scheduler::TrainMetric;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricSeries {
    #[serde(rename = "x-entropy")]
    pub x_entropy: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accuracy: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub f1: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub training: MetricSeries,
    pub validation: MetricSeries,
}

impl TrainingHistory {
    /// Most recent validation value for the given metric, if any
    /// epoch has completed. Scheduler stepping and checkpoint
    /// scoring both key off this.
    pub fn last_validation(&self, metric: TrainMetric) -> Option<f64> {
        let series = match metric {
            TrainMetric::XEntropy => &self.validation.x_entropy,
            TrainMetric::Accuracy => &self.validation.accuracy,
            TrainMetric::F1 => &self.validation.f1,
        };
        series.last().copied()
    }

    /// Serialize the cumulative history, creating parent
    /// directories on demand.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("cannot create results directory '{}'", parent.display())
                })?;
            }
        }
        let json = serde_json::to_string(self)?;
        fs::write(path, json)
            .with_context(|| format!("cannot write results to '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_into_missing_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("deeper").join("results.json");

        let mut history = TrainingHistory::default();
        history.training.x_entropy.push(2.5);
        history.validation.x_entropy.push(2.1);
        history.validation.accuracy.push(0.4);
        history.validation.f1.push(0.3);
        history.write(&path).expect("write");

        let text = fs::read_to_string(&path).expect("read back");
        let parsed: TrainingHistory = serde_json::from_str(&text).expect("parse");
        assert_eq!(parsed.training.x_entropy, vec![2.5]);
        assert_eq!(parsed.validation.accuracy, vec![0.4]);
    }

    #[test]
    fn json_uses_hyphenated_metric_name() {
        let mut history = TrainingHistory::default();
        history.training.x_entropy.push(1.0);
        history.validation.x_entropy.push(1.0);
        let json = serde_json::to_string(&history).expect("serialize");
        assert!(json.contains("\"x-entropy\""));
    }

    #[test]
    fn empty_series_are_omitted() {
        // seq2seq histories have no f1 series; the file should not
        // carry empty arrays for them
        let mut history = TrainingHistory::default();
        history.validation.x_entropy.push(1.0);
        let json = serde_json::to_string(&history).expect("serialize");
        assert!(!json.contains("\"f1\""));
    }

    #[test]
    fn last_validation_follows_the_metric() {
        let mut history = TrainingHistory::default();
        assert!(history.last_validation(TrainMetric::XEntropy).is_none());
        history.validation.x_entropy.extend([2.0, 1.5]);
        history.validation.accuracy.extend([0.5, 0.6]);
        history.validation.f1.extend([0.4, 0.45]);
        assert_eq!(history.last_validation(TrainMetric::XEntropy), Some(1.5));
        assert_eq!(history.last_validation(TrainMetric::Accuracy), Some(0.6));
        assert_eq!(history.last_validation(TrainMetric::F1), Some(0.45));
    }
}
