// ============================================================
// Layer 6 — Optimizer Scheduler
// ============================================================
// Burn ships time-based LR schedules but nothing keyed on a
// validation metric, so the reduce-on-plateau rule lives here:
// after `patience` epochs without improvement on the target
// metric, the learning rate is multiplied by `factor`.
//
// All comparisons happen in "score space": TrainMetric::score
// negates x-entropy so that greater-is-better holds uniformly.
// Checkpoint selection uses the same function, which is what
// makes "lower x-entropy wins, higher accuracy/F1 wins" a single
// tested invariant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrainMetric {
    XEntropy,
    Accuracy,
    F1,
}

impl TrainMetric {
    pub fn name(&self) -> &'static str {
        match self {
            TrainMetric::XEntropy => "x-entropy",
            TrainMetric::Accuracy => "accuracy",
            TrainMetric::F1 => "f1",
        }
    }

    /// Map a raw metric value into score space where greater is
    /// always better. Cross-entropy is negated.
    pub fn score(&self, value: f64) -> f64 {
        match self {
            TrainMetric::XEntropy => -value,
            TrainMetric::Accuracy | TrainMetric::F1 => value,
        }
    }
}

impl fmt::Display for TrainMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrainMetric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x-entropy" => Ok(TrainMetric::XEntropy),
            "accuracy" => Ok(TrainMetric::Accuracy),
            "f1" => Ok(TrainMetric::F1),
            other => anyhow::bail!(
                "unknown metric '{other}' (expected x-entropy, accuracy, or f1)"
            ),
        }
    }
}

/// Owns the learning rate handed to the optimizer each step and
/// reduces it when the keyed validation metric plateaus.
pub struct OptimizerScheduler {
    lr: f64,
    metric: TrainMetric,
    factor: f64,
    patience: usize,
    counter: usize,
    best: f64,
}

impl OptimizerScheduler {
    pub fn new(lr: f64, metric: TrainMetric, factor: f64, patience: usize) -> Self {
        Self {
            lr,
            metric,
            factor,
            patience,
            counter: 0,
            best: f64::NEG_INFINITY,
        }
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn metric(&self) -> TrainMetric {
        self.metric
    }

    /// Call once per epoch with the latest value of the keyed metric.
    pub fn step(&mut self, value: f64) {
        let score = self.metric.score(value);
        if score > self.best {
            self.best = score;
            self.counter = 0;
            return;
        }
        self.counter += 1;
        if self.counter >= self.patience {
            self.lr *= self.factor;
            self.counter = 0;
            tracing::info!(
                "no improvement in {} for {} epochs, reducing lr to {:.2e}",
                self.metric,
                self.patience,
                self.lr
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_xentropy_is_better() {
        assert!(TrainMetric::XEntropy.score(0.5) > TrainMetric::XEntropy.score(1.0));
    }

    #[test]
    fn higher_accuracy_and_f1_are_better() {
        assert!(TrainMetric::Accuracy.score(0.9) > TrainMetric::Accuracy.score(0.1));
        assert!(TrainMetric::F1.score(0.9) > TrainMetric::F1.score(0.1));
    }

    #[test]
    fn parses_metric_names() {
        assert_eq!("x-entropy".parse::<TrainMetric>().unwrap(), TrainMetric::XEntropy);
        assert_eq!("accuracy".parse::<TrainMetric>().unwrap(), TrainMetric::Accuracy);
        assert_eq!("f1".parse::<TrainMetric>().unwrap(), TrainMetric::F1);
        assert!("rouge".parse::<TrainMetric>().is_err());
    }

    #[test]
    fn reduces_lr_after_patience_epochs() {
        let mut sch = OptimizerScheduler::new(1.0, TrainMetric::XEntropy, 0.5, 2);
        sch.step(1.0); // best = -1.0
        sch.step(1.1); // worse, counter 1
        assert_eq!(sch.lr(), 1.0);
        sch.step(1.2); // worse, counter 2 -> reduce
        assert_eq!(sch.lr(), 0.5);
    }

    #[test]
    fn improvement_resets_the_counter() {
        let mut sch = OptimizerScheduler::new(1.0, TrainMetric::Accuracy, 0.5, 2);
        sch.step(0.5);
        sch.step(0.4); // counter 1
        sch.step(0.6); // improvement, counter 0
        sch.step(0.5); // counter 1
        assert_eq!(sch.lr(), 1.0);
        sch.step(0.5); // counter 2 -> reduce
        assert_eq!(sch.lr(), 0.5);
    }
}
