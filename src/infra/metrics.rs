// ============================================================
// Layer 6 — Metric Accumulators
// ============================================================
// Streaming accumulators updated batch by batch and read out at
// the end of each epoch:
//
//   LossAccumulator       — weighted running average of batch
//                           losses (weight = samples or tokens)
//   ClassificationMetrics — per-class confusion counts yielding
//                           accuracy and macro F1
//
// Macro F1 averages per-class F1 uniformly; classes never
// predicted and never seen contribute 0, matching the usual
// zero-division convention.

#[derive(Debug, Default)]
pub struct LossAccumulator {
    total: f64,
    weight: f64,
}

impl LossAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `loss` is the batch mean, `weight` the number of samples
    /// (or tokens) it was averaged over.
    pub fn update(&mut self, loss: f64, weight: usize) {
        self.total += loss * weight as f64;
        self.weight += weight as f64;
    }

    pub fn average(&self) -> f64 {
        if self.weight > 0.0 {
            self.total / self.weight
        } else {
            f64::NAN
        }
    }
}

#[derive(Debug)]
pub struct ClassificationMetrics {
    true_positives: Vec<usize>,
    false_positives: Vec<usize>,
    false_negatives: Vec<usize>,
    correct: usize,
    total: usize,
}

impl ClassificationMetrics {
    pub fn new(num_classes: usize) -> Self {
        Self {
            true_positives: vec![0; num_classes],
            false_positives: vec![0; num_classes],
            false_negatives: vec![0; num_classes],
            correct: 0,
            total: 0,
        }
    }

    pub fn update(&mut self, predictions: &[i64], truths: &[i64]) {
        debug_assert_eq!(predictions.len(), truths.len());
        for (&pred, &truth) in predictions.iter().zip(truths) {
            self.total += 1;
            if pred == truth {
                self.correct += 1;
                self.true_positives[truth as usize] += 1;
            } else {
                self.false_positives[pred as usize] += 1;
                self.false_negatives[truth as usize] += 1;
            }
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.total > 0 {
            self.correct as f64 / self.total as f64
        } else {
            0.0
        }
    }

    /// Uniform average of per-class F1 scores.
    pub fn macro_f1(&self) -> f64 {
        let classes = self.true_positives.len();
        if classes == 0 {
            return 0.0;
        }
        let sum: f64 = (0..classes).map(|c| self.class_f1(c)).sum();
        sum / classes as f64
    }

    fn class_f1(&self, class: usize) -> f64 {
        let tp = self.true_positives[class] as f64;
        let fp = self.false_positives[class] as f64;
        let fn_ = self.false_negatives[class] as f64;
        if tp == 0.0 {
            return 0.0;
        }
        let precision = tp / (tp + fp);
        let recall = tp / (tp + fn_);
        2.0 * precision * recall / (precision + recall)
    }
}
