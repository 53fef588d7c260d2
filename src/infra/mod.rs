// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns shared by both trainers:
//
//   checkpoint.rs — metric-keyed best-model checkpointing via
//                   Burn's CompactRecorder, plus the model
//                   config JSON needed to rebuild the model
//
//   scheduler.rs  — TrainMetric (the lower/higher-is-better
//                   convention) and the reduce-on-plateau
//                   learning-rate scheduler
//
//   metrics.rs    — streaming loss / classification accumulators
//
//   results.rs    — the JSON training/validation history file

/// Metric-keyed model checkpoint saving
pub mod checkpoint;

/// Loss and classification metric accumulators
pub mod metrics;

/// Training/validation history persisted as JSON
pub mod results;

/// Target metric definition and plateau LR scheduling
pub mod scheduler;
