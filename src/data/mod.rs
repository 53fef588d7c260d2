// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw text files (or synthetic generation) to
// GPU-ready tensor batches.
//
//   source/target files ── parallel.rs ──┐
//   JSON-lines labels ──── labels.rs ────┤
//   synthetic copy task ── copy.rs ──────┤
//                                        ▼
//   Vocab (vocab.rs)  →  encoded items  →  Dataset impls
//                                        │
//                                        ▼
//   batcher.rs  →  padded Int tensors   →  DataLoader
//
// Each module is responsible for exactly one step.

/// Token/id vocabulary with pad/unk/start/stop specials
pub mod vocab;

/// Deterministic synthetic copy-task dataset
pub mod copy;

/// Parallel source/target text files for seq2seq
pub mod parallel;

/// JSON-lines label files and label vocabularies for seq2clf
pub mod labels;

/// Burn Batcher impls with dynamic padding
pub mod batcher;
