// ============================================================
// Layer 5 — Machine Learning Layer
// ============================================================
// Burn models and their training loops:
//
//   seq2seq.rs / seq2seq_trainer.rs — LSTM encoder/decoder with
//       teacher forcing, padding-aware token cross-entropy
//
//   seq2clf.rs / seq2clf_trainer.rs — convolutional sequence
//       classifier with one head per label field, per-field
//       cross-entropy averaged into a single objective
//
// Both trainers share the infra layer: plateau LR scheduling,
// metric-keyed checkpointing and the JSON results history.

/// Convolutional multi-head sequence classifier
pub mod seq2clf;

/// seq2clf train/validation loop
pub mod seq2clf_trainer;

/// LSTM encoder/decoder model
pub mod seq2seq;

/// seq2seq train/validation loop
pub mod seq2seq_trainer;
