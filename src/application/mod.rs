// ============================================================
// Layer 2 — Application Layer
// ============================================================
// One use case per training entry point. Each use case owns plain
// configs (no clap types past this boundary), loads and encodes
// the data, then dispatches the training loop onto the requested
// backend:
//
//   gpu >= 0 → Autodiff<Wgpu> on DiscreteGpu(gpu)
//   gpu <  0 → Autodiff<NdArray> on the CPU

/// Train seq2seq on the synthetic copy dataset
pub mod copy_task_use_case;

/// Train the convolutional sequence classifier
pub mod seq2clf_use_case;

/// Train the LSTM encoder/decoder on parallel text
pub mod seq2seq_use_case;
