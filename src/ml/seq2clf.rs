// ============================================================
// Layer 5 — seq2clf Model
// ============================================================
// Convolutional sequence classifier with one output head per
// label field:
//
//   token ids → Embedding → Conv1d (same padding) → ReLU
//            → masked max-pool over time → Linear head per field
//
// Padding positions are filled with -inf before the max-pool so
// they can never win the pooling, whatever the conv produced
// for them.

use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear, LinearConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::relu,
};

#[derive(Config, Debug)]
pub struct Seq2ClfModelConfig {
    pub vocab_size: usize,
    /// Number of classes per label field, in LabelVocab order.
    pub label_sizes: Vec<usize>,
    #[config(default = 128)]
    pub emb_size: usize,
    #[config(default = 100)]
    pub filters: usize,
    #[config(default = 3)]
    pub kernel_width: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl Seq2ClfModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2ClfModel<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.emb_size).init(device);
        let encoder = Conv1dConfig::new(self.emb_size, self.filters, self.kernel_width)
            .with_padding(PaddingConfig1d::Same)
            .init(device);
        let heads = self
            .label_sizes
            .iter()
            .map(|&classes| LinearConfig::new(self.filters, classes).init(device))
            .collect();
        let dropout = DropoutConfig::new(self.dropout).init();

        Seq2ClfModel {
            embedding,
            encoder,
            heads,
            dropout,
        }
    }
}

#[derive(Module, Debug)]
pub struct Seq2ClfModel<B: Backend> {
    pub embedding: Embedding<B>,
    pub encoder: Conv1d<B>,
    pub heads: Vec<Linear<B>>,
    pub dropout: Dropout,
}

impl<B: Backend> Seq2ClfModel<B> {
    /// source_ids, source_mask: [batch, seq_len]
    /// returns one [batch, classes] logit tensor per label field.
    pub fn forward(
        &self,
        source_ids: Tensor<B, 2, Int>,
        source_mask: Tensor<B, 2, Int>,
    ) -> Vec<Tensor<B, 2>> {
        let [batch_size, seq_len] = source_ids.dims();

        let embedded = self.dropout.forward(self.embedding.forward(source_ids));
        // Conv1d wants [batch, channels, length]
        let features = relu(self.encoder.forward(embedded.swap_dims(1, 2)));
        let [_, filters, _] = features.dims();

        let pad_positions = source_mask
            .equal_elem(0)
            .unsqueeze_dim::<3>(1)
            .expand([batch_size, filters, seq_len]);
        let pooled: Tensor<B, 2> = features
            .mask_fill(pad_positions, f32::NEG_INFINITY)
            .max_dim(2)
            .squeeze(2);

        self.heads
            .iter()
            .map(|head| head.forward(pooled.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;

    #[test]
    fn forward_yields_one_logit_tensor_per_field() {
        let device = NdArrayDevice::Cpu;
        let config = Seq2ClfModelConfig::new(10, vec![3, 2])
            .with_emb_size(8)
            .with_filters(6)
            .with_kernel_width(3);
        let model = config.init::<NdArray>(&device);

        let source_ids =
            Tensor::<NdArray, 1, Int>::from_ints([4, 5, 6, 0, 7, 8, 0, 0], &device)
                .reshape([2, 4]);
        let source_mask =
            Tensor::<NdArray, 1, Int>::from_ints([1, 1, 1, 0, 1, 1, 0, 0], &device)
                .reshape([2, 4]);

        let logits = model.forward(source_ids, source_mask);
        assert_eq!(logits.len(), 2);
        assert_eq!(logits[0].dims(), [2, 3]);
        assert_eq!(logits[1].dims(), [2, 2]);
    }

    #[test]
    fn pooled_features_ignore_padding() {
        // The same sequence with and without extra padding must
        // produce identical logits: padded positions are masked
        // out of the max-pool.
        let device = NdArrayDevice::Cpu;
        let config = Seq2ClfModelConfig::new(10, vec![2])
            .with_emb_size(4)
            .with_filters(4)
            .with_kernel_width(1)
            .with_dropout(0.0);
        let model = config.init::<NdArray>(&device);

        let short_ids = Tensor::<NdArray, 1, Int>::from_ints([4, 5], &device).reshape([1, 2]);
        let short_mask = Tensor::<NdArray, 1, Int>::from_ints([1, 1], &device).reshape([1, 2]);
        let padded_ids =
            Tensor::<NdArray, 1, Int>::from_ints([4, 5, 0, 0], &device).reshape([1, 4]);
        let padded_mask =
            Tensor::<NdArray, 1, Int>::from_ints([1, 1, 0, 0], &device).reshape([1, 4]);

        let short = model.forward(short_ids, short_mask).remove(0);
        let padded = model.forward(padded_ids, padded_mask).remove(0);

        let short: Vec<f32> = short.into_data().iter::<f32>().collect();
        let padded: Vec<f32> = padded.into_data().iter::<f32>().collect();
        for (a, b) in short.iter().zip(&padded) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
