// ============================================================
// Layer 5 — seq2seq Model
// ============================================================
// LSTM encoder/decoder trained with teacher forcing:
//
//   source ids → Embedding → LSTM encoder ──(final state)──┐
//   decoder inputs → Embedding → LSTM decoder ←────────────┘
//                       │
//                       ▼
//            Linear → [batch, tgt_len, target_vocab]
//
// The decoder is initialized from the encoder's final state, so
// encoder and decoder share one hidden size.

use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear, LinearConfig, Lstm, LstmConfig},
    prelude::*,
};

#[derive(Config, Debug)]
pub struct Seq2SeqModelConfig {
    pub source_vocab_size: usize,
    pub target_vocab_size: usize,
    #[config(default = 128)]
    pub emb_size: usize,
    #[config(default = 256)]
    pub hidden_size: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl Seq2SeqModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2SeqModel<B> {
        Seq2SeqModel {
            source_embedding: EmbeddingConfig::new(self.source_vocab_size, self.emb_size)
                .init(device),
            target_embedding: EmbeddingConfig::new(self.target_vocab_size, self.emb_size)
                .init(device),
            encoder: LstmConfig::new(self.emb_size, self.hidden_size, true).init(device),
            decoder: LstmConfig::new(self.emb_size, self.hidden_size, true).init(device),
            output: LinearConfig::new(self.hidden_size, self.target_vocab_size).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct Seq2SeqModel<B: Backend> {
    pub source_embedding: Embedding<B>,
    pub target_embedding: Embedding<B>,
    pub encoder: Lstm<B>,
    pub decoder: Lstm<B>,
    pub output: Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> Seq2SeqModel<B> {
    /// source_ids: [batch, src_len], decoder_inputs: [batch, tgt_len]
    /// returns logits of shape [batch, tgt_len, target_vocab].
    pub fn forward(
        &self,
        source_ids: Tensor<B, 2, Int>,
        decoder_inputs: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let source = self
            .dropout
            .forward(self.source_embedding.forward(source_ids));
        let (_, encoder_state) = self.encoder.forward(source, None);

        let target = self
            .dropout
            .forward(self.target_embedding.forward(decoder_inputs));
        let (decoded, _) = self.decoder.forward(target, Some(encoder_state));

        self.output.forward(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;

    #[test]
    fn forward_shape_matches_decoder_length() {
        let device = NdArrayDevice::Cpu;
        let config = Seq2SeqModelConfig::new(12, 9)
            .with_emb_size(8)
            .with_hidden_size(16);
        let model = config.init::<NdArray>(&device);

        let source_ids =
            Tensor::<NdArray, 1, Int>::from_ints([4, 5, 6, 7, 8, 0], &device).reshape([2, 3]);
        let decoder_inputs =
            Tensor::<NdArray, 1, Int>::from_ints([2, 4, 5, 6, 2, 7, 0, 0], &device)
                .reshape([2, 4]);

        let logits = model.forward(source_ids, decoder_inputs);
        assert_eq!(logits.dims(), [2, 4, 9]);
    }
}
