// ============================================================
// Layer 4 — Batchers
// ============================================================
// Implements Burn's Batcher trait to stack individual samples
// into device-ready tensor batches. Unlike a pre-padded corpus,
// samples here have ragged lengths, so padding is dynamic: each
// batch is padded to its own longest sequence.
//
// Flattening pattern: build one long Vec<i32> in row-major
// order, create a 1D Int tensor, then reshape to [batch, seq].

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::labels::Seq2ClfItem;
use crate::data::parallel::Seq2SeqItem;
use crate::data::vocab::{PAD, START, STOP};

// ─── seq2seq ──────────────────────────────────────────────────────────────────

/// A batch for the seq2seq trainer.
///
/// Decoder sequences are the target shifted by one step:
///   decoder_inputs  = <start> t1 t2 ... tn
///   decoder_targets = t1 t2 ... tn <stop>
/// Both are padded with <pad>, which the loss ignores.
#[derive(Debug, Clone)]
pub struct Seq2SeqBatch<B: Backend> {
    /// [batch_size, src_len]
    pub source_ids: Tensor<B, 2, Int>,
    /// [batch_size, tgt_len + 1]
    pub decoder_inputs: Tensor<B, 2, Int>,
    /// [batch_size, tgt_len + 1]
    pub decoder_targets: Tensor<B, 2, Int>,
}

#[derive(Clone, Debug)]
pub struct Seq2SeqBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> Seq2SeqBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<Seq2SeqItem, Seq2SeqBatch<B>> for Seq2SeqBatcher<B> {
    fn batch(&self, items: Vec<Seq2SeqItem>) -> Seq2SeqBatch<B> {
        let batch_size = items.len();
        let src_len = items.iter().map(|i| i.source_ids.len()).max().unwrap_or(1);
        // +1 for the <start>/<stop> shift.
        let tgt_len = items.iter().map(|i| i.target_ids.len()).max().unwrap_or(0) + 1;

        let mut source_flat = Vec::with_capacity(batch_size * src_len);
        let mut input_flat = Vec::with_capacity(batch_size * tgt_len);
        let mut target_flat = Vec::with_capacity(batch_size * tgt_len);

        for item in &items {
            source_flat.extend(pad_row(&item.source_ids, src_len));

            let mut inputs = Vec::with_capacity(item.target_ids.len() + 1);
            inputs.push(START);
            inputs.extend_from_slice(&item.target_ids);
            input_flat.extend(pad_row(&inputs, tgt_len));

            let mut targets = Vec::with_capacity(item.target_ids.len() + 1);
            targets.extend_from_slice(&item.target_ids);
            targets.push(STOP);
            target_flat.extend(pad_row(&targets, tgt_len));
        }

        Seq2SeqBatch {
            source_ids: Tensor::<B, 1, Int>::from_ints(source_flat.as_slice(), &self.device)
                .reshape([batch_size, src_len]),
            decoder_inputs: Tensor::<B, 1, Int>::from_ints(input_flat.as_slice(), &self.device)
                .reshape([batch_size, tgt_len]),
            decoder_targets: Tensor::<B, 1, Int>::from_ints(target_flat.as_slice(), &self.device)
                .reshape([batch_size, tgt_len]),
        }
    }
}

// ─── seq2clf ──────────────────────────────────────────────────────────────────

/// A batch for the seq2clf trainer. `targets` holds one Int tensor
/// of shape [batch_size] per label field, in LabelVocab order.
#[derive(Debug, Clone)]
pub struct Seq2ClfBatch<B: Backend> {
    /// [batch_size, src_len]
    pub source_ids: Tensor<B, 2, Int>,
    /// [batch_size, src_len] — 1 for real tokens, 0 for padding
    pub source_mask: Tensor<B, 2, Int>,
    /// [batch_size]
    pub source_lengths: Tensor<B, 1, Int>,
    pub targets: Vec<Tensor<B, 1, Int>>,
}

#[derive(Clone, Debug)]
pub struct Seq2ClfBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> Seq2ClfBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<Seq2ClfItem, Seq2ClfBatch<B>> for Seq2ClfBatcher<B> {
    fn batch(&self, items: Vec<Seq2ClfItem>) -> Seq2ClfBatch<B> {
        let batch_size = items.len();
        let src_len = items.iter().map(|i| i.source_ids.len()).max().unwrap_or(1);
        let num_fields = items.first().map(|i| i.labels.len()).unwrap_or(0);

        let mut source_flat = Vec::with_capacity(batch_size * src_len);
        let mut mask_flat = Vec::with_capacity(batch_size * src_len);
        let mut lengths = Vec::with_capacity(batch_size);
        let mut field_labels: Vec<Vec<i32>> = vec![Vec::with_capacity(batch_size); num_fields];

        for item in &items {
            source_flat.extend(pad_row(&item.source_ids, src_len));
            mask_flat.extend((0..src_len).map(|i| i32::from(i < item.source_ids.len())));
            lengths.push(item.source_ids.len() as i32);
            for (f, &label) in item.labels.iter().enumerate() {
                field_labels[f].push(label as i32);
            }
        }

        Seq2ClfBatch {
            source_ids: Tensor::<B, 1, Int>::from_ints(source_flat.as_slice(), &self.device)
                .reshape([batch_size, src_len]),
            source_mask: Tensor::<B, 1, Int>::from_ints(mask_flat.as_slice(), &self.device)
                .reshape([batch_size, src_len]),
            source_lengths: Tensor::<B, 1, Int>::from_ints(lengths.as_slice(), &self.device),
            targets: field_labels
                .into_iter()
                .map(|labels| Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device))
                .collect(),
        }
    }
}

fn pad_row(ids: &[usize], width: usize) -> Vec<i32> {
    let mut row: Vec<i32> = ids.iter().map(|&x| x as i32).collect();
    row.resize(width, PAD as i32);
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;

    fn seq2seq_items() -> Vec<Seq2SeqItem> {
        vec![
            Seq2SeqItem {
                source_ids: vec![4, 5, 6],
                target_ids: vec![4, 5, 6],
            },
            Seq2SeqItem {
                source_ids: vec![7],
                target_ids: vec![7],
            },
        ]
    }

    #[test]
    fn seq2seq_batch_shapes_and_shift() {
        let batcher = Seq2SeqBatcher::<NdArray>::new(NdArrayDevice::Cpu);
        let batch = batcher.batch(seq2seq_items());

        assert_eq!(batch.source_ids.dims(), [2, 3]);
        assert_eq!(batch.decoder_inputs.dims(), [2, 4]);
        assert_eq!(batch.decoder_targets.dims(), [2, 4]);

        let inputs = batch.decoder_inputs.into_data();
        let inputs: Vec<i64> = inputs.iter::<i64>().collect();
        assert_eq!(
            inputs,
            vec![
                START as i64, 4, 5, 6, // row 0
                START as i64, 7, PAD as i64, PAD as i64, // row 1
            ]
        );

        let targets = batch.decoder_targets.into_data();
        let targets: Vec<i64> = targets.iter::<i64>().collect();
        assert_eq!(
            targets,
            vec![
                4, 5, 6, STOP as i64, // row 0
                7, STOP as i64, PAD as i64, PAD as i64, // row 1
            ]
        );
    }

    #[test]
    fn seq2clf_batch_pads_and_masks() {
        let items = vec![
            Seq2ClfItem {
                source_ids: vec![4, 5],
                labels: vec![0, 1],
            },
            Seq2ClfItem {
                source_ids: vec![6, 7, 8],
                labels: vec![1, 0],
            },
        ];
        let batcher = Seq2ClfBatcher::<NdArray>::new(NdArrayDevice::Cpu);
        let batch = batcher.batch(items);

        assert_eq!(batch.source_ids.dims(), [2, 3]);
        assert_eq!(batch.targets.len(), 2);

        let mask = batch.source_mask.into_data();
        let mask: Vec<i64> = mask.iter::<i64>().collect();
        assert_eq!(mask, vec![1, 1, 0, 1, 1, 1]);

        let lengths = batch.source_lengths.into_data();
        let lengths: Vec<i64> = lengths.iter::<i64>().collect();
        assert_eq!(lengths, vec![2, 3]);

        // targets are grouped per field, not per sample
        let field0 = batch.targets[0].clone().into_data();
        let field0: Vec<i64> = field0.iter::<i64>().collect();
        assert_eq!(field0, vec![0, 1]);
        let field1 = batch.targets[1].clone().into_data();
        let field1: Vec<i64> = field1.iter::<i64>().collect();
        assert_eq!(field1, vec![1, 0]);
    }
}
