//! Host-side token sequences.
//!
//! A `SequenceBatch` is a row-major `[len, seq_len]` matrix of token ids.
//! Samples live on the host between training steps so they can be sliced,
//! shuffled and mixed freely, and are only turned into backend tensors when
//! a model consumes them.

use std::ops::Range;

use burn::prelude::*;

use crate::error::{Result, SeqGanError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceBatch {
    tokens: Vec<u32>,
    seq_len: usize,
}

impl SequenceBatch {
    /// Wrap a flat token buffer of `n * seq_len` tokens.
    pub fn new(tokens: Vec<u32>, seq_len: usize) -> Result<Self> {
        if seq_len == 0 {
            return Err(SeqGanError::ShapeMismatch("seq_len must be > 0".into()));
        }
        if tokens.len() % seq_len != 0 {
            return Err(SeqGanError::ShapeMismatch(format!(
                "{} tokens do not divide into rows of {}",
                tokens.len(),
                seq_len
            )));
        }
        Ok(Self { tokens, seq_len })
    }

    /// Caller guarantees `tokens.len()` is a multiple of a non-zero `seq_len`.
    pub(crate) fn from_raw(tokens: Vec<u32>, seq_len: usize) -> Self {
        debug_assert!(seq_len > 0 && tokens.len() % seq_len == 0);
        Self { tokens, seq_len }
    }

    /// An empty batch whose rows would have `seq_len` tokens.
    pub fn empty(seq_len: usize) -> Result<Self> {
        Self::new(Vec::new(), seq_len)
    }

    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self> {
        let seq_len = rows
            .first()
            .map(|r| r.len())
            .ok_or(SeqGanError::EmptyBatch("from_rows needs at least one row"))?;
        let mut tokens = Vec::with_capacity(rows.len() * seq_len);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != seq_len {
                return Err(SeqGanError::ShapeMismatch(format!(
                    "row {} has {} tokens, expected {}",
                    i,
                    row.len(),
                    seq_len
                )));
            }
            tokens.extend_from_slice(row);
        }
        Self::new(tokens, seq_len)
    }

    /// Number of sequences.
    pub fn len(&self) -> usize {
        self.tokens.len() / self.seq_len
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn tokens(&self) -> &[u32] {
        &self.tokens
    }

    pub fn row(&self, i: usize) -> &[u32] {
        &self.tokens[i * self.seq_len..(i + 1) * self.seq_len]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.tokens.chunks_exact(self.seq_len)
    }

    /// Rows `range`, with the end clamped to `len()`.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Self {
            tokens: self.tokens[start * self.seq_len..end * self.seq_len].to_vec(),
            seq_len: self.seq_len,
        }
    }

    /// Stack batches that share a sequence length.
    pub fn concat(parts: &[SequenceBatch]) -> Result<Self> {
        let seq_len = parts
            .first()
            .map(|p| p.seq_len)
            .ok_or(SeqGanError::EmptyBatch("concat needs at least one part"))?;
        let total = parts.iter().map(|p| p.tokens.len()).sum();
        let mut tokens = Vec::with_capacity(total);
        for part in parts {
            if part.seq_len != seq_len {
                return Err(SeqGanError::ShapeMismatch(format!(
                    "cannot concat seq_len {} with {}",
                    part.seq_len, seq_len
                )));
            }
            tokens.extend_from_slice(&part.tokens);
        }
        Ok(Self { tokens, seq_len })
    }

    /// Keep the first `n` rows.
    pub fn truncate(&mut self, n: usize) {
        self.tokens.truncate(n * self.seq_len);
    }

    /// Gather rows in the order given by `indices`.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut tokens = Vec::with_capacity(indices.len() * self.seq_len);
        for &i in indices {
            tokens.extend_from_slice(self.row(i));
        }
        Self {
            tokens,
            seq_len: self.seq_len,
        }
    }

    /// Integer tensor of shape `[len, seq_len]`.
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2, Int> {
        let data: Vec<i32> = self.tokens.iter().map(|&t| t as i32).collect();
        Tensor::from_data(TensorData::new(data, [self.len(), self.seq_len]), device)
    }
}

/// Real/generated sequences with one `f32` label per row (1 = real).
#[derive(Debug, Clone)]
pub struct LabeledSequences {
    pub inputs: SequenceBatch,
    pub labels: Vec<f32>,
}

impl LabeledSequences {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l > 0.5).count()
    }

    /// Rows `range` with their labels, end clamped.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Self {
            inputs: self.inputs.slice(start..end),
            labels: self.labels[start..end].to_vec(),
        }
    }

    pub fn labels_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 1> {
        Tensor::from_data(TensorData::new(self.labels.clone(), [self.labels.len()]), device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn batch() -> SequenceBatch {
        SequenceBatch::from_rows(&[vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]).unwrap()
    }

    #[test]
    fn rejects_ragged_buffer() {
        assert!(SequenceBatch::new(vec![1, 2, 3, 4], 3).is_err());
        assert!(SequenceBatch::new(vec![], 0).is_err());
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = SequenceBatch::from_rows(&[vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, SeqGanError::ShapeMismatch(_)));
    }

    #[test]
    fn slice_clamps_past_the_end() {
        let b = batch();
        assert_eq!(b.slice(2..10).len(), 1);
        assert_eq!(b.slice(2..10).row(0), &[7, 8, 9]);
        assert!(b.slice(5..8).is_empty());
    }

    #[test]
    fn concat_and_truncate() {
        let b = batch();
        let mut joined = SequenceBatch::concat(&[b.clone(), b.slice(0..1)]).unwrap();
        assert_eq!(joined.len(), 4);
        assert_eq!(joined.row(3), &[1, 2, 3]);
        joined.truncate(2);
        assert_eq!(joined.len(), 2);
    }

    #[test]
    fn concat_rejects_mixed_lengths() {
        let other = SequenceBatch::from_rows(&[vec![1, 2]]).unwrap();
        assert!(SequenceBatch::concat(&[batch(), other]).is_err());
    }

    #[test]
    fn select_reorders_rows() {
        let picked = batch().select(&[2, 0]);
        assert_eq!(picked.rows().collect::<Vec<_>>(), vec![&[7, 8, 9][..], &[1, 2, 3][..]]);
    }

    #[test]
    fn tensor_shape() {
        let device = Default::default();
        let t = batch().to_tensor::<NdArray>(&device);
        assert_eq!(t.dims(), [3, 3]);
    }

    #[test]
    fn labeled_slice_keeps_labels_aligned() {
        let labeled = LabeledSequences {
            inputs: batch(),
            labels: vec![1.0, 0.0, 1.0],
        };
        let tail = labeled.slice(1..3);
        assert_eq!(tail.labels, vec![0.0, 1.0]);
        assert_eq!(tail.inputs.row(0), &[4, 5, 6]);
        assert_eq!(labeled.positives(), 2);
    }
}
