//! Batch construction for the trainers.
//!
//! - generator batches: (input, target) with the input shifted right
//!   behind the start letter (teacher forcing)
//! - discriminator datasets: real + generated rows, labelled and shuffled
//! - batch-wise sampling and the oracle NLL used to monitor the generator

use burn::prelude::*;
use burn::tensor::ElementConversion;
use rand::seq::SliceRandom;
use rand::Rng;

use super::sequences::{LabeledSequences, SequenceBatch};
use crate::error::{Result, SeqGanError};
use crate::model::{Generator, Oracle};

/// Anything that can draw token sequences: the generator and the oracle.
pub trait SequenceSampler<B: Backend> {
    fn sample_sequences<R: Rng>(
        &self,
        num_samples: usize,
        start_letter: u32,
        max_seq_len: usize,
        rng: &mut R,
        device: &B::Device,
    ) -> Result<SequenceBatch>;
}

impl<B: Backend> SequenceSampler<B> for Generator<B> {
    fn sample_sequences<R: Rng>(
        &self,
        num_samples: usize,
        start_letter: u32,
        max_seq_len: usize,
        rng: &mut R,
        device: &B::Device,
    ) -> Result<SequenceBatch> {
        self.sample(num_samples, start_letter, max_seq_len, rng, device)
    }
}

impl<B: Backend> SequenceSampler<B> for Oracle<B> {
    fn sample_sequences<R: Rng>(
        &self,
        num_samples: usize,
        start_letter: u32,
        max_seq_len: usize,
        rng: &mut R,
        device: &B::Device,
    ) -> Result<SequenceBatch> {
        self.sample(num_samples, start_letter, max_seq_len, rng, device)
    }
}

/// Read a single-element tensor back to the host.
pub(crate) fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> f32 {
    tensor.into_scalar().elem::<f32>()
}

/// Teacher-forcing inputs: `[start, t0, t1, ..., t_{n-2}]` for every row.
pub fn shift_right(samples: &SequenceBatch, start_letter: u32) -> SequenceBatch {
    let seq_len = samples.seq_len();
    let mut tokens = Vec::with_capacity(samples.tokens().len());
    for row in samples.rows() {
        tokens.push(start_letter);
        tokens.extend_from_slice(&row[..seq_len - 1]);
    }
    SequenceBatch::from_raw(tokens, seq_len)
}

/// Build `(input, target)` tensors for one generator minibatch.
pub fn prepare_generator_batch<B: Backend>(
    samples: &SequenceBatch,
    start_letter: u32,
    device: &B::Device,
) -> (Tensor<B, 2, Int>, Tensor<B, 2, Int>) {
    let input = shift_right(samples, start_letter).to_tensor::<B>(device);
    let target = samples.to_tensor::<B>(device);
    (input, target)
}

/// Label `pos` rows 1 and `neg` rows 0, then shuffle rows and labels with
/// one shared permutation.
pub fn prepare_discriminator_data<R: Rng>(
    pos: &SequenceBatch,
    neg: &SequenceBatch,
    rng: &mut R,
) -> Result<LabeledSequences> {
    let inputs = SequenceBatch::concat(&[pos.clone(), neg.clone()])?;
    let mut labels = vec![1.0f32; pos.len()];
    labels.resize(pos.len() + neg.len(), 0.0);

    let mut perm: Vec<usize> = (0..inputs.len()).collect();
    perm.shuffle(rng);

    Ok(LabeledSequences {
        inputs: inputs.select(&perm),
        labels: perm.iter().map(|&i| labels[i]).collect(),
    })
}

/// Draw exactly `num_samples` sequences in chunks of `batch_size`.
pub fn batchwise_sample<B: Backend, S: SequenceSampler<B>, R: Rng>(
    sampler: &S,
    num_samples: usize,
    batch_size: usize,
    start_letter: u32,
    max_seq_len: usize,
    rng: &mut R,
    device: &B::Device,
) -> Result<SequenceBatch> {
    if batch_size == 0 {
        return Err(SeqGanError::InvalidConfig("batch_size must be > 0".into()));
    }
    if num_samples == 0 {
        return SequenceBatch::empty(max_seq_len);
    }

    let chunks = num_samples.div_ceil(batch_size);
    let parts = (0..chunks)
        .map(|_| sampler.sample_sequences(batch_size, start_letter, max_seq_len, rng, device))
        .collect::<Result<Vec<_>>>()?;
    let mut samples = SequenceBatch::concat(&parts)?;
    samples.truncate(num_samples);
    Ok(samples)
}

/// Mean per-token NLL that the oracle assigns to `num_samples` generator
/// samples.
///
/// Each minibatch contributes `oracle_nll / max_seq_len`; the sum is divided
/// by `num_samples / batch_size` (real division, so a partial last batch
/// counts fractionally).
pub fn batchwise_oracle_nll<B: Backend, R: Rng>(
    generator: &Generator<B>,
    oracle: &Oracle<B>,
    num_samples: usize,
    batch_size: usize,
    max_seq_len: usize,
    start_letter: u32,
    rng: &mut R,
    device: &B::Device,
) -> Result<f32> {
    if num_samples == 0 {
        return Err(SeqGanError::EmptyBatch("oracle NLL over zero samples"));
    }
    let samples = batchwise_sample(
        generator,
        num_samples,
        batch_size,
        start_letter,
        max_seq_len,
        rng,
        device,
    )?;

    let mut total = 0.0f32;
    for i in (0..num_samples).step_by(batch_size) {
        let batch = samples.slice(i..i + batch_size);
        let (input, target) = prepare_generator_batch::<B>(&batch, start_letter, device);
        total += scalar(oracle.batch_nll_loss(input, target)) / max_seq_len as f32;
    }

    Ok(total / (num_samples as f32 / batch_size as f32))
}
