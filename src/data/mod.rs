//! Token sequences and the batching helpers that feed the trainers.

pub mod batching;
pub mod sequences;

pub use batching::{
    batchwise_oracle_nll, batchwise_sample, prepare_discriminator_data, prepare_generator_batch,
    shift_right, SequenceSampler,
};
pub use sequences::{LabeledSequences, SequenceBatch};
