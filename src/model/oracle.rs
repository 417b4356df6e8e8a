//! The oracle: a frozen, randomly initialised generator that stands in for
//! the real data distribution and scores generator samples.

use burn::module::Module;
use burn::prelude::*;
use rand::Rng;

use super::generator::{Generator, GeneratorConfig};
use crate::data::sequences::SequenceBatch;
use crate::error::Result;

/// Default spread of oracle weights when the config leaves it unset.
const DEFAULT_ORACLE_STD: f64 = 1.0;

#[derive(Module, Debug)]
pub struct Oracle<B: Backend> {
    model: Generator<B>,
}

impl<B: Backend> Oracle<B> {
    /// Fresh oracle with every parameter drawn from N(0, std).
    pub fn init(config: &GeneratorConfig, device: &B::Device) -> Self {
        let std = config.init_std.unwrap_or(DEFAULT_ORACLE_STD);
        let config = config.clone().with_init_std(Some(std));
        Self {
            model: config.init(device),
        }
    }

    pub fn sample<R: Rng>(
        &self,
        num_samples: usize,
        start_letter: u32,
        max_seq_len: usize,
        rng: &mut R,
        device: &B::Device,
    ) -> Result<SequenceBatch> {
        self.model
            .sample(num_samples, start_letter, max_seq_len, rng, device)
    }

    /// Oracle NLL of `target`, summed over positions, averaged over the batch.
    pub fn batch_nll_loss(&self, input: Tensor<B, 2, Int>, target: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        self.model.batch_nll_loss(input, target)
    }
}
