//! Optimizers for the two trained networks.
//!
//! The generator uses Adam for both MLE pretraining and policy-gradient
//! updates (one optimizer instance carries its moments across both stages);
//! the discriminator uses AdaGrad. Learning rates are passed per step from
//! `TrainingParams`.

use burn::optim::{AdaGradConfig, AdamConfig, Optimizer};
use burn::tensor::backend::AutodiffBackend;

use crate::model::{Discriminator, Generator};

pub fn generator_optimizer<B: AutodiffBackend>() -> impl Optimizer<Generator<B>, B> {
    AdamConfig::new().init()
}

pub fn discriminator_optimizer<B: AutodiffBackend>() -> impl Optimizer<Discriminator<B>, B> {
    AdaGradConfig::new().init()
}
