//! Policy-gradient updates of the generator against the discriminator.
//!
//! Each full sequence gets one reward, the discriminator's probability that
//! it is real; every token of the sequence is weighted by that reward.

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::Tensor;
use tracing::{debug, info};

use super::progress::ProgressSink;
use super::report::PgReport;
use super::TrainSession;
use crate::config::TrainingParams;
use crate::data::batching::{batchwise_oracle_nll, prepare_generator_batch, scalar};
use crate::error::{ensure_finite, Result};
use crate::model::{Discriminator, Generator, Oracle};

/// Run `num_batches` policy-gradient steps.
///
/// Rewards come from the discriminator in inference mode and enter the loss
/// as constants: the discriminator receives no gradient.
pub fn train_generator_pg<B, O, P>(
    generator: Generator<B>,
    optimizer: &mut O,
    oracle: &Oracle<B::InnerBackend>,
    discriminator: &Discriminator<B>,
    num_batches: usize,
    params: &TrainingParams,
    session: &mut TrainSession<B, P>,
) -> Result<(Generator<B>, PgReport)>
where
    B: AutodiffBackend,
    O: Optimizer<Generator<B>, B>,
    P: ProgressSink,
{
    params.validate()?;
    let sample_size = params.batch_size * params.pg_sample_multiplier;
    let device = session.device.clone();
    let critic = discriminator.valid();
    let mut generator = generator;
    let mut total_loss = 0.0f32;
    let mut total_reward = 0.0f32;

    for batch in 0..num_batches {
        let samples = generator.valid().sample(
            sample_size,
            params.start_letter,
            params.max_seq_len,
            &mut session.rng,
            &device,
        )?;
        let (input, target) = prepare_generator_batch::<B>(&samples, params.start_letter, &device);

        let rewards = critic.batch_classify(samples.to_tensor::<B::InnerBackend>(&device));
        let mean_reward = scalar(rewards.clone().mean());
        let rewards = Tensor::<B, 1>::from_inner(rewards);

        let loss = generator.batch_pg_loss(input, target, rewards);
        let loss_val = ensure_finite("policy gradient", scalar(loss.clone()))?;
        total_loss += loss_val;
        total_reward += mean_reward;
        debug!(batch, loss = loss_val, reward = mean_reward, "pg step");

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &generator);
        generator = optimizer.step(params.generator_lr, generator, grads);
    }

    let oracle_nll = batchwise_oracle_nll(
        &generator.valid(),
        oracle,
        params.pos_neg_samples,
        params.batch_size,
        params.max_seq_len,
        params.start_letter,
        &mut session.rng,
        &device,
    )?;

    let denom = num_batches.max(1) as f32;
    let report = PgReport {
        batches: num_batches,
        average_pg_loss: total_loss / denom,
        average_reward: total_reward / denom,
        oracle_nll,
    };
    session.progress.finish(&report.summary());
    info!(
        batches = num_batches,
        average_pg_loss = report.average_pg_loss,
        average_reward = report.average_reward,
        oracle_nll,
        "policy gradient"
    );
    Ok((generator, report))
}
