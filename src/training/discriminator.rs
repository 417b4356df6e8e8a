//! Discriminator training on real versus generated sequences.

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use tracing::{debug, info};

use super::progress::{ProgressSink, ProgressTicker};
use super::report::DiscriminatorEpochReport;
use super::TrainSession;
use crate::config::TrainingParams;
use crate::data::batching::{batchwise_sample, prepare_discriminator_data, scalar};
use crate::data::sequences::{LabeledSequences, SequenceBatch};
use crate::error::{ensure_finite, Result, SeqGanError};
use crate::model::discriminator::count_correct;
use crate::model::{Discriminator, Generator, Oracle};

/// Train the discriminator for `d_steps` rounds of `epochs` epochs.
///
/// Every d-step draws a fresh set of `pos_neg_samples` negatives from the
/// generator and pairs them with the first `pos_neg_samples` rows of
/// `real_data`. Validation accuracy is measured on a set built once, before
/// the first d-step.
#[allow(clippy::too_many_arguments)]
pub fn train_discriminator<B, O, P>(
    discriminator: Discriminator<B>,
    optimizer: &mut O,
    real_data: &SequenceBatch,
    generator: &Generator<B>,
    oracle: &Oracle<B::InnerBackend>,
    d_steps: usize,
    epochs: usize,
    params: &TrainingParams,
    session: &mut TrainSession<B, P>,
) -> Result<(Discriminator<B>, Vec<DiscriminatorEpochReport>)>
where
    B: AutodiffBackend,
    O: Optimizer<Discriminator<B>, B>,
    P: ProgressSink,
{
    params.validate()?;
    let samples = params.pos_neg_samples;
    let batch_size = params.batch_size;
    if real_data.len() < samples {
        return Err(SeqGanError::InsufficientSamples {
            required: samples,
            available: real_data.len(),
        });
    }

    let device = session.device.clone();
    let sampler = generator.valid();

    let validation = {
        let pos = oracle.sample(
            params.validation_samples,
            params.start_letter,
            params.max_seq_len,
            &mut session.rng,
            &device,
        )?;
        let neg = sampler.sample(
            params.validation_samples,
            params.start_letter,
            params.max_seq_len,
            &mut session.rng,
            &device,
        )?;
        prepare_discriminator_data(&pos, &neg, &mut session.rng)?
    };
    let positives = real_data.slice(0..samples);
    let ticker = ProgressTicker::new(2 * samples, batch_size);

    let mut discriminator = discriminator;
    let mut reports = Vec::with_capacity(d_steps * epochs);

    for d_step in 1..=d_steps {
        let negatives = batchwise_sample(
            &sampler,
            samples,
            batch_size,
            params.start_letter,
            params.max_seq_len,
            &mut session.rng,
            &device,
        )?;
        let data = prepare_discriminator_data(&positives, &negatives, &mut session.rng)?;

        for epoch in 1..=epochs {
            session
                .progress
                .begin(&DiscriminatorEpochReport::label(d_step, epoch));
            let mut total_loss = 0.0f32;
            let mut correct = 0usize;

            for (batch_index, i) in (0..data.len()).step_by(batch_size).enumerate() {
                let batch = data.slice(i..i + batch_size);
                let input = batch.inputs.to_tensor::<B>(&device);
                let target = batch.labels_tensor::<B>(&device);

                let (probs, loss) = discriminator.classify_with_loss(input, target);
                let loss_val = ensure_finite("discriminator", scalar(loss.clone()))?;
                total_loss += loss_val;

                let probs: Vec<f32> = probs.into_data().iter::<f32>().collect();
                correct += count_correct(&probs, &batch.labels);
                debug!(d_step, epoch, batch = batch_index, loss = loss_val, "discriminator step");

                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &discriminator);
                discriminator = optimizer.step(params.discriminator_lr, discriminator, grads);

                if ticker.ticks_at(batch_index) {
                    session.progress.tick();
                }
            }

            let average_loss = total_loss / ticker.batches().max(1) as f32;
            let train_accuracy = correct as f32 / data.len().max(1) as f32;
            let val_accuracy = accuracy(&discriminator.valid(), &validation, &device);

            let report = DiscriminatorEpochReport {
                d_step,
                epoch,
                average_loss,
                train_accuracy,
                val_accuracy,
            };
            session.progress.finish(&report.summary());
            info!(d_step, epoch, average_loss, train_accuracy, val_accuracy, "discriminator epoch");
            reports.push(report);
        }
    }

    Ok((discriminator, reports))
}

fn accuracy<B: Backend>(
    discriminator: &Discriminator<B>,
    data: &LabeledSequences,
    device: &B::Device,
) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let probs: Vec<f32> = discriminator
        .batch_classify(data.inputs.to_tensor::<B>(device))
        .into_data()
        .iter::<f32>()
        .collect();
    count_correct(&probs, &data.labels) as f32 / data.len() as f32
}
