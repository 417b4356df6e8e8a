//! Maximum-likelihood pretraining of the generator.
//!
//! Teacher forcing on real (oracle) sequences with the summed per-position
//! NLL. After each epoch the generator is sampled and the oracle scores the
//! samples, which is the quantity SeqGAN ultimately tries to minimise.

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use tracing::{debug, info};

use super::progress::{ProgressSink, ProgressTicker};
use super::report::MleEpochReport;
use super::TrainSession;
use crate::config::TrainingParams;
use crate::data::batching::{batchwise_oracle_nll, prepare_generator_batch, scalar};
use crate::data::sequences::SequenceBatch;
use crate::error::{ensure_finite, Result, SeqGanError};
use crate::model::{Generator, Oracle};

/// Train the generator for `epochs` passes over the first
/// `params.pos_neg_samples` rows of `real_data`.
///
/// Returns the updated generator and one report per epoch.
pub fn train_generator_mle<B, O, P>(
    generator: Generator<B>,
    optimizer: &mut O,
    oracle: &Oracle<B::InnerBackend>,
    real_data: &SequenceBatch,
    epochs: usize,
    params: &TrainingParams,
    session: &mut TrainSession<B, P>,
) -> Result<(Generator<B>, Vec<MleEpochReport>)>
where
    B: AutodiffBackend,
    O: Optimizer<Generator<B>, B>,
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

    let ticker = ProgressTicker::new(samples, batch_size);
    let device = session.device.clone();
    let mut generator = generator;
    let mut reports = Vec::with_capacity(epochs);

    for epoch in 1..=epochs {
        session.progress.begin(&MleEpochReport::label(epoch));
        let mut total_loss = 0.0f32;

        for (batch_index, i) in (0..samples).step_by(batch_size).enumerate() {
            let batch = real_data.slice(i..i + batch_size);
            let (input, target) = prepare_generator_batch::<B>(&batch, params.start_letter, &device);

            let loss = generator.batch_nll_loss(input, target);
            let loss_val = ensure_finite("mle", scalar(loss.clone()))?;
            total_loss += loss_val;
            debug!(epoch, batch = batch_index, loss = loss_val, "mle step");

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &generator);
            generator = optimizer.step(params.generator_lr, generator, grads);

            if ticker.ticks_at(batch_index) {
                session.progress.tick();
            }
        }

        // each batch loss is per sample; normalise per token
        let average_train_nll =
            total_loss / ticker.batches() as f32 / params.max_seq_len as f32;

        let oracle_nll = batchwise_oracle_nll(
            &generator.valid(),
            oracle,
            samples,
            batch_size,
            params.max_seq_len,
            params.start_letter,
            &mut session.rng,
            &device,
        )?;

        let report = MleEpochReport {
            epoch,
            average_train_nll,
            oracle_nll,
        };
        session.progress.finish(&report.summary());
        info!(epoch, average_train_nll, oracle_nll, "mle epoch");
        reports.push(report);
    }

    Ok((generator, reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeqGanConfig;
    use crate::data::batching::batchwise_sample;
    use crate::training::optim::generator_optimizer;
    use crate::training::progress::RecordedProgress;
    use burn::backend::{Autodiff, NdArray};

    type B = Autodiff<NdArray>;

    fn setup() -> (SeqGanConfig, TrainSession<B, RecordedProgress>) {
        let config = SeqGanConfig::quick()
            .with_pos_neg_samples(40)
            .with_batch_size(4);
        let session = TrainSession::<B, _>::new(Default::default(), 3, RecordedProgress::new());
        (config, session)
    }

    #[test]
    fn mle_epochs_report_finite_losses_and_ten_ticks() {
        let (config, mut session) = setup();
        let params = config.training_params();
        let device = session.device.clone();

        let oracle = Oracle::<NdArray>::init(&config.oracle_config(), &device);
        let real = batchwise_sample(
            &oracle,
            params.pos_neg_samples,
            params.batch_size,
            params.start_letter,
            params.max_seq_len,
            &mut session.rng,
            &device,
        )
        .unwrap();

        let generator = config.generator_config().init::<B>(&device);
        let mut optimizer = generator_optimizer::<B>();
        let (_generator, reports) =
            train_generator_mle(generator, &mut optimizer, &oracle, &real, 2, &params, &mut session)
                .unwrap();

        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert!(report.average_train_nll > 0.0 && report.average_train_nll.is_finite());
            assert!(report.oracle_nll > 0.0 && report.oracle_nll.is_finite());
        }
        // 40 samples / batch 4 = 10 batches -> one tick per batch
        assert_eq!(session.progress.tick_counts(), vec![10, 10]);
        assert!(session.progress.lines[0].starts_with("epoch 1 : .........."));
    }

    #[test]
    fn mle_rejects_short_real_data() {
        let (config, mut session) = setup();
        let params = config.training_params();
        let device = session.device.clone();

        let oracle = Oracle::<NdArray>::init(&config.oracle_config(), &device);
        let real = oracle
            .sample(5, 0, params.max_seq_len, &mut session.rng, &device)
            .unwrap();
        let generator = config.generator_config().init::<B>(&device);
        let mut optimizer = generator_optimizer::<B>();

        let err = train_generator_mle(generator, &mut optimizer, &oracle, &real, 1, &params, &mut session)
            .unwrap_err();
        assert!(matches!(
            err,
            SeqGanError::InsufficientSamples {
                required: 40,
                available: 5
            }
        ));
    }

    #[test]
    fn mle_lowers_training_nll_on_a_repeated_sequence() {
        let (config, mut session) = setup();
        let config = config.with_generator_lr(5e-2);
        let params = config.training_params();
        let device = session.device.clone();

        let oracle = Oracle::<NdArray>::init(&config.oracle_config(), &device);
        let row: Vec<u32> = (0..params.max_seq_len as u32).map(|t| (t * 3) % 16).collect();
        let real = SequenceBatch::from_rows(&vec![row; params.pos_neg_samples]).unwrap();

        let generator = config.generator_config().init::<B>(&device);
        let mut optimizer = generator_optimizer::<B>();
        let (_generator, reports) =
            train_generator_mle(generator, &mut optimizer, &oracle, &real, 3, &params, &mut session)
                .unwrap();

        assert!(
            reports[2].average_train_nll < reports[0].average_train_nll,
            "{:?}",
            reports
        );
    }

    #[test]
    fn average_train_nll_is_per_token_over_all_batches() {
        let (config, mut session) = setup();
        let config = config.with_pos_neg_samples(10);
        let mut params = config.training_params();
        // weights stay at their initial values for the whole epoch
        params.generator_lr = 0.0;
        let device = session.device.clone();

        let oracle = Oracle::<NdArray>::init(&config.oracle_config(), &device);
        let real = oracle
            .sample(10, 0, params.max_seq_len, &mut session.rng, &device)
            .unwrap();
        let generator = config.generator_config().init::<B>(&device);
        let frozen = generator.valid();
        let mut optimizer = generator_optimizer::<B>();

        let (_generator, reports) =
            train_generator_mle(generator, &mut optimizer, &oracle, &real, 1, &params, &mut session)
                .unwrap();

        // 10 rows in batches of 4: ceil(10 / 4) = 3 batches, the last one of 2
        let total: f32 = [0..4, 4..8, 8..10]
            .into_iter()
            .map(|rows| {
                let (input, target) =
                    prepare_generator_batch::<NdArray>(&real.slice(rows), params.start_letter, &device);
                scalar(frozen.batch_nll_loss(input, target))
            })
            .sum();
        let expected = total / 3.0 / params.max_seq_len as f32;
        let actual = reports[0].average_train_nll;
        assert!((actual - expected).abs() <= 1e-4 * expected, "{actual} vs {expected}");
    }
}
