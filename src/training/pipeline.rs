//! The full SeqGAN schedule: oracle data, generator MLE pretraining,
//! discriminator pretraining, then alternating adversarial epochs.
//!
//! With a checkpoint store the run resumes: a saved oracle is reused so the
//! real data stays the same, and pretraining stages whose checkpoints exist
//! are skipped.

use burn::config::Config;
use burn::module::AutodiffModule;
use burn::tensor::backend::{AutodiffBackend, Backend};
use tracing::info;

use super::discriminator::train_discriminator;
use super::mle::train_generator_mle;
use super::optim::{discriminator_optimizer, generator_optimizer};
use super::policy_gradient::train_generator_pg;
use super::progress::ProgressSink;
use super::report::{AdversarialEpochReport, TrainingHistory};
use super::TrainSession;
use crate::checkpoint::{CheckpointStore, CheckpointTag, TrainingStage};
use crate::config::SeqGanConfig;
use crate::data::batching::{batchwise_oracle_nll, batchwise_sample};
use crate::error::{Result, SeqGanError};
use crate::model::{Discriminator, Generator, Oracle};

/// Models and metrics at the end of a run.
pub struct PipelineOutcome<B: AutodiffBackend> {
    pub oracle: Oracle<B::InnerBackend>,
    pub generator: Generator<B>,
    pub discriminator: Discriminator<B>,
    pub history: TrainingHistory,
}

pub fn run_pipeline<B, P>(
    config: &SeqGanConfig,
    checkpoints: Option<&CheckpointStore>,
    session: &mut TrainSession<B, P>,
) -> Result<PipelineOutcome<B>>
where
    B: AutodiffBackend,
    P: ProgressSink,
{
    config.validate()?;
    let params = config.training_params();
    let device = session.device.clone();
    let stage = checkpoints
        .map(CheckpointStore::detect_stage)
        .unwrap_or(TrainingStage::MlePretraining);
    info!(%stage, "starting run");
    if let Some(store) = checkpoints {
        let config_path = store.config_path();
        if config_path.exists() {
            let saved = SeqGanConfig::from_file(&config_path)?;
            config.ensure_same_shapes(&saved)?;
        }
        config.save(config_path)?;
    }

    let oracle = load_or_init_oracle::<B::InnerBackend>(config, checkpoints, &device)?;
    let real_data = batchwise_sample(
        &oracle,
        params.pos_neg_samples,
        params.batch_size,
        params.start_letter,
        params.max_seq_len,
        &mut session.rng,
        &device,
    )?;
    info!(samples = real_data.len(), "oracle samples drawn");

    let mut history = TrainingHistory::default();
    let mut gen_optimizer = generator_optimizer::<B>();
    let mut dis_optimizer = discriminator_optimizer::<B>();

    // generator MLE pretraining
    let generator = config.generator_config().init::<B>(&device);
    let generator = match checkpoints.filter(|_| stage >= TrainingStage::DiscriminatorPretraining) {
        Some(store) => {
            info!("resuming from pretrained generator");
            require(store, generator, CheckpointTag::GeneratorPretrained, &device)?
        }
        None => {
            session.progress.message("Starting Generator MLE Training...");
            let (generator, reports) = train_generator_mle(
                generator,
                &mut gen_optimizer,
                &oracle,
                &real_data,
                config.mle_train_epochs,
                &params,
                session,
            )?;
            history.mle_pretraining = reports;
            if let Some(store) = checkpoints {
                store.save::<B, _>(&generator, CheckpointTag::GeneratorPretrained)?;
            }
            generator
        }
    };

    // discriminator pretraining
    let discriminator = config.discriminator_config().init::<B>(&device);
    let mut discriminator = match checkpoints.filter(|_| stage >= TrainingStage::Adversarial) {
        Some(store) => {
            info!("resuming from pretrained discriminator");
            require(store, discriminator, CheckpointTag::DiscriminatorPretrained, &device)?
        }
        None => {
            session.progress.message("Starting Discriminator Training...");
            let (discriminator, reports) = train_discriminator(
                discriminator,
                &mut dis_optimizer,
                &real_data,
                &generator,
                &oracle,
                config.dis_pretrain_d_steps,
                config.dis_pretrain_epochs,
                &params,
                session,
            )?;
            history.discriminator_pretraining = reports;
            if let Some(store) = checkpoints {
                store.save::<B, _>(&discriminator, CheckpointTag::DiscriminatorPretrained)?;
            }
            discriminator
        }
    };

    let initial_nll = batchwise_oracle_nll(
        &generator.valid(),
        &oracle,
        params.pos_neg_samples,
        params.batch_size,
        params.max_seq_len,
        params.start_letter,
        &mut session.rng,
        &device,
    )?;
    session
        .progress
        .message(&format!("Initial Oracle Sample Loss : {initial_nll:.4}"));
    info!(oracle_nll = initial_nll, "adversarial training starts");
    history.initial_oracle_nll = Some(initial_nll);

    session.progress.message("Starting Adversarial Training...");
    let mut generator = generator;
    for epoch in 1..=config.adv_train_epochs {
        session.progress.message("--------");
        session.progress.message(&format!("EPOCH {epoch}"));
        session.progress.message("--------");

        session.progress.begin("Adversarial Training Generator :");
        let (trained, pg_report) = train_generator_pg(
            generator,
            &mut gen_optimizer,
            &oracle,
            &discriminator,
            config.adv_pg_batches,
            &params,
            session,
        )?;
        generator = trained;

        session.progress.message("Adversarial Training Discriminator : ");
        let (trained, dis_reports) = train_discriminator(
            discriminator,
            &mut dis_optimizer,
            &real_data,
            &generator,
            &oracle,
            config.adv_d_steps,
            config.adv_dis_epochs,
            &params,
            session,
        )?;
        discriminator = trained;

        if let Some(store) = checkpoints {
            store.save::<B, _>(&generator, CheckpointTag::Generator)?;
            store.save::<B, _>(&discriminator, CheckpointTag::Discriminator)?;
        }
        info!(epoch, oracle_nll = pg_report.oracle_nll, "adversarial epoch");
        history.adversarial.push(AdversarialEpochReport {
            epoch,
            generator: pg_report,
            discriminator: dis_reports,
        });
    }

    if let Some(store) = checkpoints {
        history.save(&store.history_path())?;
    }

    Ok(PipelineOutcome {
        oracle,
        generator,
        discriminator,
        history,
    })
}

/// The oracle defines the real data, so a run directory keeps one for good.
fn load_or_init_oracle<B: Backend>(
    config: &SeqGanConfig,
    checkpoints: Option<&CheckpointStore>,
    device: &B::Device,
) -> Result<Oracle<B>> {
    let fresh = Oracle::init(&config.oracle_config(), device);
    let Some(store) = checkpoints else {
        return Ok(fresh);
    };
    if let Some(oracle) = store.load::<B, _>(fresh.clone(), CheckpointTag::Oracle, device)? {
        info!(path = %store.path(CheckpointTag::Oracle).display(), "loaded oracle");
        return Ok(oracle);
    }
    store.save::<B, _>(&fresh, CheckpointTag::Oracle)?;
    Ok(fresh)
}

fn require<B: Backend, M: burn::module::Module<B>>(
    store: &CheckpointStore,
    model: M,
    tag: CheckpointTag,
    device: &B::Device,
) -> Result<M> {
    store
        .load::<B, _>(model, tag, device)?
        .ok_or_else(|| SeqGanError::Checkpoint {
            path: store.path(tag),
            message: "missing".into(),
        })
}
