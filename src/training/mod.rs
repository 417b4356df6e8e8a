//! The SeqGAN training loops and the state they share.

pub mod discriminator;
pub mod mle;
pub mod optim;
pub mod pipeline;
pub mod policy_gradient;
pub mod progress;
pub mod report;

use burn::tensor::backend::Backend;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub use discriminator::train_discriminator;
pub use mle::train_generator_mle;
pub use optim::{discriminator_optimizer, generator_optimizer};
pub use pipeline::{run_pipeline, PipelineOutcome};
pub use policy_gradient::train_generator_pg;
pub use progress::{ConsoleProgress, ProgressSink, ProgressTicker, RecordedProgress};
pub use report::{
    AdversarialEpochReport, DiscriminatorEpochReport, MleEpochReport, PgReport, TrainingHistory,
};

/// Device, host RNG and progress output threaded through every trainer.
///
/// One RNG drives all token sampling and shuffling, so a run is
/// reproducible from its seed on a deterministic backend.
pub struct TrainSession<B: Backend, P: ProgressSink> {
    pub device: B::Device,
    pub rng: StdRng,
    pub progress: P,
}

impl<B: Backend, P: ProgressSink> TrainSession<B, P> {
    pub fn new(device: B::Device, seed: u64, progress: P) -> Self {
        Self {
            device,
            rng: StdRng::seed_from_u64(seed),
            progress,
        }
    }
}
