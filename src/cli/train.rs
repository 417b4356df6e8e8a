use std::path::PathBuf;
use std::process;

use burn::backend::wgpu::{Wgpu, WgpuDevice};
use burn::backend::{Autodiff, NdArray};
use burn::tensor::backend::AutodiffBackend;
use clap::Args;
use seqgan::checkpoint::CheckpointStore;
use seqgan::config::SeqGanConfig;
use seqgan::training::{run_pipeline, ConsoleProgress, TrainSession};

#[derive(Args)]
pub struct TrainArgs {
    /// JSON config file (default: the reference SeqGAN hyperparameters)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Directory for checkpoints, config.json and history.json
    #[arg(long, value_name = "DIR")]
    pub checkpoints: Option<PathBuf>,
    /// Use the wgpu backend instead of ndarray
    #[arg(long)]
    pub gpu: bool,
    /// Override the configured RNG seed
    #[arg(long)]
    pub seed: Option<u64>,
    /// Tiny configuration for a smoke run
    #[arg(long, conflicts_with = "config")]
    pub quick: bool,
}

pub fn cmd_train(args: TrainArgs) {
    let mut config = super::load_config(args.config.as_deref(), args.quick);
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let store = args.checkpoints.as_deref().map(super::open_store);

    if args.gpu {
        train::<Autodiff<Wgpu>>(&config, store.as_ref(), WgpuDevice::default());
    } else {
        train::<Autodiff<NdArray>>(&config, store.as_ref(), Default::default());
    }
}

fn train<B: AutodiffBackend>(
    config: &SeqGanConfig,
    store: Option<&CheckpointStore>,
    device: B::Device,
) {
    if let Some(store) = store {
        let found = store.available();
        if !found.is_empty() {
            eprintln!(
                "Resuming in {} ({} checkpoint(s)), starting at {}",
                store.dir().display(),
                found.len(),
                store.detect_stage(),
            );
        }
    }
    eprintln!(
        "Training SeqGAN: vocab {}, sequence length {}, {} samples, batch {}, seed {}",
        config.vocab_size,
        config.max_seq_len,
        config.pos_neg_samples,
        config.batch_size,
        config.seed,
    );

    let start = std::time::Instant::now();
    let mut session = TrainSession::<B, _>::new(device, config.seed, ConsoleProgress);
    let outcome = match run_pipeline(config, store, &mut session) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    eprintln!();
    eprintln!("Done in {:.1}s", start.elapsed().as_secs_f64());
    if let Some(nll) = outcome.history.final_oracle_nll() {
        eprintln!("  final oracle NLL: {:.4}", nll);
    }
    if let Some(store) = store {
        eprintln!("  history: {}", store.history_path().display());
    }
}
