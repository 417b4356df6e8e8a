use std::path::PathBuf;
use std::process;

use burn::backend::wgpu::{Wgpu, WgpuDevice};
use burn::backend::NdArray;
use burn::tensor::backend::Backend;
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use seqgan::checkpoint::{CheckpointStore, CheckpointTag};
use seqgan::config::SeqGanConfig;
use seqgan::model::Generator;

#[derive(Args)]
pub struct SampleArgs {
    /// Checkpoint directory written by `seqgan train`
    #[arg(long, value_name = "DIR")]
    pub checkpoints: PathBuf,
    /// Number of sequences to print
    #[arg(short, default_value = "10")]
    pub n: usize,
    /// Use the wgpu backend instead of ndarray
    #[arg(long)]
    pub gpu: bool,
    /// RNG seed (default: the run's seed)
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn cmd_sample(args: SampleArgs) {
    let store = super::open_store(&args.checkpoints);
    let config_path = store.config_path();
    let config = super::load_config(Some(config_path.as_path()), false);
    let seed = args.seed.unwrap_or(config.seed);

    if args.gpu {
        sample::<Wgpu>(&config, &store, args.n, seed, WgpuDevice::default());
    } else {
        sample::<NdArray>(&config, &store, args.n, seed, Default::default());
    }
}

fn sample<B: Backend>(
    config: &SeqGanConfig,
    store: &CheckpointStore,
    n: usize,
    seed: u64,
    device: B::Device,
) {
    let generator = match latest_generator::<B>(config, store, &device) {
        Some(generator) => generator,
        None => {
            eprintln!(
                "error: no generator checkpoint in '{}'",
                store.dir().display()
            );
            process::exit(1);
        }
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let samples = match generator.sample(n, config.start_letter, config.max_seq_len, &mut rng, &device) {
        Ok(samples) => samples,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    for row in samples.rows() {
        let line: Vec<String> = row.iter().map(|t| t.to_string()).collect();
        println!("{}", line.join(" "));
    }
}

/// Adversarially trained generator if present, else the pretrained one.
fn latest_generator<B: Backend>(
    config: &SeqGanConfig,
    store: &CheckpointStore,
    device: &B::Device,
) -> Option<Generator<B>> {
    for tag in [CheckpointTag::Generator, CheckpointTag::GeneratorPretrained] {
        let model = config.generator_config().init::<B>(device);
        match store.load::<B, _>(model, tag, device) {
            Ok(Some(generator)) => {
                eprintln!("Sampling from {}", store.path(tag).display());
                return Some(generator);
            }
            Ok(None) => {}
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
    }
    None
}
