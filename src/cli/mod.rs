pub mod config;
pub mod sample;
pub mod train;

use std::path::Path;
use std::process;

use seqgan::checkpoint::CheckpointStore;
use seqgan::config::SeqGanConfig;

/// Resolve the run configuration from `--config` / `--quick`.
pub fn load_config(path: Option<&Path>, quick: bool) -> SeqGanConfig {
    match path {
        Some(path) => match SeqGanConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        },
        None if quick => SeqGanConfig::quick(),
        None => SeqGanConfig::new(),
    }
}

pub fn open_store(dir: &Path) -> CheckpointStore {
    match CheckpointStore::open(dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
