//! Checkpoint management for SeqGAN runs.
//!
//! Uses burn's native record format (NamedMpk, full precision) for model
//! weights. Each model of a run is saved under a fixed tag inside one
//! directory: `oracle`, `generator_pretrained`, `discriminator_pretrained`,
//! `generator`, `discriminator`.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::backend::Backend;

use crate::error::{Result, SeqGanError};

const EXTENSION: &str = "mpk";

/// Name of the run history file written next to the checkpoints.
pub const HISTORY_FILE: &str = "history.json";
/// The run's `SeqGanConfig`, needed to rebuild models before loading them.
pub const CONFIG_FILE: &str = "config.json";

/// Checkpoint tag for naming saved files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointTag {
    Oracle,
    GeneratorPretrained,
    DiscriminatorPretrained,
    Generator,
    Discriminator,
}

impl CheckpointTag {
    pub const ALL: [CheckpointTag; 5] = [
        Self::Oracle,
        Self::GeneratorPretrained,
        Self::DiscriminatorPretrained,
        Self::Generator,
        Self::Discriminator,
    ];

    pub fn stem(&self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::GeneratorPretrained => "generator_pretrained",
            Self::DiscriminatorPretrained => "discriminator_pretrained",
            Self::Generator => "generator",
            Self::Discriminator => "discriminator",
        }
    }
}

impl std::fmt::Display for CheckpointTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.stem())
    }
}

/// Which stage a run should start from, given the checkpoints on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrainingStage {
    MlePretraining,
    DiscriminatorPretraining,
    Adversarial,
}

impl std::fmt::Display for TrainingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MlePretraining => write!(f, "generator MLE pretraining"),
            Self::DiscriminatorPretraining => write!(f, "discriminator pretraining"),
            Self::Adversarial => write!(f, "adversarial training"),
        }
    }
}

/// A directory of tagged checkpoints.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Open (and create if needed) a checkpoint directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| SeqGanError::Checkpoint {
            path: dir.clone(),
            message: format!("mkdir: {e}"),
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a tag's file, extension included.
    pub fn path(&self, tag: CheckpointTag) -> PathBuf {
        self.dir.join(tag.stem()).with_extension(EXTENSION)
    }

    pub fn exists(&self, tag: CheckpointTag) -> bool {
        self.path(tag).exists()
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Save a model under `tag`, replacing any previous file.
    pub fn save<B: Backend, M: Module<B> + Clone>(
        &self,
        model: &M,
        tag: CheckpointTag,
    ) -> Result<PathBuf> {
        // burn appends the extension itself
        let stem = self.dir.join(tag.stem());
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        model
            .clone()
            .save_file(stem, &recorder)
            .map_err(|e| SeqGanError::Checkpoint {
                path: self.path(tag),
                message: format!("save: {e}"),
            })?;
        Ok(self.path(tag))
    }

    /// Load weights saved under `tag` into `model`.
    ///
    /// Returns `None` when the checkpoint does not exist.
    pub fn load<B: Backend, M: Module<B>>(
        &self,
        model: M,
        tag: CheckpointTag,
        device: &B::Device,
    ) -> Result<Option<M>> {
        let full_path = self.path(tag);
        if !full_path.exists() {
            return Ok(None);
        }

        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let loaded = model
            .load_file(self.dir.join(tag.stem()), &recorder, device)
            .map_err(|e| SeqGanError::Checkpoint {
                path: full_path,
                message: format!("load: {e}"),
            })?;
        Ok(Some(loaded))
    }

    /// Checkpoints present on disk, in tag order.
    pub fn available(&self) -> Vec<(CheckpointTag, PathBuf)> {
        CheckpointTag::ALL
            .into_iter()
            .map(|tag| (tag, self.path(tag)))
            .filter(|(_, path)| path.exists())
            .collect()
    }

    /// Detect which training stage to run based on existing checkpoints.
    ///
    /// - nothing pretrained: MLE pretraining
    /// - pretrained generator: discriminator pretraining
    /// - both pretrained: adversarial training
    pub fn detect_stage(&self) -> TrainingStage {
        let has_generator = self.exists(CheckpointTag::GeneratorPretrained);
        let has_discriminator = self.exists(CheckpointTag::DiscriminatorPretrained);

        match (has_generator, has_discriminator) {
            (true, true) => TrainingStage::Adversarial,
            (true, false) => TrainingStage::DiscriminatorPretraining,
            _ => TrainingStage::MlePretraining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeneratorConfig;
    use burn::backend::NdArray;
    use burn::tensor::{Int, Tensor, TensorData};

    type B = NdArray;

    #[test]
    fn tag_stems() {
        assert_eq!(CheckpointTag::Oracle.stem(), "oracle");
        assert_eq!(CheckpointTag::GeneratorPretrained.stem(), "generator_pretrained");
        assert_eq!(
            CheckpointTag::DiscriminatorPretrained.to_string(),
            "discriminator_pretrained"
        );
    }

    #[test]
    fn missing_checkpoint_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::open(dir.path()).unwrap();
        let device = Default::default();
        let model = GeneratorConfig::new(8).init::<B>(&device);
        let loaded = store.load::<B, _>(model, CheckpointTag::Generator, &device).unwrap();
        assert!(loaded.is_none());
        assert!(store.available().is_empty());
    }

    #[test]
    fn save_then_load_restores_weights() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::open(dir.path().join("run")).unwrap();
        let device = Default::default();
        let config = GeneratorConfig::new(8).with_embedding_dim(4).with_hidden_dim(4);

        let saved = config.init::<B>(&device);
        let path = store.save::<B, _>(&saved, CheckpointTag::Oracle).unwrap();
        assert!(path.ends_with("oracle.mpk"));
        assert!(path.exists());

        let fresh = config.init::<B>(&device);
        let restored = store
            .load::<B, _>(fresh, CheckpointTag::Oracle, &device)
            .unwrap()
            .unwrap();

        let input = Tensor::<B, 2, Int>::from_data(TensorData::new(vec![0i32, 3, 5, 7], [2, 2]), &device);
        let a: Vec<f32> = saved.forward(input.clone()).into_data().iter::<f32>().collect();
        let b: Vec<f32> = restored.forward(input).into_data().iter::<f32>().collect();
        assert_eq!(a, b);
        assert_eq!(store.available(), vec![(CheckpointTag::Oracle, path)]);
    }

    #[test]
    fn stage_follows_pretrained_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::open(dir.path()).unwrap();
        assert_eq!(store.detect_stage(), TrainingStage::MlePretraining);

        std::fs::write(store.path(CheckpointTag::GeneratorPretrained), b"").unwrap();
        assert_eq!(store.detect_stage(), TrainingStage::DiscriminatorPretraining);

        std::fs::write(store.path(CheckpointTag::DiscriminatorPretrained), b"").unwrap();
        assert_eq!(store.detect_stage(), TrainingStage::Adversarial);
        assert!(TrainingStage::Adversarial > TrainingStage::MlePretraining);
    }

    #[test]
    fn discriminator_alone_does_not_skip_mle() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::open(dir.path()).unwrap();
        std::fs::write(store.path(CheckpointTag::DiscriminatorPretrained), b"").unwrap();
        assert_eq!(store.detect_stage(), TrainingStage::MlePretraining);
    }
}
