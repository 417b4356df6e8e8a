//! Hyperparameters for a SeqGAN run.
//!
//! `SeqGanConfig` is a burn `Config`, so it round-trips through JSON with
//! `SeqGanConfig::load(path)` / `config.save(path)`. Component configs for
//! the generator, discriminator and oracle are derived from it so that the
//! three models always agree on vocabulary size and sequence length.

use std::path::Path;

use burn::config::Config;

use crate::error::SeqGanError;
use crate::model::discriminator::DiscriminatorConfig;
use crate::model::generator::GeneratorConfig;

/// Top-level run configuration.
#[derive(Config, Debug)]
pub struct SeqGanConfig {
    /// Number of distinct tokens.
    #[config(default = 5000)]
    pub vocab_size: usize,
    /// Length of every sampled / trained sequence.
    #[config(default = 20)]
    pub max_seq_len: usize,
    /// Token fed to the generator at step 0.
    #[config(default = 0)]
    pub start_letter: u32,
    /// Minibatch size.
    #[config(default = 32)]
    pub batch_size: usize,
    /// Real samples drawn from the oracle, and generated samples per d-step.
    #[config(default = 10000)]
    pub pos_neg_samples: usize,
    #[config(default = 32)]
    pub gen_embedding_dim: usize,
    #[config(default = 32)]
    pub gen_hidden_dim: usize,
    #[config(default = 64)]
    pub dis_embedding_dim: usize,
    #[config(default = 64)]
    pub dis_hidden_dim: usize,
    #[config(default = 0.2)]
    pub dis_dropout: f64,
    /// Standard deviation of the oracle's N(0, std) parameters.
    #[config(default = 1.0)]
    pub oracle_init_std: f64,
    /// Adam learning rate for the generator (MLE and PG).
    #[config(default = 1e-2)]
    pub generator_lr: f64,
    /// AdaGrad learning rate for the discriminator.
    #[config(default = 1e-2)]
    pub discriminator_lr: f64,
    #[config(default = 100)]
    pub mle_train_epochs: usize,
    #[config(default = 50)]
    pub dis_pretrain_d_steps: usize,
    #[config(default = 3)]
    pub dis_pretrain_epochs: usize,
    #[config(default = 50)]
    pub adv_train_epochs: usize,
    #[config(default = 1)]
    pub adv_pg_batches: usize,
    #[config(default = 5)]
    pub adv_d_steps: usize,
    #[config(default = 3)]
    pub adv_dis_epochs: usize,
    /// Policy-gradient batches hold `batch_size * pg_sample_multiplier` samples.
    #[config(default = 2)]
    pub pg_sample_multiplier: usize,
    /// Oracle and generator samples (each) in the discriminator validation set.
    #[config(default = 100)]
    pub validation_samples: usize,
    /// Seed for the host RNG (token sampling and shuffling).
    #[config(default = 42)]
    pub seed: u64,
}

/// Numeric hyperparameters handed to each trainer.
#[derive(Debug, Clone)]
pub struct TrainingParams {
    pub pos_neg_samples: usize,
    pub batch_size: usize,
    pub start_letter: u32,
    pub max_seq_len: usize,
    pub pg_sample_multiplier: usize,
    pub validation_samples: usize,
    pub generator_lr: f64,
    pub discriminator_lr: f64,
}

impl TrainingParams {
    /// Checks every trainer relies on before slicing or dividing.
    pub fn validate(&self) -> crate::error::Result<()> {
        let positive = [
            ("batch_size", self.batch_size),
            ("max_seq_len", self.max_seq_len),
            ("pos_neg_samples", self.pos_neg_samples),
            ("pg_sample_multiplier", self.pg_sample_multiplier),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(SeqGanError::InvalidConfig(format!("{name} must be > 0")));
            }
        }
        Ok(())
    }
}

impl SeqGanConfig {
    /// Load a JSON config file.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let config = Self::load(path)
            .map_err(|e| SeqGanError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// A tiny configuration for smoke runs and tests.
    pub fn quick() -> Self {
        Self::new()
            .with_vocab_size(16)
            .with_max_seq_len(8)
            .with_batch_size(8)
            .with_pos_neg_samples(64)
            .with_gen_embedding_dim(8)
            .with_gen_hidden_dim(8)
            .with_dis_embedding_dim(8)
            .with_dis_hidden_dim(8)
            .with_mle_train_epochs(2)
            .with_dis_pretrain_d_steps(1)
            .with_dis_pretrain_epochs(1)
            .with_adv_train_epochs(2)
            .with_adv_d_steps(1)
            .with_adv_dis_epochs(1)
            .with_validation_samples(8)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        let positive = [
            ("vocab_size", self.vocab_size),
            ("max_seq_len", self.max_seq_len),
            ("batch_size", self.batch_size),
            ("pos_neg_samples", self.pos_neg_samples),
            ("gen_embedding_dim", self.gen_embedding_dim),
            ("gen_hidden_dim", self.gen_hidden_dim),
            ("dis_embedding_dim", self.dis_embedding_dim),
            ("dis_hidden_dim", self.dis_hidden_dim),
            ("pg_sample_multiplier", self.pg_sample_multiplier),
            ("validation_samples", self.validation_samples),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(SeqGanError::InvalidConfig(format!("{name} must be > 0")));
            }
        }
        if self.start_letter as usize >= self.vocab_size {
            return Err(SeqGanError::InvalidConfig(format!(
                "start_letter {} outside vocabulary of {}",
                self.start_letter, self.vocab_size
            )));
        }
        if !(0.0..1.0).contains(&self.dis_dropout) {
            return Err(SeqGanError::InvalidConfig(format!(
                "dis_dropout {} not in [0, 1)",
                self.dis_dropout
            )));
        }
        if self.oracle_init_std <= 0.0 {
            return Err(SeqGanError::InvalidConfig(
                "oracle_init_std must be > 0".into(),
            ));
        }
        if self.generator_lr <= 0.0 || self.discriminator_lr <= 0.0 {
            return Err(SeqGanError::InvalidConfig(
                "learning rates must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Fail if `saved` would build models with different parameter shapes.
    ///
    /// burn restores tensor shapes from the record, so loading a checkpoint
    /// into a differently shaped config silently keeps the saved shapes.
    pub fn ensure_same_shapes(&self, saved: &SeqGanConfig) -> crate::error::Result<()> {
        let shapes = [
            ("vocab_size", self.vocab_size, saved.vocab_size),
            ("gen_embedding_dim", self.gen_embedding_dim, saved.gen_embedding_dim),
            ("gen_hidden_dim", self.gen_hidden_dim, saved.gen_hidden_dim),
            ("dis_embedding_dim", self.dis_embedding_dim, saved.dis_embedding_dim),
            ("dis_hidden_dim", self.dis_hidden_dim, saved.dis_hidden_dim),
        ];
        for (name, current, previous) in shapes {
            if current != previous {
                return Err(SeqGanError::InvalidConfig(format!(
                    "{name} is {current} but the checkpoints were trained with {previous}"
                )));
            }
        }
        Ok(())
    }

    pub fn training_params(&self) -> TrainingParams {
        TrainingParams {
            pos_neg_samples: self.pos_neg_samples,
            batch_size: self.batch_size,
            start_letter: self.start_letter,
            max_seq_len: self.max_seq_len,
            pg_sample_multiplier: self.pg_sample_multiplier,
            validation_samples: self.validation_samples,
            generator_lr: self.generator_lr,
            discriminator_lr: self.discriminator_lr,
        }
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::new(self.vocab_size)
            .with_embedding_dim(self.gen_embedding_dim)
            .with_hidden_dim(self.gen_hidden_dim)
    }

    /// The oracle shares the generator's shape but uses N(0, std) weights.
    pub fn oracle_config(&self) -> GeneratorConfig {
        self.generator_config()
            .with_init_std(Some(self.oracle_init_std))
    }

    pub fn discriminator_config(&self) -> DiscriminatorConfig {
        DiscriminatorConfig::new(self.vocab_size)
            .with_embedding_dim(self.dis_embedding_dim)
            .with_hidden_dim(self.dis_hidden_dim)
            .with_dropout(self.dis_dropout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_run() {
        let config = SeqGanConfig::new();
        assert_eq!(config.vocab_size, 5000);
        assert_eq!(config.max_seq_len, 20);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.pos_neg_samples, 10000);
        assert_eq!(config.mle_train_epochs, 100);
        assert_eq!(config.adv_train_epochs, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn quick_config_is_valid() {
        assert!(SeqGanConfig::quick().validate().is_ok());
    }

    #[test]
    fn rejects_zero_batch_size() {
        let err = SeqGanConfig::new().with_batch_size(0).validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn training_params_reject_zero_sequence_length() {
        let mut params = SeqGanConfig::quick().training_params();
        assert!(params.validate().is_ok());
        params.max_seq_len = 0;
        let err = params.validate().unwrap_err();
        assert!(matches!(err, SeqGanError::InvalidConfig(ref m) if m.contains("max_seq_len")));
    }

    #[test]
    fn rejects_start_letter_outside_vocab() {
        let config = SeqGanConfig::new().with_vocab_size(4).with_start_letter(4);
        assert!(matches!(
            config.validate(),
            Err(SeqGanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_dropout_of_one() {
        assert!(SeqGanConfig::new().with_dis_dropout(1.0).validate().is_err());
    }

    #[test]
    fn shape_changes_are_incompatible() {
        let saved = SeqGanConfig::quick();
        assert!(saved.clone().with_seed(3).with_mle_train_epochs(9).ensure_same_shapes(&saved).is_ok());

        let err = saved.clone().with_vocab_size(20).ensure_same_shapes(&saved).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config: vocab_size is 20 but the checkpoints were trained with 16"
        );
        assert!(saved.clone().with_dis_hidden_dim(4).ensure_same_shapes(&saved).is_err());
    }

    #[test]
    fn derived_configs_share_vocab() {
        let config = SeqGanConfig::quick();
        assert_eq!(config.generator_config().vocab_size, 16);
        assert_eq!(config.discriminator_config().vocab_size, 16);
        assert_eq!(config.oracle_config().init_std, Some(1.0));
        assert_eq!(config.generator_config().init_std, None);
    }

    #[test]
    fn json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seqgan.json");
        let config = SeqGanConfig::quick().with_seed(7);
        config.save(&path).unwrap();

        let loaded = SeqGanConfig::from_file(&path).unwrap();
        assert_eq!(loaded.seed, 7);
        assert_eq!(loaded.vocab_size, config.vocab_size);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = SeqGanConfig::from_file(Path::new("/nonexistent/seqgan.json")).unwrap_err();
        assert!(matches!(err, SeqGanError::Config(_)));
    }
}
