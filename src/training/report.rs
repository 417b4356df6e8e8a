//! Per-epoch metrics and the run history written next to the checkpoints.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One epoch of MLE pretraining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MleEpochReport {
    pub epoch: usize,
    /// Mean per-token NLL on the real data.
    pub average_train_nll: f32,
    /// Mean per-token oracle NLL of fresh generator samples.
    pub oracle_nll: f32,
}

impl MleEpochReport {
    /// Progress line prefix for `epoch`.
    pub fn label(epoch: usize) -> String {
        format!("epoch {epoch} : ")
    }

    pub fn summary(&self) -> String {
        format!(
            " average_train_NLL = {:.4}, oracle_sample_NLL = {:.4}",
            self.average_train_nll, self.oracle_nll
        )
    }
}

/// One call of policy-gradient training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PgReport {
    pub batches: usize,
    pub average_pg_loss: f32,
    /// Mean discriminator reward of the sampled batches.
    pub average_reward: f32,
    pub oracle_nll: f32,
}

impl PgReport {
    pub fn summary(&self) -> String {
        format!(" oracle_sample_NLL = {:.4}", self.oracle_nll)
    }
}

/// One epoch of discriminator training within a d-step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscriminatorEpochReport {
    pub d_step: usize,
    pub epoch: usize,
    pub average_loss: f32,
    pub train_accuracy: f32,
    pub val_accuracy: f32,
}

impl DiscriminatorEpochReport {
    pub fn label(d_step: usize, epoch: usize) -> String {
        format!("d-step {d_step} epoch {epoch} : ")
    }

    pub fn summary(&self) -> String {
        format!(
            " average_loss = {:.4}, train_acc = {:.4}, val_acc = {:.4}",
            self.average_loss, self.train_accuracy, self.val_accuracy
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdversarialEpochReport {
    pub epoch: usize,
    pub generator: PgReport,
    pub discriminator: Vec<DiscriminatorEpochReport>,
}

/// Everything a pipeline run measured, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub mle_pretraining: Vec<MleEpochReport>,
    pub discriminator_pretraining: Vec<DiscriminatorEpochReport>,
    pub initial_oracle_nll: Option<f32>,
    pub adversarial: Vec<AdversarialEpochReport>,
}

impl TrainingHistory {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Oracle NLL after the last completed stage.
    pub fn final_oracle_nll(&self) -> Option<f32> {
        self.adversarial
            .last()
            .map(|e| e.generator.oracle_nll)
            .or(self.initial_oracle_nll)
            .or_else(|| self.mle_pretraining.last().map(|e| e.oracle_nll))
    }
}
