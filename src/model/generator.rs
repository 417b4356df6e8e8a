//! GRU language model used as the SeqGAN generator (and, frozen, as the oracle).
//!
//! Architecture: token embedding -> single-layer GRU -> linear projection to
//! the vocabulary -> log-softmax. Training uses teacher forcing over full
//! sequences; sampling runs the GRU one step at a time and feeds each drawn
//! token back in.

use burn::config::Config;
use burn::module::Module;
use burn::nn::gru::{Gru, GruConfig};
use burn::nn::{Embedding, EmbeddingConfig, Initializer, Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation;
use rand::Rng;

use crate::data::sequences::SequenceBatch;

/// Generator configuration.
#[derive(Config, Debug)]
pub struct GeneratorConfig {
    /// Vocabulary size (input embedding rows and output logits).
    pub vocab_size: usize,
    /// Token embedding width.
    #[config(default = 32)]
    pub embedding_dim: usize,
    /// GRU hidden width.
    #[config(default = 32)]
    pub hidden_dim: usize,
    /// When set, every parameter is drawn from N(0, init_std) instead of the
    /// layer defaults. Used for the oracle.
    #[config(default = "None")]
    pub init_std: Option<f64>,
}

#[derive(Module, Debug)]
pub struct Generator<B: Backend> {
    embedding: Embedding<B>,
    gru: Gru<B>,
    output: Linear<B>,
}

impl GeneratorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Generator<B> {
        let mut embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim);
        let mut gru = GruConfig::new(self.embedding_dim, self.hidden_dim, true);
        let mut output = LinearConfig::new(self.hidden_dim, self.vocab_size);

        if let Some(std) = self.init_std {
            let normal = Initializer::Normal { mean: 0.0, std };
            embedding = embedding.with_initializer(normal.clone());
            gru = gru.with_initializer(normal.clone());
            output = output.with_initializer(normal);
        }

        Generator {
            embedding: embedding.init(device),
            gru: gru.init(device),
            output: output.init(device),
        }
    }
}

impl<B: Backend> Generator<B> {
    /// Teacher-forced pass over whole sequences.
    ///
    /// - `input`: [batch, seq] previous tokens (start letter at position 0)
    ///
    /// Returns: [batch, seq, vocab] log-probabilities of the next token.
    pub fn forward(&self, input: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let emb = self.embedding.forward(input);
        let hidden = self.gru.forward(emb, None);
        activation::log_softmax(self.output.forward(hidden), 2)
    }

    /// Negative log-likelihood of `target`, summed over positions and
    /// averaged over the batch (so it scales with sequence length).
    pub fn batch_nll_loss(&self, input: Tensor<B, 2, Int>, target: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        let [batch, _] = target.dims();
        let picked = self.target_log_probs(input, target);
        picked.sum().neg().div_scalar(batch as f32)
    }

    /// Policy-gradient loss: `-(sum_{b,t} log p(target[b,t]) * reward[b]) / batch`.
    ///
    /// `rewards` is [batch] and must not require gradients.
    pub fn batch_pg_loss(
        &self,
        input: Tensor<B, 2, Int>,
        target: Tensor<B, 2, Int>,
        rewards: Tensor<B, 1>,
    ) -> Tensor<B, 1> {
        let [batch, seq_len] = target.dims();
        let picked = self.target_log_probs(input, target);
        let rewards = rewards.reshape([batch, 1]).expand([batch, seq_len]);
        (picked * rewards).sum().neg().div_scalar(batch as f32)
    }

    /// log p(target[b, t] | input[b, ..=t]) as [batch, seq].
    fn target_log_probs(&self, input: Tensor<B, 2, Int>, target: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch, seq_len] = target.dims();
        let log_probs = self.forward(input);
        log_probs
            .gather(2, target.unsqueeze_dim::<3>(2))
            .reshape([batch, seq_len])
    }

    /// Sample `num_samples` sequences of `max_seq_len` tokens.
    ///
    /// Each step draws from the softmax of the current logits; the drawn
    /// token becomes the next input. Fails when `max_seq_len` is zero.
    pub fn sample<R: Rng>(
        &self,
        num_samples: usize,
        start_letter: u32,
        max_seq_len: usize,
        rng: &mut R,
        device: &B::Device,
    ) -> crate::error::Result<SequenceBatch> {
        let mut tokens = vec![0u32; num_samples * max_seq_len];
        if num_samples == 0 || max_seq_len == 0 {
            return SequenceBatch::new(tokens, max_seq_len);
        }

        let mut prev = vec![start_letter as i32; num_samples];
        let mut hidden: Option<Tensor<B, 2>> = None;

        for step in 0..max_seq_len {
            let input = Tensor::<B, 2, Int>::from_data(
                TensorData::new(prev.clone(), [num_samples, 1]),
                device,
            );
            let emb = self.embedding.forward(input);
            // [n, 1, hidden] -> [n, hidden]
            let state = self.gru.forward(emb, hidden).squeeze_dim::<2>(1);
            let probs = activation::softmax(self.output.forward(state.clone()), 1);
            let probs: Vec<f32> = probs.into_data().iter::<f32>().collect();
            let vocab = probs.len() / num_samples;

            for (row, dist) in probs.chunks_exact(vocab).enumerate() {
                let token = sample_categorical(dist, rng);
                tokens[row * max_seq_len + step] = token;
                prev[row] = token as i32;
            }
            hidden = Some(state);
        }

        SequenceBatch::new(tokens, max_seq_len)
    }
}

/// Inverse-CDF draw from an (approximately) normalised distribution.
pub(crate) fn sample_categorical<R: Rng>(probs: &[f32], rng: &mut R) -> u32 {
    let total: f32 = probs.iter().sum();
    let u = rng.random::<f32>() * total;

    let mut cumulative = 0.0f32;
    for (i, &p) in probs.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return i as u32;
        }
    }
    // rounding left u just above the last bucket
    probs.len().saturating_sub(1) as u32
}
