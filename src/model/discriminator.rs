//! Bidirectional GRU sequence classifier.
//!
//! Scores a token sequence with the probability that it came from the real
//! (oracle) distribution rather than from the generator.

use burn::config::Config;
use burn::module::Module;
use burn::nn::gru::{Gru, GruConfig};
use burn::nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation;

/// Probabilities are clamped to `[EPS, 1 - EPS]` before taking logs.
const BCE_EPS: f32 = 1e-7;

// ─── Configuration ────────────────────────────────────────────────

/// Discriminator configuration.
#[derive(Config, Debug)]
pub struct DiscriminatorConfig {
    /// Vocabulary size.
    pub vocab_size: usize,
    /// Token embedding width.
    #[config(default = 64)]
    pub embedding_dim: usize,
    /// Hidden width of each GRU direction and of the MLP head.
    #[config(default = 64)]
    pub hidden_dim: usize,
    /// Stacked bidirectional GRU layers.
    #[config(default = 2)]
    pub num_layers: usize,
    /// Dropout between GRU layers and inside the head.
    #[config(default = 0.2)]
    pub dropout: f64,
}

// ─── Bidirectional layer ──────────────────────────────────────────

/// One bidirectional GRU layer: a forward-time and a reverse-time GRU.
#[derive(Module, Debug)]
pub struct BiGruLayer<B: Backend> {
    forward_gru: Gru<B>,
    backward_gru: Gru<B>,
}

impl<B: Backend> BiGruLayer<B> {
    /// - `x`: [batch, seq, d_in]
    ///
    /// Returns the per-step outputs [batch, seq, 2*hidden] (forward and
    /// backward halves aligned in time) and the final state of each
    /// direction concatenated as [batch, 2*hidden].
    pub fn forward(&self, x: Tensor<B, 3>) -> (Tensor<B, 3>, Tensor<B, 2>) {
        let [batch, seq_len, _] = x.dims();

        let fwd = self.forward_gru.forward(x.clone(), None);
        let bwd = self.backward_gru.forward(reverse_time(x), None);
        let hidden = fwd.dims()[2];

        let fwd_last = fwd
            .clone()
            .slice([0..batch, seq_len - 1..seq_len, 0..hidden])
            .reshape([batch, hidden]);
        let bwd_last = bwd
            .clone()
            .slice([0..batch, seq_len - 1..seq_len, 0..hidden])
            .reshape([batch, hidden]);

        let outputs = Tensor::cat(vec![fwd, reverse_time(bwd)], 2);
        (outputs, Tensor::cat(vec![fwd_last, bwd_last], 1))
    }
}

/// Reverse a [batch, seq, d] tensor along the time axis.
fn reverse_time<B: Backend>(x: Tensor<B, 3>) -> Tensor<B, 3> {
    let seq_len = x.dims()[1];
    let order: Vec<i32> = (0..seq_len as i32).rev().collect();
    let indices = Tensor::<B, 1, Int>::from_data(TensorData::new(order, [seq_len]), &x.device());
    x.select(1, indices)
}

// ─── Discriminator ────────────────────────────────────────────────

/// embedding -> stacked BiGRU -> [final states] -> Linear -> tanh -> dropout
/// -> Linear -> sigmoid.
#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    embedding: Embedding<B>,
    layers: Vec<BiGruLayer<B>>,
    dropout: Dropout,
    gru_to_hidden: Linear<B>,
    hidden_to_out: Linear<B>,
}

impl DiscriminatorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Discriminator<B> {
        let layers = (0..self.num_layers)
            .map(|i| {
                let d_in = if i == 0 {
                    self.embedding_dim
                } else {
                    2 * self.hidden_dim
                };
                BiGruLayer {
                    forward_gru: GruConfig::new(d_in, self.hidden_dim, true).init(device),
                    backward_gru: GruConfig::new(d_in, self.hidden_dim, true).init(device),
                }
            })
            .collect();

        Discriminator {
            embedding: EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device),
            layers,
            dropout: DropoutConfig::new(self.dropout).init(),
            gru_to_hidden: LinearConfig::new(2 * self.num_layers * self.hidden_dim, self.hidden_dim)
                .init(device),
            hidden_to_out: LinearConfig::new(self.hidden_dim, 1).init(device),
        }
    }
}

impl<B: Backend> Discriminator<B> {
    /// - `input`: [batch, seq] token ids
    ///
    /// Returns: [batch] probability that each sequence is real.
    pub fn forward(&self, input: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        let [batch, _] = input.dims();

        let mut x = self.embedding.forward(input);
        let mut finals = Vec::with_capacity(self.layers.len());
        for (i, layer) in self.layers.iter().enumerate() {
            if i > 0 {
                x = self.dropout.forward(x);
            }
            let (outputs, last) = layer.forward(x);
            finals.push(last);
            x = outputs;
        }

        let hidden = activation::tanh(self.gru_to_hidden.forward(Tensor::cat(finals, 1)));
        let hidden = self.dropout.forward(hidden);
        activation::sigmoid(self.hidden_to_out.forward(hidden)).reshape([batch])
    }

    /// Same as `forward`.
    pub fn batch_classify(&self, input: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        self.forward(input)
    }

    /// Mean binary cross entropy against `target` labels in {0, 1}.
    pub fn batch_bce_loss(&self, input: Tensor<B, 2, Int>, target: Tensor<B, 1>) -> Tensor<B, 1> {
        self.classify_with_loss(input, target).1
    }

    /// Probabilities and their mean BCE from one forward pass.
    pub fn classify_with_loss(
        &self,
        input: Tensor<B, 2, Int>,
        target: Tensor<B, 1>,
    ) -> (Tensor<B, 1>, Tensor<B, 1>) {
        let probs = self.forward(input);
        let loss = bce_loss(probs.clone(), target);
        (probs, loss)
    }
}

/// Mean binary cross entropy between probabilities and {0, 1} targets.
pub fn bce_loss<B: Backend>(probs: Tensor<B, 1>, target: Tensor<B, 1>) -> Tensor<B, 1> {
    let p = probs.clamp(BCE_EPS, 1.0 - BCE_EPS);
    let positive = target.clone() * p.clone().log();
    let negative = target.neg().add_scalar(1.0) * p.neg().add_scalar(1.0).log();
    (positive + negative).mean().neg()
}

/// Rows where `(prob > 0.5) == (label > 0.5)`.
pub fn count_correct(probs: &[f32], labels: &[f32]) -> usize {
    probs
        .iter()
        .zip(labels)
        .filter(|&(&p, &l)| (p > 0.5) == (l > 0.5))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::ElementConversion;

    type B = NdArray;

    fn tiny() -> DiscriminatorConfig {
        DiscriminatorConfig::new(7)
            .with_embedding_dim(4)
            .with_hidden_dim(3)
            .with_dropout(0.0)
    }

    #[test]
    fn classify_shape_and_range() {
        let device = Default::default();
        let model = tiny().init::<B>(&device);
        let input = Tensor::<B, 2, Int>::ones([5, 6], &device);
        let probs: Vec<f32> = model.batch_classify(input).into_data().iter::<f32>().collect();
        assert_eq!(probs.len(), 5);
        assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn bilayer_output_shapes() {
        let device = Default::default();
        let layer = BiGruLayer::<B> {
            forward_gru: GruConfig::new(4, 3, true).init(&device),
            backward_gru: GruConfig::new(4, 3, true).init(&device),
        };
        let (outputs, last) = layer.forward(Tensor::zeros([2, 5, 4], &device));
        assert_eq!(outputs.dims(), [2, 5, 6]);
        assert_eq!(last.dims(), [2, 6]);
    }

    #[test]
    fn reverse_time_flips_sequence_axis() {
        let device = Default::default();
        let x = Tensor::<B, 3>::from_data(
            TensorData::new(vec![1.0f32, 2.0, 3.0], [1, 3, 1]),
            &device,
        );
        let flipped: Vec<f32> = reverse_time(x).into_data().iter::<f32>().collect();
        assert_eq!(flipped, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn bce_of_confident_correct_prediction_is_small() {
        let device = Default::default();
        let probs = Tensor::<B, 1>::from_data(TensorData::new(vec![0.99f32, 0.01], [2]), &device);
        let target = Tensor::<B, 1>::from_data(TensorData::new(vec![1.0f32, 0.0], [2]), &device);
        let loss: f32 = bce_loss(probs, target).into_scalar().elem();
        assert!(loss > 0.0 && loss < 0.02, "loss {loss}");
    }

    #[test]
    fn bce_stays_finite_at_saturation() {
        let device = Default::default();
        let probs = Tensor::<B, 1>::from_data(TensorData::new(vec![0.0f32, 1.0], [2]), &device);
        let target = Tensor::<B, 1>::from_data(TensorData::new(vec![1.0f32, 0.0], [2]), &device);
        let loss: f32 = bce_loss(probs, target).into_scalar().elem();
        assert!(loss.is_finite() && loss > 10.0);
    }

    #[test]
    fn correct_count_uses_half_threshold() {
        assert_eq!(count_correct(&[0.9, 0.2, 0.6, 0.4], &[1.0, 0.0, 0.0, 1.0]), 2);
    }

    #[test]
    fn batch_bce_matches_loss_on_classified_probs() {
        let device = Default::default();
        let model = tiny().init::<B>(&device);
        let input = Tensor::<B, 2, Int>::from_data(
            TensorData::new(vec![1i32, 2, 3, 4, 5, 6], [2, 3]),
            &device,
        );
        let target = Tensor::<B, 1>::from_data(TensorData::new(vec![1.0f32, 0.0], [2]), &device);

        let direct: f32 = model
            .batch_bce_loss(input.clone(), target.clone())
            .into_scalar()
            .elem();
        let composed: f32 = bce_loss(model.batch_classify(input), target).into_scalar().elem();
        assert!((direct - composed).abs() < 1e-6);
        assert!(direct > 0.0);
    }
}
