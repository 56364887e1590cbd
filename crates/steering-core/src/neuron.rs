use crate::nn::NetworkError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Initial weights are drawn uniformly from `[-WEIGHT_LIMIT, WEIGHT_LIMIT]`.
pub const WEIGHT_LIMIT: f32 = 1.0;

/// Single tanh unit: a fixed weight vector plus bias.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    weights: Vec<f32>,
    bias: f32,
}

impl Neuron {
    /// Zero bias, weights drawn independently from `rng`.
    pub fn random<R: Rng + ?Sized>(input_count: usize, rng: &mut R) -> Self {
        let weights = (0..input_count)
            .map(|_| rng.random_range(-WEIGHT_LIMIT..=WEIGHT_LIMIT))
            .collect();
        Self { weights, bias: 0.0 }
    }

    pub fn with_weights(weights: Vec<f32>, bias: f32) -> Self {
        Self { weights, bias }
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn input_count(&self) -> usize {
        self.weights.len()
    }

    /// `tanh(bias + Σ inputs[i] * weights[i])`. Panics on a length mismatch.
    pub fn activate(&self, inputs: &[f32]) -> f32 {
        self.try_activate(inputs).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_activate(&self, inputs: &[f32]) -> Result<f32, NetworkError> {
        if inputs.len() != self.weights.len() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.weights.len(),
                actual: inputs.len(),
            });
        }
        let sum = inputs
            .iter()
            .zip(&self.weights)
            .fold(self.bias, |acc, (x, w)| acc + x * w);
        Ok(sum.tanh())
    }
}
