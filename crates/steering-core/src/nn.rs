//! Fully connected feedforward network of tanh neurons.
//!
//! Layer sizes come from a topology such as `[4, 6, 2]`: 4 inputs, one hidden
//! layer of 6 neurons, 2 outputs. Weights are fixed once constructed.

use crate::neuron::Neuron;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    TooFewLayers { actual: usize },
    EmptyLayer { index: usize },
    DimensionMismatch { expected: usize, actual: usize },
    InsufficientWeights { expected: usize, actual: usize },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::TooFewLayers { actual } => {
                write!(f, "topology needs at least 2 layers, got {actual}")
            }
            NetworkError::EmptyLayer { index } => {
                write!(f, "topology layer {index} must have a positive size")
            }
            NetworkError::DimensionMismatch { expected, actual } => {
                write!(f, "expected {expected} inputs, got {actual}")
            }
            NetworkError::InsufficientWeights { expected, actual } => write!(
                f,
                "insufficient weights: need {expected} elements, got {actual}"
            ),
        }
    }
}

impl Error for NetworkError {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Network {
    topology: Vec<usize>,
    layers: Vec<Vec<Neuron>>,
}

impl Network {
    /// Check that a topology describes at least one layer of connections.
    pub fn validate_topology(topology: &[usize]) -> Result<(), NetworkError> {
        if topology.len() < 2 {
            return Err(NetworkError::TooFewLayers {
                actual: topology.len(),
            });
        }
        if let Some(index) = topology.iter().position(|&n| n == 0) {
            return Err(NetworkError::EmptyLayer { index });
        }
        Ok(())
    }

    /// Number of parameters (weights + biases) a topology needs.
    pub fn parameter_count(topology: &[usize]) -> usize {
        topology.windows(2).map(|pair| (pair[0] + 1) * pair[1]).sum()
    }

    /// Build a network whose weights are drawn from `rng`, layer by layer and
    /// neuron by neuron. Biases start at zero.
    pub fn random<R: Rng + ?Sized>(
        topology: &[usize],
        rng: &mut R,
    ) -> Result<Self, NetworkError> {
        Self::validate_topology(topology)?;
        let mut layers = Vec::with_capacity(topology.len() - 1);
        for pair in topology.windows(2) {
            let mut layer = Vec::with_capacity(pair[1]);
            for _ in 0..pair[1] {
                layer.push(Neuron::random(pair[0], rng));
            }
            layers.push(layer);
        }
        Ok(Self {
            topology: topology.to_vec(),
            layers,
        })
    }

    /// Build a network from a flat parameter stream. Each neuron consumes its
    /// weights followed by its bias, in layer then neuron order.
    pub fn from_weights(
        topology: &[usize],
        weights: impl IntoIterator<Item = f32>,
    ) -> Result<Self, NetworkError> {
        Self::validate_topology(topology)?;
        let expected = Self::parameter_count(topology);
        let mut weights = weights.into_iter();
        let mut consumed = 0usize;
        let mut layers = Vec::with_capacity(topology.len() - 1);
        for pair in topology.windows(2) {
            let mut layer = Vec::with_capacity(pair[1]);
            for _ in 0..pair[1] {
                let mut params = Vec::with_capacity(pair[0] + 1);
                params.extend(weights.by_ref().take(pair[0] + 1));
                consumed += params.len();
                if params.len() != pair[0] + 1 {
                    return Err(NetworkError::InsufficientWeights {
                        expected,
                        actual: consumed,
                    });
                }
                let bias = params.pop().unwrap_or_default();
                layer.push(Neuron::with_weights(params, bias));
            }
            layers.push(layer);
        }
        Ok(Self {
            topology: topology.to_vec(),
            layers,
        })
    }

    /// Flatten parameters in the order expected by `from_weights`.
    pub fn to_weight_vec(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(Self::parameter_count(&self.topology));
        for neuron in self.layers.iter().flatten() {
            out.extend_from_slice(neuron.weights());
            out.push(neuron.bias());
        }
        out
    }

    pub fn topology(&self) -> &[usize] {
        &self.topology
    }

    pub fn layers(&self) -> &[Vec<Neuron>] {
        &self.layers
    }

    pub fn input_count(&self) -> usize {
        self.topology[0]
    }

    pub fn output_count(&self) -> usize {
        self.topology[self.topology.len() - 1]
    }

    /// Weights only, biases excluded.
    pub fn weight_count(&self) -> usize {
        self.topology.windows(2).map(|pair| pair[0] * pair[1]).sum()
    }

    /// Forward pass. Panics if `inputs.len() != topology[0]`.
    pub fn forward(&self, inputs: &[f32]) -> Vec<f32> {
        self.try_forward(inputs).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_forward(&self, inputs: &[f32]) -> Result<Vec<f32>, NetworkError> {
        if inputs.len() != self.input_count() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.input_count(),
                actual: inputs.len(),
            });
        }
        let mut current = inputs.to_vec();
        for layer in &self.layers {
            current = layer
                .iter()
                .map(|neuron| neuron.try_activate(&current))
                .collect::<Result<Vec<f32>, _>>()?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn layer_shapes_follow_topology() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let nn = Network::random(&[4, 6, 2], &mut rng).unwrap();
        assert_eq!(nn.layers().len(), 2);
        assert_eq!(nn.layers()[0].len(), 6);
        assert!(nn.layers()[0].iter().all(|n| n.input_count() == 4));
        assert_eq!(nn.layers()[1].len(), 2);
        assert!(nn.layers()[1].iter().all(|n| n.input_count() == 6));
        assert_eq!(nn.weight_count(), 4 * 6 + 6 * 2);
        assert_eq!(Network::parameter_count(&[4, 6, 2]), 5 * 6 + 7 * 2);
    }

    #[test]
    fn rejects_short_topology() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        assert_eq!(
            Network::random(&[4], &mut rng),
            Err(NetworkError::TooFewLayers { actual: 1 })
        );
        assert_eq!(
            Network::random(&[], &mut rng),
            Err(NetworkError::TooFewLayers { actual: 0 })
        );
    }

    #[test]
    fn rejects_empty_layer() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        assert_eq!(
            Network::random(&[4, 0, 2], &mut rng),
            Err(NetworkError::EmptyLayer { index: 1 })
        );
    }

    #[test]
    fn same_seed_gives_identical_outputs() {
        let a = Network::random(&[4, 6, 2], &mut ChaCha12Rng::seed_from_u64(99)).unwrap();
        let b = Network::random(&[4, 6, 2], &mut ChaCha12Rng::seed_from_u64(99)).unwrap();
        let input = [0.45, 0.19, 0.4, 0.0];
        let (oa, ob) = (a.forward(&input), b.forward(&input));
        assert_eq!(
            oa.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            ob.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn minimal_network_is_a_single_neuron() {
        let nn = Network::from_weights(&[2, 1], [1.0, 1.0, 0.0]).unwrap();
        let out = nn.forward(&[1.0, 1.0]);
        assert_eq!(out.len(), 1);
        assert!((out[0] - 0.9640).abs() < 1e-4);
    }

    #[test]
    fn forward_matches_manual_layer_composition() {
        // 2 -> 2 -> 1
        let nn = Network::from_weights(
            &[2, 2, 1],
            [0.5, -0.25, 0.1, -1.0, 0.75, 0.0, 2.0, -0.5, 0.2],
        )
        .unwrap();
        let x = [0.3f32, -0.6];
        let h0 = (0.1 + 0.3 * 0.5 + -0.6 * -0.25f32).tanh();
        let h1 = (0.0 + 0.3 * -1.0 + -0.6 * 0.75f32).tanh();
        let expected = (0.2 + h0 * 2.0 + h1 * -0.5f32).tanh();
        let out = nn.forward(&x);
        assert!((out[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn from_weights_reports_short_stream() {
        assert_eq!(
            Network::from_weights(&[4, 6, 2], std::iter::repeat_n(0.0, 10)),
            Err(NetworkError::InsufficientWeights {
                expected: 44,
                actual: 10
            })
        );
    }

    #[test]
    fn weight_vec_round_trips_into_equivalent_network() {
        let nn = Network::random(&[4, 6, 2], &mut ChaCha12Rng::seed_from_u64(5)).unwrap();
        let copy = Network::from_weights(nn.topology(), nn.to_weight_vec()).unwrap();
        assert_eq!(nn, copy);
    }

    #[test]
    fn zero_weights_produce_zero_output() {
        let nn = Network::from_weights(&[4, 6, 2], std::iter::repeat_n(0.0, 44)).unwrap();
        assert!(nn.forward(&[1.0; 4]).iter().all(|o| o.abs() < 1e-7));
    }

    #[test]
    fn wrong_input_length_is_an_error() {
        let nn = Network::random(&[4, 6, 2], &mut ChaCha12Rng::seed_from_u64(5)).unwrap();
        assert_eq!(
            nn.try_forward(&[0.0; 3]),
            Err(NetworkError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    #[should_panic(expected = "expected 4 inputs, got 5")]
    fn forward_panics_on_wrong_input_length() {
        let nn = Network::random(&[4, 6, 2], &mut ChaCha12Rng::seed_from_u64(5)).unwrap();
        nn.forward(&[0.0; 5]);
    }

    proptest! {
        #[test]
        fn proptest_output_length_matches_last_layer(
            topology in proptest::collection::vec(1usize..8, 2..5),
            seed in any::<u64>(),
        ) {
            let mut rng = ChaCha12Rng::seed_from_u64(seed);
            let nn = Network::random(&topology, &mut rng).unwrap();
            let input = vec![0.5f32; topology[0]];
            let out = nn.forward(&input);
            prop_assert_eq!(out.len(), topology[topology.len() - 1]);
            prop_assert!(out.iter().all(|o| o.is_finite() && *o > -1.0 && *o < 1.0));
        }
    }
}
