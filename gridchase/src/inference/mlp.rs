use super::errors::InferenceError;
use super::traits::Policy;
use crate::env::{Action, Observation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Tanh,
    Relu,
}

impl Activation {
    fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
        }
    }
}

/// A fully connected layer. `weights[o][i]` connects input `i` to output `o`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

impl DenseLayer {
    pub fn in_dim(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    pub fn out_dim(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, x: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f32>() + b)
            .collect()
    }
}

/// Policy network exported from an external optimizer: hidden layers use
/// `activation`, the last layer emits one logit per action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpPolicy {
    #[serde(default)]
    pub activation: Activation,
    pub layers: Vec<DenseLayer>,
}

impl MlpPolicy {
    pub fn logits(&self, obs: &Observation) -> Vec<f32> {
        let last = self.layers.len().saturating_sub(1);
        let mut x = obs.as_array().to_vec();
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(&x);
            if i < last {
                x.iter_mut().for_each(|v| *v = self.activation.apply(*v));
            }
        }
        x
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        let invalid = |msg: String| Err(InferenceError::InvalidPolicy(msg));

        let (Some(first), Some(last)) = (self.layers.first(), self.layers.last()) else {
            return invalid("network has no layers".to_string());
        };
        if first.in_dim() != Observation::LEN {
            return invalid(format!(
                "network takes {} inputs, observations have {}",
                first.in_dim(),
                Observation::LEN
            ));
        }
        if last.out_dim() != Action::COUNT {
            return invalid(format!(
                "network emits {} logits, there are {} actions",
                last.out_dim(),
                Action::COUNT
            ));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.bias.len() != layer.out_dim() {
                return invalid(format!("layer {i}: bias length does not match outputs"));
            }
            if layer.weights.iter().any(|row| row.len() != layer.in_dim()) {
                return invalid(format!("layer {i}: ragged weight matrix"));
            }
            if layer
                .weights
                .iter()
                .flatten()
                .chain(&layer.bias)
                .any(|v| !v.is_finite())
            {
                return invalid(format!("layer {i}: non-finite parameter"));
            }
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].out_dim() != pair[1].in_dim() {
                return invalid(format!(
                    "layer {} emits {} values but layer {} expects {}",
                    i,
                    pair[0].out_dim(),
                    i + 1,
                    pair[1].in_dim()
                ));
            }
        }
        Ok(())
    }
}

impl Policy for MlpPolicy {
    fn action_probabilities(&self, obs: &Observation) -> [f32; Action::COUNT] {
        let logits = self.logits(obs);
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut probs = [0.0; Action::COUNT];
        for (p, l) in probs.iter_mut().zip(&logits) {
            *p = (l - max).exp();
        }
        let total: f32 = probs.iter().sum();
        probs.iter_mut().for_each(|p| *p /= total);
        probs
    }
}
