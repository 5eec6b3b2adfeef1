use super::errors::InferenceError;
use super::traits::{Policy, argmax};
use crate::env::{Action, Observation};
use serde::{Deserialize, Serialize};

/// Action values for every (agent, target) cell pair, explored epsilon-greedily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularPolicy {
    grid_size: i32,
    epsilon: f32,
    q_values: Vec<[f32; Action::COUNT]>,
}

impl TabularPolicy {
    pub fn zeros(grid_size: i32, epsilon: f32) -> Result<Self, InferenceError> {
        let rows = Self::rows_for(grid_size)?;
        let mut q_values = Vec::new();
        q_values.try_reserve_exact(rows).map_err(|e| {
            InferenceError::InvalidPolicy(format!("cannot allocate {rows} q-table rows: {e}"))
        })?;
        q_values.resize(rows, [0.0; Action::COUNT]);
        Ok(Self {
            grid_size,
            epsilon: epsilon.clamp(0.0, 1.0),
            q_values,
        })
    }

    /// One row per (agent, target) cell pair: `grid_size^4`.
    fn rows_for(grid_size: i32) -> Result<usize, InferenceError> {
        if grid_size < 2 {
            return Err(InferenceError::InvalidPolicy(format!(
                "grid size {grid_size} is too small"
            )));
        }
        usize::try_from(grid_size)
            .ok()
            .and_then(|cells| cells.checked_pow(4))
            .ok_or_else(|| {
                InferenceError::InvalidPolicy(format!("grid size {grid_size} is too large"))
            })
    }

    pub fn grid_size(&self) -> i32 {
        self.grid_size
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    /// Row of the table an observation falls into.
    ///
    /// Each component is rounded to the nearest cell and clamped onto the grid,
    /// so continuous observations from the live arena resolve to a trained row.
    pub fn state_index(&self, obs: &Observation) -> usize {
        let max = (self.grid_size - 1) as f32;
        obs.as_array().iter().fold(0usize, |index, v| {
            let cell = if v.is_nan() { 0.0 } else { v.round().clamp(0.0, max) };
            index * self.grid_size as usize + cell as usize
        })
    }

    pub fn q(&self, obs: &Observation) -> &[f32; Action::COUNT] {
        &self.q_values[self.state_index(obs)]
    }

    pub fn q_mut(&mut self, obs: &Observation) -> &mut [f32; Action::COUNT] {
        let index = self.state_index(obs);
        &mut self.q_values[index]
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        let expected = Self::rows_for(self.grid_size)?;
        if self.q_values.len() != expected {
            return Err(InferenceError::InvalidPolicy(format!(
                "q-table has {} rows, expected {expected}",
                self.q_values.len()
            )));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(InferenceError::InvalidPolicy(format!(
                "epsilon {} outside [0, 1]",
                self.epsilon
            )));
        }
        if self.q_values.iter().flatten().any(|q| !q.is_finite()) {
            return Err(InferenceError::InvalidPolicy(
                "q-table contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }
}

impl Policy for TabularPolicy {
    fn action_probabilities(&self, obs: &Observation) -> [f32; Action::COUNT] {
        let spread = self.epsilon / Action::COUNT as f32;
        let mut probs = [spread; Action::COUNT];
        probs[self.greedy_action(obs).index()] += 1.0 - self.epsilon;
        probs
    }

    fn greedy_action(&self, obs: &Observation) -> Action {
        Action::ALL[argmax(self.q(obs))]
    }
}
