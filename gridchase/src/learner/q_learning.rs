use super::errors::LearnerError;
use super::traits::{Learner, PolicyVersion, PursuitShard};
use crate::config::LearnerConfig;
use crate::env::{Action, Observation, Step};
use crate::inference::{LoadedPolicy, PolicyArtifact, TabularPolicy};
use async_trait::async_trait;
use tracing::debug;

/// One-step tabular Q-learning over submitted experience.
///
/// Truncated transitions still bootstrap from the next state; only a capture
/// ends the return.
pub struct QLearner {
    table: TabularPolicy,
    config: LearnerConfig,
    pending: Vec<Step<Observation, Action>>,
    version: u64,
    transitions_seen: u64,
}

impl QLearner {
    pub fn new(grid_size: i32, config: LearnerConfig) -> Result<Self, LearnerError> {
        Ok(Self {
            table: TabularPolicy::zeros(grid_size, config.epsilon_start)?,
            config,
            pending: Vec::new(),
            version: 0,
            transitions_seen: 0,
        })
    }

    pub fn epsilon(&self) -> f32 {
        self.table.epsilon()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn table(&self) -> &TabularPolicy {
        &self.table
    }

    pub fn into_artifact(self) -> PolicyArtifact {
        PolicyArtifact::new(LoadedPolicy::Tabular(self.table))
    }

    fn learn(&mut self, step: &Step<Observation, Action>) {
        let target = if step.terminated {
            step.rew
        } else {
            let best_next = self
                .table
                .q(&step.next_obs)
                .iter()
                .copied()
                .fold(f32::NEG_INFINITY, f32::max);
            step.rew + self.config.gamma * best_next
        };
        let lr = self.config.learning_rate;
        let q = &mut self.table.q_mut(&step.obs)[step.act.index()];
        *q += lr * (target - *q);
    }
}

#[async_trait]
impl Learner for QLearner {
    type Policy = TabularPolicy;

    fn policy(&self) -> TabularPolicy {
        self.table.clone()
    }

    async fn submit(&mut self, shards: Vec<PursuitShard>) -> Result<(), LearnerError> {
        for shard in shards {
            let finite = |obs: &Observation| obs.as_array().iter().all(|v| v.is_finite());
            if let Some(bad) = shard
                .steps
                .iter()
                .position(|s| !finite(&s.obs) || !finite(&s.next_obs) || !s.rew.is_finite())
            {
                return Err(LearnerError::InvalidTransition {
                    shard: shard.id,
                    reason: format!("step {bad} has non-finite values"),
                });
            }
            self.pending.extend(shard.steps);
        }
        Ok(())
    }

    async fn update(&mut self) -> Result<PolicyVersion, LearnerError> {
        if self.pending.is_empty() {
            return Err(LearnerError::EmptyBatch);
        }

        let batch = std::mem::take(&mut self.pending);
        for step in &batch {
            self.learn(step);
        }
        self.transitions_seen += batch.len() as u64;

        let epsilon = (self.table.epsilon() * self.config.epsilon_decay).max(self.config.epsilon_end);
        self.table.set_epsilon(epsilon);
        self.version += 1;

        debug!(
            version = self.version,
            transitions = batch.len(),
            epsilon,
            "q-table updated"
        );
        Ok(PolicyVersion {
            id: self.version,
            transitions_seen: self.transitions_seen,
        })
    }
}
