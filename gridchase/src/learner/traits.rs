use super::errors::LearnerError;
use crate::env::{Action, Observation, TrajectoryShard};
use crate::inference::Policy;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type PursuitShard = TrajectoryShard<Observation, Action>;

/// Identifies the policy an update produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVersion {
    pub id: u64,
    pub transitions_seen: u64,
}

/// The policy optimizer seam. The training loop only needs a policy snapshot
/// to act with, a place to put experience, and a way to trigger an update.
#[async_trait]
pub trait Learner: Send {
    type Policy: Policy + Clone + 'static;

    /// Snapshot of the current policy, used for the next rollout.
    fn policy(&self) -> Self::Policy;
    async fn submit(&mut self, shards: Vec<PursuitShard>) -> Result<(), LearnerError>;
    async fn update(&mut self) -> Result<PolicyVersion, LearnerError>;
}
