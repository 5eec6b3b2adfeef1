use crate::inference::InferenceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LearnerError {
    #[error("update requested with no submitted transitions")]
    EmptyBatch,
    #[error("invalid transition in shard {shard}: {reason}")]
    InvalidTransition { shard: String, reason: String },
    #[error(transparent)]
    Policy(#[from] InferenceError),
}
