mod errors;
mod q_learning;
mod traits;

pub use errors::LearnerError;
pub use q_learning::QLearner;
pub use traits::{Learner, PolicyVersion, PursuitShard};
