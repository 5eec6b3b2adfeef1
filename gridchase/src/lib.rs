pub mod bridge;
pub mod config;
pub mod env;
pub mod eval;
pub mod geometry;
pub mod inference;
pub mod learner;
pub mod train;

pub use config::{Config, ConfigError};
pub use env::{Action, Env, GridPursuitEnv, Observation, VecEnv};
pub use inference::{LoadedPolicy, Policy, load_policy};
