use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("step called before the first reset")]
    NotReset,
    #[error("episode already finished; call reset before stepping again")]
    EpisodeFinished,
    #[error("invalid action {0}: expected an integer in 0..=4")]
    InvalidAction(i64),
    #[error("expected {expected} actions, got {got}")]
    BatchMismatch { expected: usize, got: usize },
    #[error("environment index {0} out of range")]
    NoSuchEnv(usize),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid episode state: {0}")]
    InvalidState(String),
    #[error("render error: {0}")]
    Render(String),
}
