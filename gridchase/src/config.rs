use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How the environment presents itself to the visualization collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    None,
    Ansi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub grid_size: i32,
    pub episode_step_budget: u32,
    pub render_mode: RenderMode,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            episode_step_budget: 50,
            render_mode: RenderMode::None,
        }
    }
}

impl EnvConfig {
    /// A grid needs two cells so reset can place agent and target apart.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "env.grid_size must be at least 2, got {}",
                self.grid_size
            )));
        }
        if self.episode_step_budget == 0 {
            return Err(ConfigError::Invalid(
                "env.episode_step_budget must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Constants of the continuous arena the bridge drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Grid size the policy was trained on; observations clamp to `[0, grid_size - 1]`.
    pub grid_size: i32,
    pub arena_half_extent: f32,
    pub grid_scale: f32,
    pub pursuer_speed: f32,
    /// Horizontal clamp applied to the pursuer after each frame. Independent of the grid clamp.
    pub pursuer_bound: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            arena_half_extent: 25.0,
            grid_scale: 5.0,
            pursuer_speed: 3.0,
            pursuer_bound: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    pub learning_rate: f32,
    pub gamma: f32,
    pub epsilon_start: f32,
    pub epsilon_end: f32,
    /// Multiplicative decay applied after every update.
    pub epsilon_decay: f32,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub total_timesteps: u64,
    /// Vectorised steps collected between learner updates.
    pub rollout_steps: usize,
    pub max_episodes: Option<u64>,
    pub num_envs: usize,
    pub seed: Option<u64>,
    pub render_freq: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            total_timesteps: 10_000,
            rollout_steps: 2048,
            max_episodes: None,
            num_envs: 1,
            seed: None,
            render_freq: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub env: EnvConfig,
    pub bridge: BridgeConfig,
    pub learner: LearnerConfig,
    pub train: TrainConfig,
}

impl Config {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        self.env.validate()?;
        if self.bridge.grid_size < 2 {
            return invalid("bridge.grid_size must be at least 2");
        }
        if !(self.bridge.grid_scale > 0.0) {
            return invalid("bridge.grid_scale must be positive");
        }
        if !(self.bridge.pursuer_bound > 0.0) {
            return invalid("bridge.pursuer_bound must be positive");
        }
        let l = &self.learner;
        if !(l.learning_rate > 0.0 && l.learning_rate <= 1.0) {
            return invalid("learner.learning_rate must be in (0, 1]");
        }
        if !(0.0..=1.0).contains(&l.gamma) {
            return invalid("learner.gamma must be in [0, 1]");
        }
        if !(0.0 <= l.epsilon_end && l.epsilon_end <= l.epsilon_start && l.epsilon_start <= 1.0) {
            return invalid("learner epsilons must satisfy 0 <= end <= start <= 1");
        }
        if self.train.rollout_steps == 0 {
            return invalid("train.rollout_steps must be at least 1");
        }
        if self.train.num_envs == 0 {
            return invalid("train.num_envs must be at least 1");
        }
        Ok(())
    }
}
