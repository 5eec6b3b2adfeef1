//! On-disk format for trained policies.
//!
//! An artifact records the action encoding it was trained with; loading
//! refuses any artifact whose encoding differs from [`Action::ENCODING`].

use super::errors::InferenceError;
use super::mlp::MlpPolicy;
use super::tabular::TabularPolicy;
use super::traits::Policy;
use crate::env::{Action, Observation};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const FORMAT_VERSION: u32 = 1;

/// A policy as it comes out of an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadedPolicy {
    Tabular(TabularPolicy),
    Mlp(MlpPolicy),
}

impl LoadedPolicy {
    /// Grid the policy is tied to, if its representation depends on one.
    pub fn grid_size(&self) -> Option<i32> {
        match self {
            LoadedPolicy::Tabular(policy) => Some(policy.grid_size()),
            LoadedPolicy::Mlp(_) => None,
        }
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        match self {
            LoadedPolicy::Tabular(policy) => policy.validate(),
            LoadedPolicy::Mlp(policy) => policy.validate(),
        }
    }
}

impl Policy for LoadedPolicy {
    fn action_probabilities(&self, obs: &Observation) -> [f32; Action::COUNT] {
        match self {
            LoadedPolicy::Tabular(policy) => policy.action_probabilities(obs),
            LoadedPolicy::Mlp(policy) => policy.action_probabilities(obs),
        }
    }

    fn greedy_action(&self, obs: &Observation) -> Action {
        match self {
            LoadedPolicy::Tabular(policy) => policy.greedy_action(obs),
            LoadedPolicy::Mlp(policy) => policy.greedy_action(obs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyArtifact {
    pub format_version: u32,
    pub action_encoding: Vec<String>,
    pub policy: LoadedPolicy,
}

impl PolicyArtifact {
    pub fn new(policy: LoadedPolicy) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            action_encoding: Action::ENCODING.iter().map(|s| s.to_string()).collect(),
            policy,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, InferenceError> {
        let artifact: PolicyArtifact = serde_json::from_str(raw)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.format_version != FORMAT_VERSION {
            return Err(InferenceError::UnsupportedFormat(self.format_version));
        }
        if self.action_encoding.iter().map(String::as_str).ne(Action::ENCODING) {
            return Err(InferenceError::EncodingMismatch {
                found: self.action_encoding.clone(),
            });
        }
        self.policy.validate()
    }
}

/// Reads and validates a policy artifact. Any error here should stop startup.
pub fn load_policy(path: impl AsRef<Path>) -> Result<LoadedPolicy, InferenceError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| InferenceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let artifact = PolicyArtifact::from_json_str(&raw)?;
    info!(path = %path.display(), kind = kind_name(&artifact.policy), "policy loaded");
    Ok(artifact.policy)
}

pub fn save_policy(path: impl AsRef<Path>, artifact: &PolicyArtifact) -> Result<(), InferenceError> {
    let path = path.as_ref();
    artifact.validate()?;
    let raw = serde_json::to_string(artifact)?;
    std::fs::write(path, raw).map_err(|source| InferenceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), "policy saved");
    Ok(())
}

fn kind_name(policy: &LoadedPolicy) -> &'static str {
    match policy {
        LoadedPolicy::Tabular(_) => "tabular",
        LoadedPolicy::Mlp(_) => "mlp",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::mlp::{Activation, DenseLayer};
    use tempfile::TempDir;

    fn tiny_mlp() -> MlpPolicy {
        MlpPolicy {
            activation: Activation::Relu,
            layers: vec![DenseLayer {
                weights: vec![vec![0.0; 4]; 5],
                bias: vec![0.0, 1.0, 0.0, 0.0, 0.0],
            }],
        }
    }

    #[test]
    fn test_saved_tabular_policy_loads_back() {
        // Arrange
        let mut table = TabularPolicy::zeros(3, 0.0).unwrap();
        let obs = Observation([0.0, 0.0, 2.0, 0.0]);
        table.q_mut(&obs)[Action::Right.index()] = 1.5;
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("policy.json");

        // Act
        save_policy(&path, &PolicyArtifact::new(LoadedPolicy::Tabular(table.clone()))).unwrap();
        let loaded = load_policy(&path).unwrap();

        // Assert
        assert_eq!(loaded, LoadedPolicy::Tabular(table));
        assert_eq!(loaded.grid_size(), Some(3));
        assert_eq!(loaded.predict(&obs, true).0, Action::Right);
    }

    #[test]
    fn test_mlp_artifact_parses_from_json() {
        let raw = r#"{
            "format_version": 1,
            "action_encoding": ["stay", "up", "down", "left", "right"],
            "policy": {
                "kind": "mlp",
                "layers": [{ "weights": [[0,0,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,0]],
                             "bias": [0, 0, 2, 0, 0] }]
            }
        }"#;

        let artifact = PolicyArtifact::from_json_str(raw).unwrap();

        assert_eq!(artifact.policy.grid_size(), None);
        assert_eq!(
            artifact.policy.predict(&Observation([0.0; 4]), true).0,
            Action::Down
        );
    }

    #[test]
    fn test_reordered_encoding_is_refused() {
        let mut artifact = PolicyArtifact::new(LoadedPolicy::Mlp(tiny_mlp()));
        artifact.action_encoding.swap(1, 2);
        let raw = serde_json::to_string(&artifact).unwrap();

        let result = PolicyArtifact::from_json_str(&raw);

        assert!(matches!(result, Err(InferenceError::EncodingMismatch { .. })));
    }

    #[test]
    fn test_unknown_format_version_is_refused() {
        let mut artifact = PolicyArtifact::new(LoadedPolicy::Mlp(tiny_mlp()));
        artifact.format_version = 7;
        let raw = serde_json::to_string(&artifact).unwrap();

        assert!(matches!(
            PolicyArtifact::from_json_str(&raw),
            Err(InferenceError::UnsupportedFormat(7))
        ));
    }

    #[test]
    fn test_missing_and_corrupt_files_fail() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(load_policy(&missing), Err(InferenceError::Io { .. })));

        let corrupt = temp_dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "PK\u{3}\u{4} not json").unwrap();
        assert!(matches!(load_policy(&corrupt), Err(InferenceError::Parse(_))));
    }

    #[test]
    fn test_oversized_tabular_grid_is_an_error() {
        let raw = r#"{
            "format_version": 1,
            "action_encoding": ["stay", "up", "down", "left", "right"],
            "policy": { "kind": "tabular", "grid_size": 70000, "epsilon": 0.0, "q_values": [] }
        }"#;

        let result = PolicyArtifact::from_json_str(raw);

        assert!(matches!(result, Err(InferenceError::InvalidPolicy(_))));
    }
}
