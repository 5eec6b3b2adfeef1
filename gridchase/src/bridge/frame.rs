use super::coords::{action_to_movement_vector, world_to_observation_coordinate};
use super::scene::ArenaScene;
use crate::config::BridgeConfig;
use crate::env::{Action, Observation};
use crate::inference::{InferenceError, LoadedPolicy, Policy, load_policy};
use glam::Vec3;
use std::path::Path;
use tracing::trace;

/// Drives the pursuer in a continuous arena with a policy trained on the grid.
///
/// A bridge only exists once its policy is loaded, so a frame update can never
/// run without one. It holds no state besides the policy and its constants,
/// and a frame update never blocks.
pub struct InferenceBridge<P> {
    policy: P,
    config: BridgeConfig,
}

impl InferenceBridge<LoadedPolicy> {
    /// Loads the policy artifact at `path`. Failure here is fatal for the frame loop.
    pub fn load(path: impl AsRef<Path>, config: BridgeConfig) -> Result<Self, InferenceError> {
        let policy = load_policy(path)?;
        if let Some(trained) = policy.grid_size() {
            if trained != config.grid_size {
                return Err(InferenceError::GridMismatch {
                    expected: config.grid_size,
                    got: trained,
                });
            }
        }
        Ok(Self::new(policy, config))
    }
}

impl<P: Policy> InferenceBridge<P> {
    pub fn new(policy: P, config: BridgeConfig) -> Self {
        Self { policy, config }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// `[pursuer_x, pursuer_z, target_x, target_z]`, matching the training layout
    /// `[agent, target]`. World Y is ignored.
    pub fn observe(&self, pursuer: Vec3, target: Vec3) -> Observation {
        let map = |v: f32| world_to_observation_coordinate(v, &self.config);
        Observation([map(pursuer.x), map(pursuer.z), map(target.x), map(target.z)])
    }

    pub fn decide<S: ArenaScene + ?Sized>(&self, scene: &S) -> Action {
        let obs = self.observe(scene.pursuer_position(), scene.target_position());
        self.policy.predict(&obs, true).0
    }

    /// One tick of the live loop: observe, act, move the pursuer, clamp it to the arena.
    pub fn per_frame_update<S: ArenaScene + ?Sized>(&self, scene: &mut S, delta_time: f32) {
        let action = self.decide(scene);
        let movement = action_to_movement_vector(u8::from(action) as i64)
            * self.config.pursuer_speed
            * delta_time;

        let bound = self.config.pursuer_bound;
        let mut next = scene.pursuer_position() + movement;
        next.x = next.x.clamp(-bound, bound);
        next.z = next.z.clamp(-bound, bound);
        scene.set_pursuer_position(next);

        trace!(?action, x = next.x, z = next.z, "pursuer moved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::scene::SimulatedArena;
    use crate::inference::{PolicyArtifact, TabularPolicy, save_policy};
    use tempfile::TempDir;

    struct Always(Action);

    impl Policy for Always {
        fn action_probabilities(&self, _obs: &Observation) -> [f32; Action::COUNT] {
            let mut probs = [0.0; Action::COUNT];
            probs[self.0.index()] = 1.0;
            probs
        }
    }

    // Closes the larger axis gap first; stays once within a twentieth of a cell.
    struct AxisChaser;

    impl Policy for AxisChaser {
        fn action_probabilities(&self, obs: &Observation) -> [f32; Action::COUNT] {
            let (ax, ay) = obs.agent();
            let (tx, ty) = obs.target();
            let (dx, dy) = (tx - ax, ty - ay);
            let action = if dx.abs() < 0.05 && dy.abs() < 0.05 {
                Action::Stay
            } else if dx.abs() >= dy.abs() {
                if dx > 0.0 { Action::Right } else { Action::Left }
            } else if dy > 0.0 {
                Action::Up
            } else {
                Action::Down
            };
            Always(action).action_probabilities(obs)
        }
    }

    #[test]
    fn test_observation_order_is_pursuer_then_target() {
        let bridge = InferenceBridge::new(Always(Action::Stay), BridgeConfig::default());

        let obs = bridge.observe(Vec3::new(0.0, 7.0, -12.5), Vec3::new(12.5, -3.0, 25.0));

        assert_eq!(obs, Observation([5.0, 2.5, 7.5, 9.0]));
    }

    #[test]
    fn test_frame_update_moves_by_speed_times_delta() {
        // Arrange
        let bridge = InferenceBridge::new(Always(Action::Up), BridgeConfig::default());
        let mut arena = SimulatedArena::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO);

        // Act
        bridge.per_frame_update(&mut arena, 0.5);

        // Assert
        assert_eq!(arena.pursuer_position(), Vec3::new(1.0, 2.0, 4.5));
    }

    #[test]
    fn test_stay_leaves_pursuer_in_place() {
        let bridge = InferenceBridge::new(Always(Action::Stay), BridgeConfig::default());
        let mut arena = SimulatedArena::new(Vec3::new(-4.0, 1.0, 9.0), Vec3::ZERO);

        bridge.per_frame_update(&mut arena, 0.016);

        assert_eq!(arena.pursuer_position(), Vec3::new(-4.0, 1.0, 9.0));
    }

    #[test]
    fn test_pursuer_clamped_to_arena_bound() {
        let bridge = InferenceBridge::new(Always(Action::Right), BridgeConfig::default());
        let mut arena = SimulatedArena::new(Vec3::new(23.9, 0.0, -30.0), Vec3::ZERO);

        bridge.per_frame_update(&mut arena, 1.0);

        // Both horizontal axes clamp, even the one that did not move.
        assert_eq!(arena.pursuer_position(), Vec3::new(24.0, 0.0, -24.0));
    }

    #[test]
    fn test_pursuer_closes_on_still_target() {
        let bridge = InferenceBridge::new(AxisChaser, BridgeConfig::default());
        let mut arena = SimulatedArena::new(Vec3::new(0.0, 2.0, 15.0), Vec3::new(-10.0, 0.0, -10.0));
        let start = arena.separation();

        for _ in 0..1200 {
            bridge.per_frame_update(&mut arena, 1.0 / 60.0);
        }

        assert!(start > 25.0);
        assert!(arena.separation() < 0.5, "separation {}", arena.separation());
        assert_eq!(arena.pursuer_position().y, 2.0);
    }

    #[test]
    fn test_load_rejects_policy_for_other_grid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("policy.json");
        let artifact = PolicyArtifact::new(LoadedPolicy::Tabular(TabularPolicy::zeros(4, 0.0).unwrap()));
        save_policy(&path, &artifact).unwrap();

        let result = InferenceBridge::load(&path, BridgeConfig::default());

        assert!(matches!(
            result,
            Err(InferenceError::GridMismatch { expected: 10, got: 4 })
        ));
    }

    #[test]
    fn test_load_fails_for_missing_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");
        assert!(InferenceBridge::load(&path, BridgeConfig::default()).is_err());
    }
}
