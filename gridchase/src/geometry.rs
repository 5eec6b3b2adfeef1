//! Distance and reward rules shared by the environment and its tests.

use crate::env::GridPosition;

/// Reward for landing on the target's cell. No shaping term is added on capture.
pub const CAPTURE_REWARD: f32 = 10.0;
/// Gain applied to the change in distance on non-capturing steps.
pub const APPROACH_GAIN: f32 = 2.0;
/// Constant cost of every non-capturing step.
pub const STEP_PENALTY: f32 = 0.1;

/// Euclidean distance between two grid cells.
pub fn euclidean(a: GridPosition, b: GridPosition) -> f32 {
    let dx = (a.x - b.x) as f32;
    let dy = (a.y - b.y) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Reward for a step that did not capture: positive for net approach, negative for retreat.
pub fn shaping_reward(distance_before: f32, distance_after: f32) -> f32 {
    APPROACH_GAIN * (distance_before - distance_after) - STEP_PENALTY
}
