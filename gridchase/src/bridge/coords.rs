use crate::config::BridgeConfig;
use crate::env::Action;
use glam::Vec3;

/// Maps one horizontal world axis onto the observation scale the policy was trained on.
///
/// The result is continuous in `[0, grid_size - 1]` and is not snapped to
/// cells, although training only ever produced integers.
/// Out-of-arena inputs are absorbed by the clamp.
pub fn world_to_observation_coordinate(world_axis_value: f32, config: &BridgeConfig) -> f32 {
    let max = (config.grid_size - 1) as f32;
    ((world_axis_value + config.arena_half_extent) / config.grid_scale).clamp(0.0, max)
}

/// Unit movement for an encoded action. Unknown encodings move nowhere.
pub fn action_to_movement_vector(action: i64) -> Vec3 {
    Action::from_index(action).map_or(Vec3::ZERO, Action::movement_vector)
}
