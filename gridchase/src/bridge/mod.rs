mod coords;
mod frame;
mod scene;

pub use coords::{action_to_movement_vector, world_to_observation_coordinate};
pub use frame::InferenceBridge;
pub use scene::{ArenaScene, SimulatedArena, TargetMotion};
