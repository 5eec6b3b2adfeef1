mod errors;
mod grid;
mod pursuit;
mod render;
mod traits;
mod types;
mod vec_env;

pub use errors::EnvError;
pub use grid::{Action, EpisodeInfo, EpisodeState, GridPosition, Observation};
pub use pursuit::GridPursuitEnv;
pub use render::{GridView, Renderer, TextRenderer};
pub use traits::Env;
pub use types::{RenderFrame, Step, StepOutcome, TrajectoryShard};
pub use vec_env::VecEnv;
