use crate::env::errors::EnvError;
use crate::env::types::{RenderFrame, StepOutcome};

/// The reset/step contract every training or evaluation driver relies on.
///
/// Implementors own their episode state outright. Calling [`Env::step`] after an
/// episode has terminated or been truncated must fail until [`Env::reset`] is
/// called again; an environment never resets itself behind the caller's back.
pub trait Env: Send {
    type Obs: Send + Clone + 'static;
    type Act: Send + Clone + 'static;
    type Info: Send + Clone + 'static;

    /// Starts a new episode. A seed makes the episode reproducible.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Self::Obs, Self::Info), EnvError>;
    fn step(&mut self, act: Self::Act) -> Result<StepOutcome<Self::Obs, Self::Info>, EnvError>;

    /// Draws the current state through the visualization collaborator, if one is configured.
    fn render(&mut self) -> Result<Option<RenderFrame>, EnvError> {
        Ok(None)
    }

    fn close(&mut self) -> Result<(), EnvError>;
}
