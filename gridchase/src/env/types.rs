use serde::{Deserialize, Serialize};

/// What a single [`Env::step`](super::Env::step) call reports.
///
/// `terminated` and `truncated` are independent: the last step of a budget can
/// capture and run out of time at once, and both flags are reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome<O, I> {
    pub obs: O,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: I,
}

impl<O, I> StepOutcome<O, I> {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step<O, A> {
    pub obs: O,
    pub act: A,
    pub rew: f32,
    pub next_obs: O,
    pub terminated: bool,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryShard<O, A> {
    /// Episode id; segments of one episode flushed in different rollouts share it.
    pub id: String,
    pub steps: Vec<Step<O, A>>,
    pub version: u64,
    pub rollout_probs: Option<Vec<f32>>, // log-probs of the sampled actions
}

/// A frame produced by the visualization collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderFrame {
    Text(String),
}

impl RenderFrame {
    pub fn as_text(&self) -> &str {
        match self {
            RenderFrame::Text(text) => text,
        }
    }
}
