use super::grid::{Action, EpisodeInfo, EpisodeState, GridPosition, Observation};
use super::render::{GridView, Renderer, renderer_for};
use super::traits::Env;
use super::types::{RenderFrame, StepOutcome};
use super::EnvError;
use crate::config::EnvConfig;
use crate::geometry::{CAPTURE_REWARD, euclidean, shaping_reward};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

/// The pursuit task: an agent chases a stationary target on a bounded grid.
pub struct GridPursuitEnv {
    config: EnvConfig,
    rng: StdRng,
    state: Option<EpisodeState>,
    finished: bool,
    renderer: Option<Box<dyn Renderer>>,
}

impl GridPursuitEnv {
    /// Fails if the grid is too small to hold agent and target apart.
    pub fn new(config: EnvConfig) -> Result<Self, EnvError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: EnvConfig, seed: u64) -> Result<Self, EnvError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: EnvConfig, rng: StdRng) -> Result<Self, EnvError> {
        config.validate()?;
        Ok(Self {
            config,
            rng,
            state: None,
            finished: false,
            renderer: None,
        })
    }

    /// Starts an episode from an explicit state instead of a random draw.
    /// Positions must lie on the grid and the step budget must not be spent.
    pub fn from_state(config: EnvConfig, state: EpisodeState) -> Result<Self, EnvError> {
        let mut env = Self::with_seed(config, 0)?;
        let size = env.config.grid_size;
        if !(state.agent.in_bounds(size) && state.target.in_bounds(size)) {
            return Err(EnvError::InvalidState(format!(
                "positions must lie on a {size}x{size} grid"
            )));
        }
        if state.steps_remaining == 0 {
            return Err(EnvError::InvalidState("episode has no steps left".to_string()));
        }
        env.state = Some(state);
        Ok(env)
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn state(&self) -> Option<&EpisodeState> {
        self.state.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn random_cell(&mut self) -> GridPosition {
        let size = self.config.grid_size;
        GridPosition::new(self.rng.gen_range(0..size), self.rng.gen_range(0..size))
    }
}

impl Env for GridPursuitEnv {
    type Obs = Observation;
    type Act = Action;
    type Info = EpisodeInfo;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, EpisodeInfo), EnvError> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        let agent = self.random_cell();
        let mut target = self.random_cell();
        // Only the target is redrawn on collision.
        while target == agent {
            target = self.random_cell();
        }

        let state = EpisodeState {
            agent,
            target,
            steps_remaining: self.config.episode_step_budget,
        };
        debug!(?agent, ?target, "episode reset");
        self.state = Some(state);
        self.finished = false;
        Ok((state.observation(), EpisodeInfo::default()))
    }

    fn step(&mut self, act: Action) -> Result<StepOutcome<Observation, EpisodeInfo>, EnvError> {
        if self.finished {
            return Err(EnvError::EpisodeFinished);
        }
        let state = self.state.as_mut().ok_or(EnvError::NotReset)?;

        let distance_before = euclidean(state.agent, state.target);
        state.agent = state.agent.moved(act, self.config.grid_size);
        let distance_after = euclidean(state.agent, state.target);

        let terminated = state.captured();
        let reward = if terminated {
            CAPTURE_REWARD
        } else {
            shaping_reward(distance_before, distance_after)
        };

        state.steps_remaining = state.steps_remaining.saturating_sub(1);
        let truncated = state.steps_remaining == 0;
        self.finished = terminated || truncated;

        trace!(
            ?act,
            agent = ?state.agent,
            reward,
            terminated,
            truncated,
            steps_remaining = state.steps_remaining,
            "step"
        );

        Ok(StepOutcome {
            obs: state.observation(),
            reward,
            terminated,
            truncated,
            info: EpisodeInfo::default(),
        })
    }

    fn render(&mut self) -> Result<Option<RenderFrame>, EnvError> {
        let Some(state) = self.state else {
            return Err(EnvError::Render("nothing to draw before reset".to_string()));
        };
        if self.renderer.is_none() {
            self.renderer = renderer_for(self.config.render_mode);
        }
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(None);
        };
        let view = GridView {
            grid_size: self.config.grid_size,
            agent: state.agent,
            target: state.target,
            steps_remaining: state.steps_remaining,
        };
        Ok(Some(renderer.draw(&view)))
    }

    fn close(&mut self) -> Result<(), EnvError> {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.teardown();
        }
        Ok(())
    }
}

impl Drop for GridPursuitEnv {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
