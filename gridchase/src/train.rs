use crate::config::TrainConfig;
use crate::env::{Action, Env, EnvError, Observation, RenderFrame, Step, VecEnv};
use crate::inference::Policy;
use crate::learner::{Learner, LearnerError, PolicyVersion, PursuitShard};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TrainError {
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error(transparent)]
    Learner(#[from] LearnerError),
    #[error("no environments to train on")]
    NoEnvironments,
}

#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Environment steps taken. Whole vectorised steps only, so this can pass
    /// `total_timesteps` by up to `num_envs - 1`.
    pub total_steps: u64,
    pub total_episodes: u64,
    pub captures: u64,
    pub final_version: u64,
    /// Mean undiscounted return over completed episodes.
    pub mean_return: f32,
    pub training_time: Duration,
}

/// What an observer sees after each vectorised step.
pub struct CallbackContext<'a, E> {
    /// Number of vectorised steps taken so far.
    pub n_calls: u64,
    /// Environment steps taken so far, across all members.
    pub num_timesteps: u64,
    pub envs: &'a mut VecEnv<E>,
}

/// Observer registered with the training loop. It never takes part in the
/// environment's own transitions.
pub trait Callback<E: Env>: Send {
    /// Return `false` to stop training after the current step.
    fn on_step(&mut self, ctx: &mut CallbackContext<'_, E>) -> Result<bool, EnvError>;

    fn on_rollout_end(&mut self, _version: &PolicyVersion) {}
}

/// Renders the first environment every `render_freq` calls.
pub struct RenderCallback<F> {
    render_freq: u64,
    on_frame: F,
    frames: u64,
}

impl<F> RenderCallback<F>
where
    F: FnMut(&RenderFrame) + Send,
{
    pub fn new(render_freq: u64, on_frame: F) -> Self {
        Self {
            render_freq,
            on_frame,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl<E, F> Callback<E> for RenderCallback<F>
where
    E: Env,
    F: FnMut(&RenderFrame) + Send,
{
    fn on_step(&mut self, ctx: &mut CallbackContext<'_, E>) -> Result<bool, EnvError> {
        if self.render_freq > 0 && ctx.n_calls % self.render_freq == 0 {
            if let Some(frame) = ctx.envs.render_at(0)? {
                (self.on_frame)(&frame);
                self.frames += 1;
            }
        }
        Ok(true)
    }
}

// Experience of one environment's current episode not yet handed to the learner.
struct EpisodeBuffer {
    id: Uuid,
    steps: Vec<Step<Observation, Action>>,
    log_probs: Vec<f32>,
    episode_return: f32,
}

impl EpisodeBuffer {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            steps: Vec::new(),
            log_probs: Vec::new(),
            episode_return: 0.0,
        }
    }

    fn push(&mut self, step: Step<Observation, Action>, log_prob: f32) {
        self.episode_return += step.rew;
        self.steps.push(step);
        self.log_probs.push(log_prob);
    }

    fn flush(&mut self, version: u64) -> Option<PursuitShard> {
        if self.steps.is_empty() {
            return None;
        }
        Some(PursuitShard {
            id: self.id.to_string(),
            steps: std::mem::take(&mut self.steps),
            version,
            rollout_probs: Some(std::mem::take(&mut self.log_probs)),
        })
    }

    /// Closes the episode; the buffer starts a fresh one.
    fn finish(&mut self, version: u64) -> (Option<PursuitShard>, f32) {
        let shard = self.flush(version);
        let episode_return = self.episode_return;
        *self = Self::new();
        (shard, episode_return)
    }
}

/// Alternates rollouts with learner updates until the step or episode budget runs out.
///
/// The budget is checked before each vectorised step, which always steps every
/// member; the final count may exceed `total_timesteps` when `envs.len()` does
/// not divide it.
pub async fn train<E, L>(
    envs: &mut VecEnv<E>,
    learner: &mut L,
    cfg: &TrainConfig,
    callbacks: &mut [Box<dyn Callback<E>>],
) -> Result<TrainingStats, TrainError>
where
    E: Env<Obs = Observation, Act = Action>,
    L: Learner,
{
    if envs.is_empty() {
        return Err(TrainError::NoEnvironments);
    }

    let started = Instant::now();
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let num_envs = envs.len();
    let mut obs = envs.reset(cfg.seed)?;
    let mut buffers: Vec<EpisodeBuffer> = (0..num_envs).map(|_| EpisodeBuffer::new()).collect();

    let mut total_steps = 0u64;
    let mut total_episodes = 0u64;
    let mut captures = 0u64;
    let mut return_sum = 0.0f32;
    let mut n_calls = 0u64;
    let mut version = 0u64;
    let mut stopped = false;

    let budget_left = |steps: u64, episodes: u64| {
        steps < cfg.total_timesteps && cfg.max_episodes.is_none_or(|max| episodes < max)
    };

    while !stopped && budget_left(total_steps, total_episodes) {
        let policy = learner.policy();
        let mut shards = Vec::new();

        for _ in 0..cfg.rollout_steps {
            if !budget_left(total_steps, total_episodes) {
                break;
            }

            let mut actions = Vec::with_capacity(num_envs);
            let mut log_probs = Vec::with_capacity(num_envs);
            for o in &obs {
                let (action, prediction) = policy.predict_with(o, false, &mut rng);
                actions.push(action);
                log_probs.push(prediction.log_prob);
            }

            let outcomes = envs.step(actions.clone())?;
            for (i, outcome) in outcomes.into_iter().enumerate() {
                let done = outcome.done();
                buffers[i].push(
                    Step {
                        obs: obs[i],
                        act: actions[i],
                        rew: outcome.reward,
                        next_obs: outcome.obs,
                        terminated: outcome.terminated,
                        truncated: outcome.truncated,
                    },
                    log_probs[i],
                );

                if done {
                    let (shard, episode_return) = buffers[i].finish(version);
                    shards.extend(shard);
                    total_episodes += 1;
                    captures += u64::from(outcome.terminated);
                    return_sum += episode_return;
                    obs[i] = envs.reset_at(i, None)?;
                } else {
                    obs[i] = outcome.obs;
                }
            }

            total_steps += num_envs as u64;
            n_calls += 1;

            let mut ctx = CallbackContext {
                n_calls,
                num_timesteps: total_steps,
                envs: &mut *envs,
            };
            for callback in callbacks.iter_mut() {
                if !callback.on_step(&mut ctx)? {
                    stopped = true;
                }
            }
            if stopped {
                warn!(n_calls, "training stopped by callback");
                break;
            }
        }

        shards.extend(buffers.iter_mut().filter_map(|b| b.flush(version)));
        if shards.is_empty() {
            break;
        }
        learner.submit(shards).await?;
        let new_version = learner.update().await?;
        version = new_version.id;
        for callback in callbacks.iter_mut() {
            callback.on_rollout_end(&new_version);
        }

        info!(
            version,
            total_steps,
            total_episodes,
            captures,
            "rollout complete"
        );
    }

    let mean_return = if total_episodes == 0 {
        0.0
    } else {
        return_sum / total_episodes as f32
    };

    Ok(TrainingStats {
        total_steps,
        total_episodes,
        captures,
        final_version: version,
        mean_return,
        training_time: started.elapsed(),
    })
}
