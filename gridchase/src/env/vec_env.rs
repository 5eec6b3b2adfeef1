use super::types::{RenderFrame, StepOutcome};
use super::{Env, EnvError};

/// A fixed batch of independent environments stepped in lockstep.
///
/// Finished members are not reset automatically; the driver resets each one
/// with [`VecEnv::reset_at`] once it has consumed the final step.
pub struct VecEnv<E> {
    envs: Vec<E>,
}

impl<E: Env> VecEnv<E> {
    pub fn new<F>(make_env: F, num_envs: usize) -> Self
    where
        F: FnMut(usize) -> E,
    {
        let envs = (0..num_envs).map(make_env).collect();
        Self { envs }
    }

    /// Like [`VecEnv::new`] for fallible constructors; the first error wins.
    pub fn try_new<F>(make_env: F, num_envs: usize) -> Result<Self, EnvError>
    where
        F: FnMut(usize) -> Result<E, EnvError>,
    {
        let envs = (0..num_envs).map(make_env).collect::<Result<_, _>>()?;
        Ok(Self { envs })
    }

    pub fn from_envs(envs: Vec<E>) -> Self {
        Self { envs }
    }

    pub fn len(&self) -> usize {
        self.envs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }

    /// Resets every member; member `i` gets `seed + i` when a seed is given.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<Vec<E::Obs>, EnvError> {
        self.envs
            .iter_mut()
            .enumerate()
            .map(|(i, env)| {
                let seed = seed.map(|s| s.wrapping_add(i as u64));
                env.reset(seed).map(|(obs, _)| obs)
            })
            .collect()
    }

    pub fn reset_at(&mut self, index: usize, seed: Option<u64>) -> Result<E::Obs, EnvError> {
        let env = self.envs.get_mut(index).ok_or(EnvError::NoSuchEnv(index))?;
        env.reset(seed).map(|(obs, _)| obs)
    }

    pub fn step(
        &mut self,
        actions: Vec<E::Act>,
    ) -> Result<Vec<StepOutcome<E::Obs, E::Info>>, EnvError> {
        if actions.len() != self.envs.len() {
            return Err(EnvError::BatchMismatch {
                expected: self.envs.len(),
                got: actions.len(),
            });
        }

        self.envs
            .iter_mut()
            .zip(actions)
            .map(|(env, action)| env.step(action))
            .collect()
    }

    pub fn render_at(&mut self, index: usize) -> Result<Option<RenderFrame>, EnvError> {
        let env = self.envs.get_mut(index).ok_or(EnvError::NoSuchEnv(index))?;
        env.render()
    }

    pub fn close(&mut self) -> Result<(), EnvError> {
        for env in &mut self.envs {
            env.close()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counts steps and finishes after three of them.
    struct CountingEnv {
        count: u32,
        closed: bool,
    }

    impl Env for CountingEnv {
        type Obs = u32;
        type Act = u32;
        type Info = ();

        fn reset(&mut self, seed: Option<u64>) -> Result<(u32, ()), EnvError> {
            self.count = seed.unwrap_or(0) as u32;
            Ok((self.count, ()))
        }

        fn step(&mut self, act: u32) -> Result<StepOutcome<u32, ()>, EnvError> {
            self.count += act;
            Ok(StepOutcome {
                obs: self.count,
                reward: 1.0,
                terminated: false,
                truncated: self.count >= 3,
                info: (),
            })
        }

        fn close(&mut self) -> Result<(), EnvError> {
            self.closed = true;
            Ok(())
        }
    }

    fn batch(n: usize) -> VecEnv<CountingEnv> {
        VecEnv::new(|_| CountingEnv { count: 0, closed: false }, n)
    }

    #[test]
    fn test_reset_offsets_seed_per_member() {
        let mut envs = batch(3);
        assert_eq!(envs.reset(Some(10)).unwrap(), vec![10, 11, 12]);
        assert_eq!(envs.reset(None).unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn test_step_rejects_wrong_action_count() {
        let mut envs = batch(2);
        envs.reset(None).unwrap();

        let result = envs.step(vec![1]);

        assert!(matches!(
            result,
            Err(EnvError::BatchMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_members_step_independently() {
        let mut envs = batch(2);
        envs.reset(None).unwrap();

        let outcomes = envs.step(vec![1, 3]).unwrap();

        assert_eq!(outcomes[0].obs, 1);
        assert!(!outcomes[0].done());
        assert!(outcomes[1].done());
        assert_eq!(envs.reset_at(1, None).unwrap(), 0);
        assert!(matches!(envs.reset_at(5, None), Err(EnvError::NoSuchEnv(5))));
    }

    #[test]
    fn test_try_new_stops_at_first_failure() {
        let built = VecEnv::try_new(|_| Ok(CountingEnv { count: 0, closed: false }), 3).unwrap();
        assert_eq!(built.len(), 3);

        let failed = VecEnv::try_new(
            |i| {
                if i == 1 {
                    Err(EnvError::NoSuchEnv(i))
                } else {
                    Ok(CountingEnv { count: 0, closed: false })
                }
            },
            3,
        );
        assert!(matches!(failed, Err(EnvError::NoSuchEnv(1))));
    }

    #[test]
    fn test_close_reaches_every_member() {
        let mut envs = batch(2);
        envs.close().unwrap();
        assert!(envs.envs.iter().all(|e| e.closed));
        assert_eq!(envs.render_at(0).unwrap(), None);
    }
}
