use crate::env::{Action, Observation};
use rand::RngCore;
use rand::distributions::{Distribution, WeightedIndex};

/// Auxiliary output of a prediction, kept for importance sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub log_prob: f32,
}

/// A trained decision function over the 4-value observation.
///
/// Implementations are read-only after construction, so one policy can serve
/// a training rollout, an evaluation run and a live frame loop at once.
pub trait Policy: Send + Sync {
    /// Probability of each action, indexed by its encoding. Sums to 1.
    fn action_probabilities(&self, obs: &Observation) -> [f32; Action::COUNT];

    /// The action taken when exploration is off. Defaults to the most likely one.
    fn greedy_action(&self, obs: &Observation) -> Action {
        Action::ALL[argmax(&self.action_probabilities(obs))]
    }

    fn predict_with(
        &self,
        obs: &Observation,
        deterministic: bool,
        rng: &mut dyn RngCore,
    ) -> (Action, Prediction) {
        let probs = self.action_probabilities(obs);
        let action = if deterministic {
            self.greedy_action(obs)
        } else {
            Action::ALL[sample_index(&probs, rng)]
        };
        let log_prob = probs[action.index()].max(f32::MIN_POSITIVE).ln();
        (action, Prediction { log_prob })
    }

    fn predict(&self, obs: &Observation, deterministic: bool) -> (Action, Prediction) {
        self.predict_with(obs, deterministic, &mut rand::thread_rng())
    }
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn action_probabilities(&self, obs: &Observation) -> [f32; Action::COUNT] {
        (**self).action_probabilities(obs)
    }

    fn greedy_action(&self, obs: &Observation) -> Action {
        (**self).greedy_action(obs)
    }
}

impl<P: Policy + ?Sized> Policy for std::sync::Arc<P> {
    fn action_probabilities(&self, obs: &Observation) -> [f32; Action::COUNT] {
        (**self).action_probabilities(obs)
    }

    fn greedy_action(&self, obs: &Observation) -> Action {
        (**self).greedy_action(obs)
    }
}

/// Index of the largest value; ties go to the lowest index.
pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Draws an index in proportion to `probs`. Weights that cannot form a
/// distribution (all zero, negative or non-finite) fall back to [`argmax`].
pub(crate) fn sample_index(probs: &[f32], rng: &mut dyn RngCore) -> usize {
    if probs.iter().any(|p| !p.is_finite()) {
        return argmax(probs);
    }
    match WeightedIndex::new(probs) {
        Ok(dist) => dist.sample(rng),
        Err(_) => argmax(probs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct FixedPolicy([f32; Action::COUNT]);

    impl Policy for FixedPolicy {
        fn action_probabilities(&self, _obs: &Observation) -> [f32; Action::COUNT] {
            self.0
        }
    }

    #[test]
    fn test_argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4, 0.0]), 1);
        assert_eq!(argmax(&[1.0, 1.0]), 0);
    }

    #[test]
    fn test_deterministic_prediction_is_greedy() {
        let policy = FixedPolicy([0.1, 0.1, 0.6, 0.1, 0.1]);
        let obs = Observation([0.0; 4]);

        let (action, prediction) = policy.predict(&obs, true);

        assert_eq!(action, Action::Down);
        assert!((prediction.log_prob - 0.6f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn test_stochastic_prediction_follows_distribution() {
        let policy = FixedPolicy([0.0, 0.0, 0.0, 0.25, 0.75]);
        let obs = Observation([0.0; 4]);
        let mut rng = StdRng::seed_from_u64(5);

        let mut rights = 0;
        for _ in 0..4000 {
            let (action, _) = policy.predict_with(&obs, false, &mut rng);
            assert!(matches!(action, Action::Left | Action::Right));
            if action == Action::Right {
                rights += 1;
            }
        }

        let share = rights as f32 / 4000.0;
        assert!((share - 0.75).abs() < 0.05, "share was {share}");
    }

    #[test]
    fn test_sampling_falls_back_to_argmax_on_broken_weights() {
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(sample_index(&[0.0, 0.0, 0.0], &mut rng), 0);
        assert_eq!(sample_index(&[0.1, f32::NAN, 0.7], &mut rng), 2);
        assert_eq!(sample_index(&[0.2, f32::INFINITY, 0.1], &mut rng), 1);
        assert_eq!(sample_index(&[-1.0, 0.5, 0.3], &mut rng), 1);
        for _ in 0..100 {
            assert_eq!(sample_index(&[0.0, 0.0, 1.0], &mut rng), 2);
        }
    }

    #[test]
    fn test_boxed_and_shared_policies_delegate() {
        let boxed: Box<dyn Policy> = Box::new(FixedPolicy([0.0, 1.0, 0.0, 0.0, 0.0]));
        let shared = std::sync::Arc::new(FixedPolicy([0.0, 0.0, 0.0, 0.0, 1.0]));
        let obs = Observation([0.0; 4]);

        assert_eq!(boxed.predict(&obs, true).0, Action::Up);
        assert_eq!(shared.predict(&obs, true).0, Action::Right);
    }
}
