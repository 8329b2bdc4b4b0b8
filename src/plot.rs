//! Live preview of the policy being trained.

use crate::env::{Env, rollout};
use crate::policy::Policy;

pub trait Plotter<E: Env, P>: Send {
    fn init(&mut self, env: &E, policy: &P);
    fn update(&mut self, policy: &P, max_path_length: usize);
    fn close(&mut self) {}
}

/// Headless plotter: replays one episode with the committed policy on a
/// private copy of the env and logs how it went.
#[derive(Debug)]
pub struct RolloutPlotter<E> {
    env: Option<E>,
    last_return: Option<f64>,
    updates: usize,
}

impl<E> RolloutPlotter<E> {
    pub fn new() -> Self {
        Self {
            env: None,
            last_return: None,
            updates: 0,
        }
    }

    pub fn last_return(&self) -> Option<f64> {
        self.last_return
    }

    pub fn updates(&self) -> usize {
        self.updates
    }
}

impl<E> Default for RolloutPlotter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, P> Plotter<E, P> for RolloutPlotter<E>
where
    E: Env + Clone,
    P: Policy<E::Obs, E::Act> + Clone,
{
    fn init(&mut self, env: &E, _policy: &P) {
        self.env = Some(env.clone());
    }

    fn update(&mut self, policy: &P, max_path_length: usize) {
        let Some(env) = self.env.as_mut() else {
            tracing::warn!("plotter updated before init");
            return;
        };
        let mut policy = policy.clone();
        match rollout(env, &mut policy, max_path_length, 1.0) {
            Ok(path) => {
                self.updates += 1;
                self.last_return = Some(path.undiscounted_return);
                tracing::info!(
                    steps = path.len(),
                    undiscounted_return = path.undiscounted_return,
                    "policy preview"
                );
            }
            Err(err) => tracing::warn!(error = %err, "policy preview failed"),
        }
    }

    fn close(&mut self) {
        if let Some(mut env) = self.env.take() {
            if let Err(err) = env.close() {
                tracing::warn!(error = %err, "closing preview env failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::CartPole;
    use crate::policy::LinearPolicy;

    #[test]
    fn replays_an_episode_per_update() {
        let env = CartPole::with_seed(1);
        let policy = LinearPolicy::new(CartPole::OBS_DIM, CartPole::N_ACTIONS);
        let mut plotter = RolloutPlotter::new();

        Plotter::<CartPole, LinearPolicy>::update(&mut plotter, &policy, 10);
        assert_eq!(plotter.updates(), 0);

        plotter.init(&env, &policy);
        plotter.update(&policy, 5);
        plotter.update(&policy, 5);
        assert_eq!(plotter.updates(), 2);
        let ret = plotter.last_return().unwrap();
        assert!(ret >= 1.0 && ret <= 5.0);

        Plotter::<CartPole, LinearPolicy>::close(&mut plotter);
        assert!(plotter.env.is_none());
    }
}
