use thiserror::Error;

use super::{Env, EnvError, Rollout};
use crate::policy::{Policy, PolicyError};

#[derive(Error, Debug)]
pub enum RolloutError {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Run one episode with `policy` until the env reports done or
/// `max_path_length` steps have been taken.
pub fn rollout<E, P>(
    env: &mut E,
    policy: &mut P,
    max_path_length: usize,
    discount: f64,
) -> Result<Rollout<E::Obs, E::Act>, RolloutError>
where
    E: Env,
    P: Policy<E::Obs, E::Act> + ?Sized,
{
    let mut observations = Vec::new();
    let mut actions = Vec::new();
    let mut rewards = Vec::new();

    let mut obs = env.reset()?;
    policy.reset();
    while rewards.len() < max_path_length {
        let action = policy.get_action(&obs)?;
        let (next_obs, reward, done) = env.step(action.clone())?;
        observations.push(obs);
        actions.push(action);
        rewards.push(reward);
        if done {
            break;
        }
        obs = next_obs;
    }

    Ok(Rollout::new(observations, actions, rewards, discount))
}
