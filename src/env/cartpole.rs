//! Classic cart-pole balancing task.
//!
//! A pole is hinged on a cart moving along a frictionless track; the agent
//! pushes the cart left (action 0) or right (action 1) and earns a reward of 1
//! for every step the pole stays upright and the cart stays on the track.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Env, EnvError};

const GRAVITY: f64 = 9.8;
const MASS_CART: f64 = 1.0;
const MASS_POLE: f64 = 0.1;
const TOTAL_MASS: f64 = MASS_CART + MASS_POLE;
const HALF_POLE_LENGTH: f64 = 0.5;
const POLE_MASS_LENGTH: f64 = MASS_POLE * HALF_POLE_LENGTH;
const FORCE_MAG: f64 = 10.0;
const TAU: f64 = 0.02;
const THETA_THRESHOLD: f64 = 12.0 * 2.0 * std::f64::consts::PI / 360.0;
const X_THRESHOLD: f64 = 2.4;

#[derive(Debug, Clone)]
pub struct CartPole {
    // [x, x_dot, theta, theta_dot]
    state: [f64; 4],
    done: bool,
    rng: StdRng,
}

impl CartPole {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Factory for `Cem::new`: the n-th env it builds is seeded with
    /// `base + n`, so every worker gets a distinct but reproducible stream.
    pub fn seeded_sequence(base: u64) -> impl Fn() -> Self + Send + Sync {
        let next = AtomicU64::new(base);
        move || Self::with_seed(next.fetch_add(1, Ordering::Relaxed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            state: [0.0; 4],
            done: true,
            rng,
        }
    }

    pub const OBS_DIM: usize = 4;
    pub const N_ACTIONS: usize = 2;

    fn observation(&self) -> Vec<f64> {
        self.state.to_vec()
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new()
    }
}

impl Env for CartPole {
    type Obs = Vec<f64>;
    type Act = usize;

    fn reset(&mut self) -> Result<Self::Obs, EnvError> {
        for s in self.state.iter_mut() {
            *s = self.rng.gen_range(-0.05..0.05);
        }
        self.done = false;
        Ok(self.observation())
    }

    fn step(&mut self, act: Self::Act) -> Result<(Self::Obs, f64, bool), EnvError> {
        if self.done {
            return Err(EnvError::NeedsReset);
        }
        let force = match act {
            0 => -FORCE_MAG,
            1 => FORCE_MAG,
            other => {
                return Err(EnvError::InvalidAction(format!(
                    "cart-pole expects 0 or 1, got {other}"
                )));
            }
        };

        let [x, x_dot, theta, theta_dot] = self.state;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let temp = (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (HALF_POLE_LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        self.state = [
            x + TAU * x_dot,
            x_dot + TAU * x_acc,
            theta + TAU * theta_dot,
            theta_dot + TAU * theta_acc,
        ];

        let [x, _, theta, _] = self.state;
        self.done = !(-X_THRESHOLD..=X_THRESHOLD).contains(&x)
            || !(-THETA_THRESHOLD..=THETA_THRESHOLD).contains(&theta);

        Ok((self.observation(), 1.0, self.done))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_starts_near_upright() {
        let mut env = CartPole::with_seed(3);
        let obs = env.reset().unwrap();
        assert_eq!(obs.len(), CartPole::OBS_DIM);
        assert!(obs.iter().all(|v| v.abs() <= 0.05));
    }

    #[test]
    fn constant_push_eventually_falls() {
        let mut env = CartPole::with_seed(11);
        env.reset().unwrap();
        let mut steps = 0;
        loop {
            let (_, reward, done) = env.step(1).unwrap();
            assert_eq!(reward, 1.0);
            steps += 1;
            if done {
                break;
            }
            assert!(steps < 500, "pole never fell");
        }
        assert!(matches!(env.step(1), Err(EnvError::NeedsReset)));
    }

    #[test]
    fn rejects_unknown_action() {
        let mut env = CartPole::with_seed(0);
        env.reset().unwrap();
        assert!(matches!(env.step(2), Err(EnvError::InvalidAction(_))));
    }

    #[test]
    fn seeded_sequence_repeats_across_factories() {
        let first = CartPole::seeded_sequence(7);
        let second = CartPole::seeded_sequence(7);
        let a: Vec<_> = (0..3).map(|_| first().reset().unwrap()).collect();
        let b: Vec<_> = (0..3).map(|_| second().reset().unwrap()).collect();
        assert_eq!(a, b);
        assert_ne!(a[0], a[1]);
        assert_eq!(a[2], CartPole::with_seed(9).reset().unwrap());
    }

    #[test]
    fn seeded_envs_are_reproducible() {
        let a = CartPole::with_seed(42).reset().unwrap();
        let b = CartPole::with_seed(42).reset().unwrap();
        assert_eq!(a, b);
    }
}
