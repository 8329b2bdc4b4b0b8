use serde::{Deserialize, Serialize};

use crate::stats::discount_cumsum;

/// One finished episode.
///
/// `returns[t]` is the discounted reward-to-go from step `t`; it is computed
/// once at construction and the rollout is not modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rollout<O, A> {
    pub observations: Vec<O>,
    pub actions: Vec<A>,
    pub rewards: Vec<f64>,
    pub returns: Vec<f64>,
    pub undiscounted_return: f64,
}

impl<O, A> Rollout<O, A> {
    pub fn new(observations: Vec<O>, actions: Vec<A>, rewards: Vec<f64>, discount: f64) -> Self {
        let returns = discount_cumsum(&rewards, discount);
        let undiscounted_return = rewards.iter().sum();
        Self {
            observations,
            actions,
            rewards,
            returns,
            undiscounted_return,
        }
    }

    /// Number of environment steps taken.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}
