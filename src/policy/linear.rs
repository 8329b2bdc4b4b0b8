use super::{Policy, PolicyError};
use crate::env::Rollout;

/// Deterministic discrete-action policy: picks the arg-max of `W·obs + b`.
///
/// Parameters are laid out row-major, one row of `obs_dim` weights followed by
/// the bias per action.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPolicy {
    obs_dim: usize,
    n_actions: usize,
    params: Vec<f64>,
}

impl LinearPolicy {
    pub fn new(obs_dim: usize, n_actions: usize) -> Self {
        Self {
            obs_dim,
            n_actions,
            params: vec![0.0; n_actions * (obs_dim + 1)],
        }
    }

    pub fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    fn score(&self, action: usize, obs: &[f64]) -> f64 {
        let row = &self.params[action * (self.obs_dim + 1)..(action + 1) * (self.obs_dim + 1)];
        let (weights, bias) = row.split_at(self.obs_dim);
        weights.iter().zip(obs).map(|(w, o)| w * o).sum::<f64>() + bias[0]
    }
}

impl Policy<Vec<f64>, usize> for LinearPolicy {
    fn param_values(&self) -> Vec<f64> {
        self.params.clone()
    }

    fn set_param_values(&mut self, params: &[f64]) -> Result<(), PolicyError> {
        if params.len() != self.params.len() {
            return Err(PolicyError::ParamShape {
                expected: self.params.len(),
                got: params.len(),
            });
        }
        self.params.copy_from_slice(params);
        Ok(())
    }

    fn get_action(&mut self, obs: &Vec<f64>) -> Result<usize, PolicyError> {
        if obs.len() != self.obs_dim {
            return Err(PolicyError::ObservationShape {
                expected: self.obs_dim,
                got: obs.len(),
            });
        }
        // first action wins ties
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for action in 0..self.n_actions {
            let score = self.score(action, obs);
            if score > best_score {
                best = action;
                best_score = score;
            }
        }
        Ok(best)
    }

    fn num_params(&self) -> usize {
        self.params.len()
    }

    fn log_diagnostics(&self, paths: &[Rollout<Vec<f64>, usize>]) {
        let norm = self.params.iter().map(|p| p * p).sum::<f64>().sqrt();
        let steps: usize = paths.iter().map(Rollout::len).sum();
        tracing::debug!(param_norm = norm, paths = paths.len(), steps, "linear policy diagnostics");
    }
}
