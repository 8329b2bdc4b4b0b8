use super::errors::PolicyError;
use crate::env::Rollout;

/// A policy whose behaviour is fully determined by a flat parameter vector.
///
/// Rollout workers hold their own clone, so `set_param_values` only ever
/// touches task-local state.
pub trait Policy<O, A>: Send {
    fn param_values(&self) -> Vec<f64>;
    fn set_param_values(&mut self, params: &[f64]) -> Result<(), PolicyError>;
    fn get_action(&mut self, obs: &O) -> Result<A, PolicyError>;

    /// Called at the start of every episode.
    fn reset(&mut self) {}

    fn num_params(&self) -> usize {
        self.param_values().len()
    }

    /// Diagnostic hook, called once per training iteration with every rollout
    /// of that iteration.
    fn log_diagnostics(&self, _paths: &[Rollout<O, A>]) {}
}
