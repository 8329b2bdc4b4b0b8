use super::errors::EnvError;

/// An episodic simulator driven through `reset` then repeated `step` calls.
///
/// Each rollout worker owns its own instance, so implementations do not need
/// interior synchronisation, only `Send`.
pub trait Env: Send {
    type Obs: Send + Clone + 'static;
    type Act: Send + Clone + 'static;

    fn reset(&mut self) -> Result<Self::Obs, EnvError>;
    /// Returns `(next_obs, reward, done)`.
    fn step(&mut self, act: Self::Act) -> Result<(Self::Obs, f64, bool), EnvError>;
    fn close(&mut self) -> Result<(), EnvError> {
        Ok(())
    }
}
