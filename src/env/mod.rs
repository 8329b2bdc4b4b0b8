mod cartpole;
mod errors;
mod rollout;
mod traits;
mod types;

pub use cartpole::CartPole;
pub use errors::EnvError;
pub use rollout::{RolloutError, rollout};
pub use traits::Env;
pub use types::Rollout;
