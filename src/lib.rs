//! Cross-entropy method policy search.
//!
//! Candidate parameter vectors are drawn from a diagonal Gaussian, scored by
//! running episodes on a pool of rollout workers, and the Gaussian is re-fit
//! to the best fraction each iteration. See [`cem::Cem`] for the driver.

pub mod cem;
pub mod env;
pub mod error;
pub mod metrics;
pub mod plot;
pub mod policy;
pub mod runtime;
pub mod snapshot;
pub mod stats;

pub use cem::{Cem, CemConfig, CemState, Criterion, IterationStats, TrainingStats};
pub use error::CemError;
