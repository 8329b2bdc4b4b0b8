//! The cross-entropy method: search distribution, rollout evaluation and the
//! iteration driver.

mod algo;
mod config;
pub mod distribution;
pub mod evaluator;

pub use algo::{Cem, CemState, IterationStats, TrainingStats};
pub use config::CemConfig;
pub use distribution::{Elite, ExplorationSchedule, SamplingDistribution, n_best};
pub use evaluator::{Criterion, EvalArgs, EvaluationResult, RolloutWorker, evaluate_sample};
