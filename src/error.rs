use thiserror::Error;

use crate::env::{EnvError, RolloutError};
use crate::policy::PolicyError;
use crate::runtime;
use crate::snapshot::SnapshotError;
use crate::stats::StatsError;

#[derive(Error, Debug)]
pub enum CemError {
    #[error("unimplemented criterion {0:?}, expected \"paths\" or \"samples\"")]
    UnimplementedCriterion(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("iteration {itr} produced no evaluation results")]
    EmptyBatch { itr: usize },

    #[error("expected {expected} parameters per sample, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("training has already terminated")]
    Terminated,

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Rollout(#[from] RolloutError),

    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
