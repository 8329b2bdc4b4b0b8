use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("expected {expected} parameters, got {got}")]
    ParamShape { expected: usize, got: usize },

    #[error("expected observation of length {expected}, got {got}")]
    ObservationShape { expected: usize, got: usize },

    #[error("Policy error: {0}")]
    PolicyError(#[from] Box<dyn std::error::Error + Send + Sync>),
}
