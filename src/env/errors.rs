use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("step called on a finished episode; reset first")]
    NeedsReset,

    #[error("Environment error: {0}")]
    EnvError(#[from] Box<dyn std::error::Error + Send + Sync>),
}
