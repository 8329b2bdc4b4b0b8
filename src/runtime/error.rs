use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("task aborted before producing a result")]
    Canceled,

    #[error("worker pool has no workers")]
    NoWorkers,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::Canceled
    }
}
