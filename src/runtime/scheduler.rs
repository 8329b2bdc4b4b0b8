use std::future::Future;

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::runtime::error::Error;
use crate::runtime::handle::TaskHandle;
use crate::runtime::task::Task;

pub trait Scheduler: Send + Sync {
    type Handle<T>: Future<Output = Result<T, Error>> + Send + Unpin
    where
        T: Send + 'static;

    fn submit<T>(&self, task: T) -> Self::Handle<T::Output>
    where
        T: Task;
}

/// Runs tasks on the tokio blocking thread pool of the current runtime.
///
/// Rollouts are CPU-bound and synchronous, so they must not sit on the async
/// worker threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalScheduler;

impl LocalScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for LocalScheduler {
    type Handle<T>
        = TaskHandle<T>
    where
        T: Send + 'static;

    fn submit<T>(&self, task: T) -> Self::Handle<T::Output>
    where
        T: Task,
    {
        let task_id = Uuid::new_v4();
        let (sender, receiver) = oneshot::channel();

        tokio::task::spawn_blocking(move || {
            let _ = sender.send(task.call());
        });
        tracing::trace!(%task_id, "task submitted");

        TaskHandle::new(task_id, receiver)
    }
}
