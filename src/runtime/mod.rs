pub mod error;
pub mod handle;
pub mod pool;
pub mod scheduler;
pub mod task;

pub use error::Error;
pub use handle::TaskHandle;
pub use pool::{CollectFn, Sampler, WorkerPool};
pub use scheduler::{LocalScheduler, Scheduler};
pub use task::{Task, TaskWrapper};
