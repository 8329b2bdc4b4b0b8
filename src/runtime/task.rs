/// A unit of blocking work the scheduler can run on a worker thread.
pub trait Task: Send + 'static {
    type Output: Send + 'static;
    fn call(self) -> Self::Output;
}

/// Adapts a closure into a [`Task`].
pub struct TaskWrapper<F> {
    pub func: F,
}

impl<F, T> TaskWrapper<F>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, T> Task for TaskWrapper<F>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn call(self) -> T {
        (self.func)()
    }
}
