//! Scatter-gather over a fixed set of workers.
//!
//! Every worker owns a piece of state `S` (for rollouts: its own env, policy
//! and RNG). A wave moves each participating state into a blocking task, runs
//! the collect function once, and hands the state back to the pool. Waves are
//! issued until the increments reported by the collect function add up to the
//! requested threshold.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::runtime::error::Error;
use crate::runtime::scheduler::{LocalScheduler, Scheduler};
use crate::runtime::task::Task;

/// One unit of work: returns a result plus the amount of work it accounts for.
pub type CollectFn<S, A, R, E> = fn(&mut S, &A) -> Result<(R, usize), E>;

/// Run-until-threshold dispatch.
#[async_trait]
pub trait Sampler<S>: Send {
    /// Call `func` on workers until the sum of returned increments reaches
    /// `threshold`, and return every result produced.
    ///
    /// All tasks of a wave are awaited even if one fails; the first failure is
    /// then returned.
    async fn run_collect<A, R, E>(
        &mut self,
        func: CollectFn<S, A, R, E>,
        args: Arc<A>,
        threshold: usize,
    ) -> Result<Vec<R>, E>
    where
        A: Send + Sync + 'static,
        R: Send + 'static,
        E: From<Error> + Send + 'static;
}

struct CollectTask<S, A, R, E> {
    state: S,
    func: CollectFn<S, A, R, E>,
    args: Arc<A>,
}

impl<S, A, R, E> Task for CollectTask<S, A, R, E>
where
    S: Send + 'static,
    A: Send + Sync + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    type Output = (S, Result<(R, usize), E>);

    fn call(mut self) -> Self::Output {
        let result = (self.func)(&mut self.state, &self.args);
        (self.state, result)
    }
}

pub struct WorkerPool<S, Sch = LocalScheduler> {
    states: Vec<S>,
    scheduler: Sch,
}

impl<S: Send + 'static> WorkerPool<S> {
    pub fn new(states: Vec<S>) -> Self {
        Self::with_scheduler(states, LocalScheduler::new())
    }
}

impl<S: Send + 'static, Sch: Scheduler> WorkerPool<S, Sch> {
    pub fn with_scheduler(states: Vec<S>, scheduler: Sch) -> Self {
        Self { states, scheduler }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut [S] {
        &mut self.states
    }
}

#[async_trait]
impl<S, Sch> Sampler<S> for WorkerPool<S, Sch>
where
    S: Send + 'static,
    Sch: Scheduler,
{
    async fn run_collect<A, R, E>(
        &mut self,
        func: CollectFn<S, A, R, E>,
        args: Arc<A>,
        threshold: usize,
    ) -> Result<Vec<R>, E>
    where
        A: Send + Sync + 'static,
        R: Send + 'static,
        E: From<Error> + Send + 'static,
    {
        let mut results = Vec::new();
        let mut collected = 0usize;
        let mut waves = 0usize;

        while collected < threshold {
            if self.states.is_empty() {
                return Err(Error::NoWorkers.into());
            }
            // Increments are at least 1, so more tasks than the remaining
            // budget would only produce overshoot.
            let wave = self.states.len().min(threshold - collected);
            let idle = self.states.split_off(wave);
            let busy = std::mem::replace(&mut self.states, idle);

            let handles: Vec<_> = busy
                .into_iter()
                .map(|state| {
                    self.scheduler.submit(CollectTask {
                        state,
                        func,
                        args: Arc::clone(&args),
                    })
                })
                .collect();
            let outcomes = join_all(handles).await;

            let mut returned = Vec::with_capacity(wave);
            let mut failure: Option<E> = None;
            for outcome in outcomes {
                match outcome {
                    Ok((state, result)) => {
                        returned.push(state);
                        match result {
                            Ok((value, increment)) => {
                                results.push(value);
                                collected += increment;
                            }
                            Err(err) => {
                                failure.get_or_insert(err);
                            }
                        }
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "worker lost during collection");
                        failure.get_or_insert(err.into());
                    }
                }
            }
            returned.append(&mut self.states);
            self.states = returned;
            waves += 1;

            if let Some(err) = failure {
                return Err(err);
            }
        }

        tracing::debug!(waves, collected, threshold, results = results.len(), "collection done");
        Ok(results)
    }
}
