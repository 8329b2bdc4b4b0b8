use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::env::{Env, Rollout};
use crate::error::CemError;
use crate::metrics::{self, TabularLogger, TracingTabular};
use crate::plot::Plotter;
use crate::policy::Policy;
use crate::runtime::{CollectFn, Sampler, WorkerPool};
use crate::snapshot::{CemSnapshot, NoopSnapshotter, Snapshotter};
use crate::stats;

use super::config::CemConfig;
use super::distribution::SamplingDistribution;
use super::evaluator::{EvalArgs, EvaluationResult, RolloutWorker, evaluate_sample};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CemState {
    Idle,
    Running { itr: usize },
    Terminated,
}

/// Metrics of one iteration, as recorded to the tabular logger.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationStats {
    pub itr: usize,
    pub cur_std_mean: f64,
    pub average_return: f64,
    pub std_return: f64,
    pub max_return: f64,
    pub min_return: f64,
    pub average_discounted_return: f64,
    /// Evaluation results in the batch (one per sampled parameter vector).
    pub num_trajs: usize,
    /// Mean length over every rollout, repeats included.
    pub avg_traj_len: f64,
    /// Environment steps over every rollout, repeats included.
    pub env_steps: usize,
}

impl IterationStats {
    fn record(&self, tabular: &mut dyn TabularLogger) {
        tabular.record(metrics::ITERATION, self.itr as f64);
        tabular.record(metrics::CUR_STD_MEAN, self.cur_std_mean);
        tabular.record(metrics::AVERAGE_RETURN, self.average_return);
        tabular.record(metrics::STD_RETURN, self.std_return);
        tabular.record(metrics::MAX_RETURN, self.max_return);
        tabular.record(metrics::MIN_RETURN, self.min_return);
        tabular.record(metrics::AVERAGE_DISCOUNTED_RETURN, self.average_discounted_return);
        tabular.record(metrics::NUM_TRAJS, self.num_trajs as f64);
        tabular.record(metrics::AVG_TRAJ_LEN, self.avg_traj_len);
    }
}

#[derive(Debug, Clone)]
pub struct TrainingStats {
    pub iterations: usize,
    pub total_trajectories: usize,
    pub total_env_steps: usize,
    pub best_undiscounted_return: f64,
    pub training_time: Duration,
}

/// Cross-entropy method trainer.
///
/// Owns the live policy, the search distribution and a pool of rollout
/// workers, each with its own env and policy clone. The live policy only
/// changes when an iteration commits its best sample.
pub struct Cem<E, P>
where
    E: Env + 'static,
    P: Policy<E::Obs, E::Act> + Clone + 'static,
{
    config: CemConfig,
    env: E,
    policy: P,
    pool: WorkerPool<RolloutWorker<E, P>>,
    distribution: SamplingDistribution,
    n_best: usize,
    state: CemState,
    tabular: Box<dyn TabularLogger>,
    snapshotter: Box<dyn Snapshotter>,
    plotter: Option<Box<dyn Plotter<E, P>>>,
    plot_initialized: bool,
}

impl<E, P> Cem<E, P>
where
    E: Env + 'static,
    P: Policy<E::Obs, E::Act> + Clone + 'static,
{
    /// `make_env` is called once per worker plus once for the trainer's own
    /// env, which is handed to the plotter.
    pub fn new<F>(config: CemConfig, make_env: F, policy: P) -> Result<Self, CemError>
    where
        F: Fn() -> E,
    {
        config.validate()?;
        let init_params = policy.param_values();
        if init_params.is_empty() {
            return Err(CemError::InvalidConfig("policy exposes no parameters".into()));
        }

        let workers = (0..config.num_workers())
            .map(|i| RolloutWorker::seeded(make_env(), policy.clone(), config.seed, i))
            .collect();

        Ok(Self {
            env: make_env(),
            pool: WorkerPool::new(workers),
            distribution: SamplingDistribution::new(init_params, config.init_std),
            n_best: config.n_best(),
            state: CemState::Idle,
            tabular: Box::new(TracingTabular::new()),
            snapshotter: Box::new(NoopSnapshotter),
            plotter: None,
            plot_initialized: false,
            policy,
            config,
        })
    }

    pub fn with_tabular(mut self, tabular: impl TabularLogger + 'static) -> Self {
        self.tabular = Box::new(tabular);
        self
    }

    pub fn with_snapshotter(mut self, snapshotter: impl Snapshotter + 'static) -> Self {
        self.snapshotter = Box::new(snapshotter);
        self
    }

    pub fn with_plotter(mut self, plotter: impl Plotter<E, P> + 'static) -> Self {
        self.plotter = Some(Box::new(plotter));
        self
    }

    pub fn config(&self) -> &CemConfig {
        &self.config
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn distribution(&self) -> &SamplingDistribution {
        &self.distribution
    }

    pub fn state(&self) -> CemState {
        self.state
    }

    pub fn n_best(&self) -> usize {
        self.n_best
    }

    pub fn num_workers(&self) -> usize {
        self.pool.len()
    }

    /// Run all remaining iterations, then close the envs and the plotter.
    ///
    /// After a failed iteration the trainer stays in `Running` with the
    /// distribution and policy untouched, and a new call retries from that
    /// iteration.
    pub async fn train(&mut self) -> Result<TrainingStats, CemError> {
        let first = match self.state {
            CemState::Idle => 0,
            CemState::Running { itr } => itr,
            CemState::Terminated => return Err(CemError::Terminated),
        };
        let start = Instant::now();

        self.init_plot();

        let mut totals = TrainingStats {
            iterations: 0,
            total_trajectories: 0,
            total_env_steps: 0,
            best_undiscounted_return: f64::NEG_INFINITY,
            training_time: Duration::ZERO,
        };

        for itr in first..self.config.n_itr {
            self.state = CemState::Running { itr };
            let stats = self.train_iteration(itr).await?;
            totals.iterations += 1;
            totals.total_trajectories += stats.num_trajs;
            totals.total_env_steps += stats.env_steps;
            totals.best_undiscounted_return = totals.best_undiscounted_return.max(stats.max_return);
        }

        self.state = CemState::Terminated;
        self.shutdown()?;
        totals.training_time = start.elapsed();
        tracing::info!(
            iterations = totals.iterations,
            trajectories = totals.total_trajectories,
            env_steps = totals.total_env_steps,
            secs = totals.training_time.as_secs_f64(),
            "training finished"
        );
        Ok(totals)
    }

    /// One sample / evaluate / re-fit / commit pass.
    pub async fn train_iteration(&mut self, itr: usize) -> Result<IterationStats, CemError> {
        let sample_std = self.distribution.sample_std(&self.config.exploration(), itr);
        let args = Arc::new(EvalArgs {
            cur_mean: self.distribution.mean.clone(),
            sample_std,
            max_path_length: self.config.max_path_length,
            discount: self.config.discount,
            criterion: self.config.criterion(),
            n_evals: self.config.n_evals,
        });

        let evaluate: CollectFn<RolloutWorker<E, P>, EvalArgs, EvaluationResult<E::Obs, E::Act>, CemError> =
            evaluate_sample::<E, P>;
        let batch = self
            .pool
            .run_collect(evaluate, args, self.config.threshold())
            .await?;
        if batch.is_empty() {
            return Err(CemError::EmptyBatch { itr });
        }

        let mut xs = Vec::with_capacity(batch.len());
        let mut fs = Vec::with_capacity(batch.len());
        let mut undiscounted = Vec::with_capacity(batch.len());
        let mut paths: Vec<Rollout<E::Obs, E::Act>> = Vec::new();
        for result in batch {
            fs.push(result.fitness());
            undiscounted.push(result.undiscounted_return);
            xs.push(result.params);
            // flattened across n_evals repeats
            paths.extend(result.full_paths);
        }
        tracing::debug!(itr, samples = xs.len(), fitness = fs.len(), "batch collected");

        // Re-fit a copy so a failure below leaves the iteration retryable.
        let mut next = self.distribution.clone();
        let elite = next.refit(&xs, &fs, self.n_best)?;

        let lens: Vec<f64> = paths.iter().map(|p| p.len() as f64).collect();
        let summary = IterationStats {
            itr,
            cur_std_mean: next.std_mean(),
            average_return: stats::mean(&undiscounted)?,
            std_return: stats::std_dev(&undiscounted, 0)?,
            max_return: undiscounted.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min_return: undiscounted.iter().copied().fold(f64::INFINITY, f64::min),
            average_discounted_return: stats::mean(&fs)?,
            num_trajs: xs.len(),
            avg_traj_len: stats::mean(&lens)?,
            env_steps: paths.iter().map(Rollout::len).sum(),
        };

        self.snapshotter.save_itr_params(
            itr,
            &CemSnapshot {
                itr,
                policy_params: elite.best.clone(),
                cur_mean: next.mean.clone(),
                cur_std: next.std.clone(),
            },
        )?;

        self.policy.set_param_values(&elite.best)?;
        self.distribution = next;
        self.policy.log_diagnostics(&paths);

        self.tabular.push_prefix(format!("itr #{itr} | "));
        summary.record(self.tabular.as_mut());
        self.tabular.dump();
        self.tabular.pop_prefix();

        if self.config.plot {
            if let Some(plotter) = self.plotter.as_mut() {
                plotter.update(&self.policy, self.config.max_path_length);
            }
        }

        tracing::info!(
            itr,
            average_return = summary.average_return,
            max_return = summary.max_return,
            cur_std_mean = summary.cur_std_mean,
            elite = elite.indices.len(),
            "iteration done"
        );
        Ok(summary)
    }

    fn init_plot(&mut self) {
        if !self.config.plot || self.plot_initialized {
            return;
        }
        match self.plotter.as_mut() {
            Some(plotter) => plotter.init(&self.env, &self.policy),
            None => tracing::warn!("plot enabled but no plotter attached"),
        }
        self.plot_initialized = true;
    }

    fn shutdown(&mut self) -> Result<(), CemError> {
        for worker in self.pool.states_mut() {
            worker.env_mut().close()?;
        }
        self.env.close()?;
        if let Some(plotter) = self.plotter.as_mut() {
            plotter.close();
        }
        Ok(())
    }
}
