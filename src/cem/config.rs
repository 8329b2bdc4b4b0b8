use serde::{Deserialize, Serialize};

use super::distribution::{ExplorationSchedule, n_best};
use super::evaluator::Criterion;
use crate::error::CemError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CemConfig {
    /// Number of iterations.
    pub n_itr: usize,
    /// Maximum length of a single rollout.
    pub max_path_length: usize,
    pub discount: f64,
    /// Initial std of the parameter distribution.
    pub init_std: f64,
    /// Parameter vectors sampled per iteration.
    pub n_samples: usize,
    /// Environment-step budget per iteration. When set, `n_samples` no longer
    /// bounds the batch; it still sizes the elite set.
    pub batch_size: Option<usize>,
    /// Fraction of samples kept to re-fit the distribution.
    pub best_frac: f64,
    /// Decaying std added to the distribution while sampling.
    pub extra_std: f64,
    /// Iterations it takes the extra std to decay to zero.
    pub extra_decay_time: usize,
    /// Replay the committed policy through the plotter after each iteration.
    pub plot: bool,
    /// Rollouts per sampled parameter vector; the score is mean - stderr.
    pub n_evals: usize,
    /// Rollout workers; defaults to the available parallelism.
    pub workers: Option<usize>,
    /// Base seed for worker RNGs. Worker `i` uses `seed + i`.
    pub seed: Option<u64>,
}

impl Default for CemConfig {
    fn default() -> Self {
        Self {
            n_itr: 500,
            max_path_length: 500,
            discount: 0.99,
            init_std: 1.0,
            n_samples: 100,
            batch_size: None,
            best_frac: 0.05,
            extra_std: 1.0,
            extra_decay_time: 100,
            plot: false,
            n_evals: 1,
            workers: None,
            seed: None,
        }
    }
}

impl CemConfig {
    pub fn with_n_itr(mut self, n_itr: usize) -> Self {
        self.n_itr = n_itr;
        self
    }

    pub fn with_max_path_length(mut self, max_path_length: usize) -> Self {
        self.max_path_length = max_path_length;
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_init_std(mut self, init_std: f64) -> Self {
        self.init_std = init_std;
        self
    }

    pub fn with_n_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_best_frac(mut self, best_frac: f64) -> Self {
        self.best_frac = best_frac;
        self
    }

    pub fn with_extra_std(mut self, extra_std: f64, extra_decay_time: usize) -> Self {
        self.extra_std = extra_std;
        self.extra_decay_time = extra_decay_time;
        self
    }

    pub fn with_plot(mut self, plot: bool) -> Self {
        self.plot = plot;
        self
    }

    pub fn with_n_evals(mut self, n_evals: usize) -> Self {
        self.n_evals = n_evals;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), CemError> {
        let invalid = |msg: String| Err(CemError::InvalidConfig(msg));

        if self.max_path_length == 0 {
            return invalid("max_path_length must be at least 1".into());
        }
        if !(0.0..1.0).contains(&self.discount) {
            return invalid(format!("discount must be in [0, 1), got {}", self.discount));
        }
        if !(self.init_std >= 0.0) || !self.init_std.is_finite() {
            return invalid(format!("init_std must be finite and >= 0, got {}", self.init_std));
        }
        if !(self.extra_std >= 0.0) || !self.extra_std.is_finite() {
            return invalid(format!("extra_std must be finite and >= 0, got {}", self.extra_std));
        }
        if self.n_samples == 0 {
            return invalid("n_samples must be at least 1".into());
        }
        if self.batch_size == Some(0) {
            return invalid("batch_size must be at least 1 when set".into());
        }
        if !(self.best_frac > 0.0 && self.best_frac <= 1.0) {
            return invalid(format!("best_frac must be in (0, 1], got {}", self.best_frac));
        }
        if self.n_evals == 0 {
            return invalid("n_evals must be at least 1".into());
        }
        if self.workers == Some(0) {
            return invalid("workers must be at least 1 when set".into());
        }
        Ok(())
    }

    /// Size of the elite set, never below one.
    pub fn n_best(&self) -> usize {
        n_best(self.n_samples, self.best_frac)
    }

    /// How the per-iteration work budget is measured.
    pub fn criterion(&self) -> Criterion {
        match self.batch_size {
            Some(_) => Criterion::Samples,
            None => Criterion::Paths,
        }
    }

    /// Work budget per iteration, in units of [`Self::criterion`].
    pub fn threshold(&self) -> usize {
        self.batch_size.unwrap_or(self.n_samples)
    }

    pub fn exploration(&self) -> ExplorationSchedule {
        ExplorationSchedule::new(self.extra_std, self.extra_decay_time)
    }

    pub fn num_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
