//! Diagonal Gaussian search distribution and its truncated-selection update.

use serde::{Deserialize, Serialize};

use crate::error::CemError;
use crate::stats::StatsError;

/// Number of elite samples kept per iteration: `floor(n_samples * best_frac)`,
/// but never fewer than one.
pub fn n_best(n_samples: usize, best_frac: f64) -> usize {
    ((n_samples as f64 * best_frac).floor() as usize).max(1)
}

/// Extra sampling noise that decays linearly to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplorationSchedule {
    pub extra_std: f64,
    pub decay_time: usize,
}

impl ExplorationSchedule {
    pub fn new(extra_std: f64, decay_time: usize) -> Self {
        Self {
            extra_std,
            decay_time,
        }
    }

    /// `extra_std^2 * max(1 - itr / decay_time, 0)`; zero when `decay_time` is 0.
    pub fn extra_variance(&self, itr: usize) -> f64 {
        if self.decay_time == 0 {
            return 0.0;
        }
        let mult = (1.0 - itr as f64 / self.decay_time as f64).max(0.0);
        self.extra_std * self.extra_std * mult
    }
}

/// Surviving samples of one update.
#[derive(Debug, Clone, PartialEq)]
pub struct Elite {
    /// Batch indices of the survivors, best first.
    pub indices: Vec<usize>,
    /// The best-ranked parameter vector.
    pub best: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingDistribution {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl SamplingDistribution {
    pub fn new(mean: Vec<f64>, init_std: f64) -> Self {
        let std = vec![init_std; mean.len()];
        Self { mean, std }
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Average of the per-dimension std.
    pub fn std_mean(&self) -> f64 {
        if self.std.is_empty() {
            return 0.0;
        }
        self.std.iter().sum::<f64>() / self.std.len() as f64
    }

    /// Per-dimension std to sample with at `itr`: `sqrt(std^2 + extra_variance)`.
    pub fn sample_std(&self, schedule: &ExplorationSchedule, itr: usize) -> Vec<f64> {
        let extra = schedule.extra_variance(itr);
        self.std.iter().map(|s| (s * s + extra).sqrt()).collect()
    }

    /// Re-fit to the `n_best` highest-fitness samples. An `n_best` of zero is
    /// treated as one.
    ///
    /// The new mean and std are the element-wise mean and population std of the
    /// survivors. A single survivor collapses the std to zero, which is valid:
    /// sampling then relies on the exploration term alone.
    pub fn refit(
        &mut self,
        params: &[Vec<f64>],
        fitness: &[f64],
        n_best: usize,
    ) -> Result<Elite, CemError> {
        if params.is_empty() {
            return Err(StatsError::Empty.into());
        }
        if params.len() != fitness.len() {
            return Err(CemError::DimensionMismatch {
                expected: params.len(),
                got: fitness.len(),
            });
        }
        if let Some(bad) = params.iter().find(|p| p.len() != self.dim()) {
            return Err(CemError::DimensionMismatch {
                expected: self.dim(),
                got: bad.len(),
            });
        }

        let indices: Vec<usize> = rank_descending(fitness).into_iter().take(n_best.max(1)).collect();
        let k = indices.len() as f64;

        let mut mean = vec![0.0; self.dim()];
        for &i in &indices {
            for (m, x) in mean.iter_mut().zip(&params[i]) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= k);

        let mut var = vec![0.0; self.dim()];
        for &i in &indices {
            for ((v, x), m) in var.iter_mut().zip(&params[i]).zip(&mean) {
                *v += (x - m) * (x - m);
            }
        }
        let std = var.into_iter().map(|v| (v / k).sqrt()).collect();

        self.mean = mean;
        self.std = std;

        Ok(Elite {
            best: params[indices[0]].clone(),
            indices,
        })
    }
}

/// Indices sorted by fitness, highest first. Ties keep batch order; NaN ranks
/// below everything.
pub fn rank_descending(fitness: &[f64]) -> Vec<usize> {
    let key = |i: usize| {
        let f = fitness[i];
        if f.is_nan() { f64::NEG_INFINITY } else { f }
    };
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| key(b).total_cmp(&key(a)));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n_best_never_drops_below_one() {
        assert_eq!(n_best(1, 0.05), 1);
        assert_eq!(n_best(10, 0.01), 1);
        assert_eq!(n_best(100, 0.05), 5);
        assert_eq!(n_best(4, 0.5), 2);
        assert_eq!(n_best(7, 1.0), 7);
    }

    #[test]
    fn exploration_decays_to_exactly_zero() {
        let schedule = ExplorationSchedule::new(2.0, 10);
        assert_eq!(schedule.extra_variance(0), 4.0);
        let vars: Vec<f64> = (0..30).map(|i| schedule.extra_variance(i)).collect();
        assert!(vars.windows(2).all(|w| w[1] <= w[0]));
        assert!(vars.iter().all(|&v| v >= 0.0));
        assert!(vars[10..].iter().all(|&v| v == 0.0));
        assert!(vars[9] > 0.0);
    }

    #[test]
    fn zero_decay_time_disables_exploration() {
        assert_eq!(ExplorationSchedule::new(1.0, 0).extra_variance(0), 0.0);
    }

    #[test]
    fn sample_std_adds_variances() {
        let dist = SamplingDistribution {
            mean: vec![0.0, 0.0],
            std: vec![3.0, 0.0],
        };
        let std = dist.sample_std(&ExplorationSchedule::new(4.0, 2), 0);
        assert_eq!(std, vec![5.0, 4.0]);
        let std = dist.sample_std(&ExplorationSchedule::new(4.0, 2), 2);
        assert_eq!(std, vec![3.0, 0.0]);
    }

    #[test]
    fn keeps_top_half_of_four() {
        let mut dist = SamplingDistribution::new(vec![0.0, 0.0], 1.0);
        let params = vec![
            vec![1.0, 2.0],
            vec![10.0, 10.0],
            vec![3.0, 6.0],
            vec![-10.0, -10.0],
        ];
        let elite = dist.refit(&params, &[3.0, 1.0, 4.0, 1.0], 2).unwrap();

        assert_eq!(elite.indices, vec![2, 0]);
        assert_eq!(elite.best, vec![3.0, 6.0]);
        assert_eq!(dist.mean, vec![2.0, 4.0]);
        assert_eq!(dist.std, vec![1.0, 2.0]);
    }

    #[test]
    fn single_survivor_gives_zero_std() {
        let mut dist = SamplingDistribution::new(vec![0.0; 3], 1.0);
        let params = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let elite = dist.refit(&params, &[0.5, 0.25], 1).unwrap();
        assert_eq!(elite.indices, vec![0]);
        assert_eq!(dist.mean, params[0]);
        assert_eq!(dist.std, vec![0.0; 3]);
    }

    #[test]
    fn zero_elite_size_keeps_the_best_sample() {
        let mut dist = SamplingDistribution::new(vec![0.0, 0.0], 1.0);
        let params = vec![vec![1.0, 1.0], vec![5.0, -5.0]];
        let elite = dist.refit(&params, &[0.0, 2.0], 0).unwrap();
        assert_eq!(elite.indices, vec![1]);
        assert_eq!(elite.best, vec![5.0, -5.0]);
        assert_eq!(dist.mean, vec![5.0, -5.0]);
        assert_eq!(dist.std, vec![0.0, 0.0]);
    }

    #[test]
    fn ties_keep_batch_order_and_nan_ranks_last() {
        assert_eq!(rank_descending(&[1.0, 2.0, 1.0, 2.0]), vec![1, 3, 0, 2]);
        assert_eq!(rank_descending(&[f64::NAN, -5.0, 0.0]), vec![2, 1, 0]);
    }

    #[test]
    fn elite_larger_than_batch_uses_whole_batch() {
        let mut dist = SamplingDistribution::new(vec![0.0], 1.0);
        let elite = dist.refit(&[vec![2.0], vec![4.0]], &[1.0, 0.0], 5).unwrap();
        assert_eq!(elite.indices, vec![0, 1]);
        assert_eq!(dist.mean, vec![3.0]);
        assert_eq!(dist.std, vec![1.0]);
    }

    #[test]
    fn rejects_empty_and_mismatched_batches() {
        let mut dist = SamplingDistribution::new(vec![0.0, 0.0], 1.0);
        assert!(matches!(
            dist.refit(&[], &[], 1),
            Err(CemError::Stats(StatsError::Empty))
        ));
        assert!(matches!(
            dist.refit(&[vec![1.0]], &[1.0], 1),
            Err(CemError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }
}
