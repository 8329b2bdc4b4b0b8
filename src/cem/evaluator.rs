//! Rollout evaluation of one sampled parameter vector.
//!
//! This runs on a worker thread. Each worker owns its env, policy clone and
//! RNG, so installing the sampled parameters never leaks into other tasks or
//! into the controller's policy.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::env::{Env, Rollout, rollout};
use crate::error::CemError;
use crate::policy::Policy;
use crate::stats::{stderr_lb, stderr_lb_varying_lens};

/// Unit the per-iteration work budget is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// One unit per evaluated parameter vector.
    Paths,
    /// One unit per environment step of the last rollout.
    Samples,
}

impl Criterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Paths => "paths",
            Criterion::Samples => "samples",
        }
    }

    /// Work accounted for by one evaluation. Repeated evaluations of the same
    /// parameters do not count; only the last rollout's length does.
    pub fn increment(&self, last_path_len: usize) -> usize {
        match self {
            Criterion::Paths => 1,
            Criterion::Samples => last_path_len,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = CemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paths" => Ok(Criterion::Paths),
            "samples" => Ok(Criterion::Samples),
            other => Err(CemError::UnimplementedCriterion(other.to_string())),
        }
    }
}

/// Read-only inputs shared by every task of an iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalArgs {
    pub cur_mean: Vec<f64>,
    pub sample_std: Vec<f64>,
    pub max_path_length: usize,
    pub discount: f64,
    pub criterion: Criterion,
    pub n_evals: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult<O, A> {
    pub params: Vec<f64>,
    /// Per-step `mean - stderr` of the discounted returns over `n_evals` rollouts.
    pub returns: Vec<f64>,
    /// `mean - stderr` of the undiscounted returns over `n_evals` rollouts.
    pub undiscounted_return: f64,
    pub full_paths: Vec<Rollout<O, A>>,
}

impl<O, A> EvaluationResult<O, A> {
    /// Ranking signal: the aggregated discounted return from the first step.
    pub fn fitness(&self) -> f64 {
        // empty only if every rollout took zero steps
        self.returns.first().copied().unwrap_or(f64::NEG_INFINITY)
    }
}

/// Per-worker state: an isolated env, policy instance and RNG.
pub struct RolloutWorker<E, P> {
    pub(crate) env: E,
    pub(crate) policy: P,
    rng: StdRng,
}

impl<E, P> RolloutWorker<E, P> {
    pub fn new(env: E, policy: P, rng: StdRng) -> Self {
        Self { env, policy, rng }
    }

    /// Worker `index` seeded from `seed + index`, or from entropy.
    pub fn seeded(env: E, policy: P, seed: Option<u64>, index: usize) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_entropy(),
        };
        Self::new(env, policy, rng)
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }
}

/// `mean + std ⊙ z` with `z ~ N(0, I)`.
pub fn sample_params<R: Rng + ?Sized>(mean: &[f64], std: &[f64], rng: &mut R) -> Vec<f64> {
    mean.iter()
        .zip(std)
        .map(|(m, s)| {
            let z: f64 = rng.sample(StandardNormal);
            m + s * z
        })
        .collect()
}

/// Sample one parameter vector, run `n_evals` rollouts with it and aggregate.
///
/// Returns the result together with the work increment for the criterion.
pub fn evaluate_sample<E, P>(
    worker: &mut RolloutWorker<E, P>,
    args: &EvalArgs,
) -> Result<(EvaluationResult<E::Obs, E::Act>, usize), CemError>
where
    E: Env,
    P: Policy<E::Obs, E::Act>,
{
    if args.cur_mean.len() != args.sample_std.len() {
        return Err(CemError::DimensionMismatch {
            expected: args.cur_mean.len(),
            got: args.sample_std.len(),
        });
    }

    let params = sample_params(&args.cur_mean, &args.sample_std, &mut worker.rng);
    worker.policy.set_param_values(&params)?;

    let mut paths = Vec::with_capacity(args.n_evals);
    for _ in 0..args.n_evals {
        let path = rollout(
            &mut worker.env,
            &mut worker.policy,
            args.max_path_length,
            args.discount,
        )?;
        paths.push(path);
    }

    let undiscounted: Vec<f64> = paths.iter().map(|p| p.undiscounted_return).collect();
    let returns: Vec<&[f64]> = paths.iter().map(|p| p.returns.as_slice()).collect();
    let undiscounted_return = stderr_lb(&undiscounted)?;
    let returns = stderr_lb_varying_lens(&returns)?;

    let last_len = paths.last().map_or(0, Rollout::len);
    let increment = args.criterion.increment(last_len);

    Ok((
        EvaluationResult {
            params,
            returns,
            undiscounted_return,
            full_paths: paths,
        },
        increment,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvError;
    use crate::policy::PolicyError;

    // Episode length is the action taken; every second episode is one step
    // shorter. Reward 1 per step.
    #[derive(Clone)]
    struct LengthEnv {
        t: usize,
        episodes: usize,
    }

    impl Env for LengthEnv {
        type Obs = usize;
        type Act = usize;

        fn reset(&mut self) -> Result<usize, EnvError> {
            self.t = 0;
            self.episodes += 1;
            Ok(0)
        }

        fn step(&mut self, act: usize) -> Result<(usize, f64, bool), EnvError> {
            self.t += 1;
            let len = if self.episodes % 2 == 0 { act.saturating_sub(1).max(1) } else { act };
            Ok((self.t, 1.0, self.t >= len))
        }
    }

    #[derive(Clone, Default)]
    struct LengthPolicy {
        params: Vec<f64>,
    }

    impl Policy<usize, usize> for LengthPolicy {
        fn param_values(&self) -> Vec<f64> {
            self.params.clone()
        }

        fn set_param_values(&mut self, params: &[f64]) -> Result<(), PolicyError> {
            self.params = params.to_vec();
            Ok(())
        }

        fn get_action(&mut self, _obs: &usize) -> Result<usize, PolicyError> {
            Ok(self.params[0].round().clamp(1.0, 50.0) as usize)
        }
    }

    fn worker() -> RolloutWorker<LengthEnv, LengthPolicy> {
        let env = LengthEnv { t: 0, episodes: 0 };
        RolloutWorker::seeded(env, LengthPolicy::default(), Some(7), 0)
    }

    fn args(criterion: Criterion, n_evals: usize) -> EvalArgs {
        EvalArgs {
            cur_mean: vec![4.0],
            sample_std: vec![0.0],
            max_path_length: 100,
            discount: 0.5,
            criterion,
            n_evals,
        }
    }

    #[test]
    fn criterion_parses_known_tags_only() {
        assert_eq!("paths".parse::<Criterion>().unwrap(), Criterion::Paths);
        assert_eq!("samples".parse::<Criterion>().unwrap(), Criterion::Samples);
        assert!(matches!(
            "episodes".parse::<Criterion>(),
            Err(CemError::UnimplementedCriterion(tag)) if tag == "episodes"
        ));
        assert!(serde_json::from_str::<Criterion>("\"steps\"").is_err());
    }

    #[test]
    fn zero_std_samples_the_mean() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample_params(&[1.0, -2.0], &[0.0, 0.0], &mut rng), vec![1.0, -2.0]);
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let mut a = StdRng::seed_from_u64(5);
        let mut b = StdRng::seed_from_u64(5);
        let mean = [0.0; 8];
        let std = [1.0; 8];
        assert_eq!(sample_params(&mean, &std, &mut a), sample_params(&mean, &std, &mut b));
    }

    #[test]
    fn single_eval_reports_raw_returns() {
        let mut worker = worker();
        let (result, inc) = evaluate_sample(&mut worker, &args(Criterion::Paths, 1)).unwrap();
        assert_eq!(inc, 1);
        assert_eq!(result.params, vec![4.0]);
        assert_eq!(result.full_paths.len(), 1);
        assert_eq!(result.undiscounted_return, 4.0);
        assert_eq!(result.returns, vec![1.875, 1.75, 1.5, 1.0]);
        assert_eq!(result.fitness(), 1.875);
        assert_eq!(worker.policy.param_values(), vec![4.0]);
    }

    #[test]
    fn repeated_evals_aggregate_with_stderr() {
        let mut worker = worker();
        let (result, inc) = evaluate_sample(&mut worker, &args(Criterion::Samples, 2)).unwrap();
        // episodes of length 4 then 3; the increment follows the last one
        let lens: Vec<usize> = result.full_paths.iter().map(Rollout::len).collect();
        assert_eq!(lens, vec![4, 3]);
        assert_eq!(inc, 3);

        // undiscounted [4, 3]: mean 3.5, sample std sqrt(0.5), stderr 0.5
        assert!((result.undiscounted_return - 3.0).abs() < 1e-12);
        // the fourth step is only reached by the longer episode
        assert_eq!(result.returns.len(), 4);
        assert_eq!(result.returns[3], 1.0);
    }

    #[test]
    fn mismatched_args_are_rejected() {
        let mut worker = worker();
        let mut bad = args(Criterion::Paths, 1);
        bad.sample_std = vec![1.0, 1.0];
        assert!(matches!(
            evaluate_sample(&mut worker, &bad),
            Err(CemError::DimensionMismatch { .. })
        ));
    }
}
