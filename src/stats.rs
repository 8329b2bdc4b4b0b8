//! Batch statistics over rollout returns.
//!
//! The estimators here are pessimistic: they report `mean - stderr`, so a
//! parameter vector with noisy evaluations scores lower than one with the same
//! mean and a tighter spread.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("statistics over an empty batch are undefined")]
    Empty,
}

/// Arithmetic mean. Errors on an empty slice.
pub fn mean(xs: &[f64]) -> Result<f64, StatsError> {
    if xs.is_empty() {
        return Err(StatsError::Empty);
    }
    Ok(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Standard deviation with `ddof` delta degrees of freedom (numpy semantics).
///
/// `ddof = 0` is the population std, `ddof = 1` the Bessel-corrected one.
/// Returns 0 when `len <= ddof`, which only happens for the single-element
/// population case callers rely on.
pub fn std_dev(xs: &[f64], ddof: usize) -> Result<f64, StatsError> {
    let mu = mean(xs)?;
    if xs.len() <= ddof {
        return Ok(0.0);
    }
    let ss: f64 = xs.iter().map(|x| (x - mu) * (x - mu)).sum();
    Ok((ss / (xs.len() - ddof) as f64).sqrt())
}

fn ddof_for(n: usize) -> usize {
    if n > 1 { 1 } else { 0 }
}

/// Lower confidence bound `mean - stderr` of a scalar batch.
pub fn stderr_lb(samples: &[f64]) -> Result<f64, StatsError> {
    let n = samples.len();
    let mu = mean(samples)?;
    let stderr = std_dev(samples, ddof_for(n))? / (n as f64).sqrt();
    Ok(mu - stderr)
}

/// Per-timestep `mean - stderr` over sequences of unequal length.
///
/// At index `t` only the sequences longer than `t` contribute; shorter ones are
/// absent rather than zero. The output is as long as the longest input.
pub fn stderr_lb_varying_lens<S: AsRef<[f64]>>(samples: &[S]) -> Result<Vec<f64>, StatsError> {
    if samples.is_empty() {
        return Err(StatsError::Empty);
    }
    let max_len = samples.iter().map(|s| s.as_ref().len()).max().unwrap_or(0);
    let mut column = Vec::with_capacity(samples.len());
    let mut out = Vec::with_capacity(max_len);
    for t in 0..max_len {
        column.clear();
        column.extend(samples.iter().filter_map(|s| s.as_ref().get(t).copied()));
        out.push(stderr_lb(&column)?);
    }
    Ok(out)
}

/// Discounted reverse cumulative sum: `out[t] = xs[t] + discount * out[t + 1]`.
pub fn discount_cumsum(xs: &[f64], discount: f64) -> Vec<f64> {
    let mut out = vec![0.0; xs.len()];
    let mut running = 0.0;
    for (t, x) in xs.iter().enumerate().rev() {
        running = x + discount * running;
        out[t] = running;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn equal_samples_have_zero_stderr() {
        assert_eq!(stderr_lb(&[2.5, 2.5, 2.5, 2.5]).unwrap(), 2.5);
        assert_eq!(stderr_lb(&[-1.0, -1.0]).unwrap(), -1.0);
    }

    #[test]
    fn single_sample_is_returned_unchanged() {
        assert_eq!(stderr_lb(&[7.25]).unwrap(), 7.25);
    }

    #[test]
    fn stderr_uses_bessel_correction() {
        // mean 2, sample std 1, stderr 1/sqrt(3)
        let lb = stderr_lb(&[1.0, 2.0, 3.0]).unwrap();
        assert!(approx(lb, 2.0 - 1.0 / 3f64.sqrt()));
    }

    #[test]
    fn empty_batch_is_an_error() {
        assert_eq!(stderr_lb(&[]), Err(StatsError::Empty));
        let none: Vec<Vec<f64>> = Vec::new();
        assert_eq!(stderr_lb_varying_lens(&none), Err(StatsError::Empty));
    }

    #[test]
    fn varying_lens_output_matches_longest_input() {
        let samples = vec![vec![1.0, 2.0, 3.0, 4.0], vec![3.0, 4.0], vec![5.0]];
        let out = stderr_lb_varying_lens(&samples).unwrap();
        assert_eq!(out.len(), 4);

        // t = 0: [1, 3, 5] -> mean 3, sample std 2, stderr 2/sqrt(3)
        assert!(approx(out[0], 3.0 - 2.0 / 3f64.sqrt()));
        // t = 1: [2, 4] -> mean 3, sample std sqrt(2), stderr 1
        assert!(approx(out[1], 2.0));
        // t >= 2: only the longest sequence reaches these steps
        assert_eq!(out[2], 3.0);
        assert_eq!(out[3], 4.0);
    }

    #[test]
    fn discount_cumsum_runs_back_to_front() {
        assert_eq!(discount_cumsum(&[1.0, 1.0, 1.0], 0.5), vec![1.75, 1.5, 1.0]);
        assert_eq!(discount_cumsum(&[2.0, 0.0, 4.0], 0.0), vec![2.0, 0.0, 4.0]);
        assert!(discount_cumsum(&[], 0.9).is_empty());
    }

    #[test]
    fn population_and_sample_std() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(std_dev(&xs, 0).unwrap(), 2.0));
        assert!(approx(std_dev(&xs, 1).unwrap(), (32.0f64 / 7.0).sqrt()));
        assert_eq!(std_dev(&[3.0], 0).unwrap(), 0.0);
    }
}
