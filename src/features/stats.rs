//! Numeric helpers shared by the summarizers.
//!
//! All standard deviations are population (divide by `n`). Percentiles use
//! linear interpolation between closest ranks, so the p-th percentile of a
//! sorted slice `x` of length `n` is taken at fractional rank `(n - 1) * p`.
//!
//! Callers guarantee non-empty input; empty slices return `0.0` rather than
//! NaN so nothing undefined can leak into a feature vector.

/// Arithmetic mean.
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
#[inline]
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[inline]
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

#[inline]
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Percentile of an already sorted slice, `q` in `[0, 1]`.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (n - 1) as f64 * q.clamp(0.0, 1.0);
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Several percentiles of an unsorted slice with a single sort.
pub fn percentiles<const N: usize>(values: &[f64], qs: [f64; N]) -> [f64; N] {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    qs.map(|q| percentile_sorted(&sorted, q))
}

/// Consecutive differences `x[i+1] - x[i]` in the given order.
///
/// Fewer than two values yield `[0.0]`, so interval statistics of a single
/// bid are all zero.
pub fn first_differences(values: &[f64]) -> Vec<f64> {
    if values.len() < 2 {
        return vec![0.0];
    }
    values.windows(2).map(|w| w[1] - w[0]).collect()
}
