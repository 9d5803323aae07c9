//! Interval and range statistics over a timestamp sequence.
//!
//! Timestamps are taken in the GIVEN order; the summarizer never sorts.
//! Intervals are first differences, so out-of-order events produce negative
//! intervals, which is the intended signal.
//!
//! | Index | Feature | Description |
//! |-------|---------|-------------|
//! | 0 | `count` | Number of timestamps |
//! | 1 | `min` | Earliest timestamp |
//! | 2 | `max` | Latest timestamp |
//! | 3 | `range` | `max - min` |
//! | 4-7 | `interval_*` | min, max, mean, population std of intervals |
//! | 8-10 | `interval_p*` | 25th, 50th, 75th percentiles of intervals |
//!
//! A single timestamp has the interval sequence `[0]`, so indices 4-10 are
//! all zero rather than undefined.

use super::stats;
use crate::error::{ExtractError, Result};

/// Eleven statistics of one timestamp sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub interval_min: f64,
    pub interval_max: f64,
    pub interval_mean: f64,
    pub interval_std: f64,
    pub interval_p25: f64,
    pub interval_p50: f64,
    pub interval_p75: f64,
}

impl TimeSeriesSummary {
    pub const FEATURE_COUNT: usize = 11;

    /// Values in schema order (`bid_nb` .. `time_interval_75`).
    pub fn to_array(&self) -> [f64; Self::FEATURE_COUNT] {
        [
            self.count as f64,
            self.min,
            self.max,
            self.range,
            self.interval_min,
            self.interval_max,
            self.interval_mean,
            self.interval_std,
            self.interval_p25,
            self.interval_p50,
            self.interval_p75,
        ]
    }
}

/// Summarize a non-empty timestamp sequence.
///
/// # Errors
///
/// Returns [`ExtractError::EmptyInput`] for an empty slice. Non-finite
/// timestamps are the caller's responsibility.
pub fn summarize_time_series(timestamps: &[f64]) -> Result<TimeSeriesSummary> {
    if timestamps.is_empty() {
        return Err(ExtractError::EmptyInput(
            "time series summary needs at least one timestamp".to_string(),
        ));
    }

    let min = stats::min(timestamps);
    let max = stats::max(timestamps);

    let intervals = stats::first_differences(timestamps);
    let [p25, p50, p75] = stats::percentiles(&intervals, [0.25, 0.5, 0.75]);

    Ok(TimeSeriesSummary {
        count: timestamps.len(),
        min,
        max,
        range: max - min,
        interval_min: stats::min(&intervals),
        interval_max: stats::max(&intervals),
        interval_mean: stats::mean(&intervals),
        interval_std: stats::population_std(&intervals),
        interval_p25: p25,
        interval_p50: p50,
        interval_p75: p75,
    })
}
