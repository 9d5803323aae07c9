//! Distribution summary of one categorical column.
//!
//! Collapses an entity's values for one column into five statistics:
//!
//! | Statistic | Definition |
//! |-----------|------------|
//! | `unique_count` | number of distinct values |
//! | `min_freq_share` | count of least frequent value / total |
//! | `max_freq_share` | count of most frequent value / total |
//! | `freq_std` | population std of the per-value shares |
//! | `mode_value` | most frequent value |
//!
//! Ties for the mode resolve to the value seen first in event order, so a
//! given input sequence always yields the same mode.
//!
//! Shares are taken over the entity's rows. Rows with a blank cell count
//! toward the total but never toward `unique_count` or the mode.

use super::stats;
use crate::error::{ExtractError, Result};
use ahash::AHashMap;

/// Summary of one categorical column for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalSummary {
    pub unique_count: usize,
    pub min_freq_share: f64,
    pub max_freq_share: f64,
    pub freq_std: f64,
    pub mode_value: String,
}

impl CategoricalSummary {
    /// Numeric statistics in vector order (`nb_unique`, `low_freq`,
    /// `high_freq`, `std_freq`).
    pub fn numeric(&self) -> [f64; 4] {
        [
            self.unique_count as f64,
            self.min_freq_share,
            self.max_freq_share,
            self.freq_std,
        ]
    }
}

/// Summarize a non-empty sequence of categorical values.
///
/// # Errors
///
/// Returns [`ExtractError::EmptyInput`] if `values` yields nothing.
pub fn summarize_categorical<'a, I>(values: I) -> Result<CategoricalSummary>
where
    I: IntoIterator<Item = &'a str>,
{
    let counts = count_first_seen(values);
    let total = counts.iter().map(|&(_, c)| c).sum();
    summarize_counts(&counts, total)
}

/// Summarize the present values of a column over `row_count` rows.
///
/// `row_count` includes rows whose cell is blank, so shares of a partly
/// blank column sum to less than one.
///
/// # Errors
///
/// - [`ExtractError::EmptyInput`] if `values` yields nothing
/// - [`ExtractError::InvalidInput`] if `values` holds more than `row_count`
///   entries
pub fn summarize_categorical_over<'a, I>(values: I, row_count: usize) -> Result<CategoricalSummary>
where
    I: IntoIterator<Item = &'a str>,
{
    let counts = count_first_seen(values);
    let present: usize = counts.iter().map(|&(_, c)| c).sum();
    if present > row_count {
        return Err(ExtractError::InvalidInput(format!(
            "{present} categorical values over only {row_count} rows"
        )));
    }
    summarize_counts(&counts, row_count)
}

/// Distinct values in first-seen order with their counts.
fn count_first_seen<'a, I>(values: I) -> Vec<(&'a str, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut slots: AHashMap<&'a str, usize> = AHashMap::new();
    let mut counts: Vec<(&'a str, usize)> = Vec::new();

    for value in values {
        match slots.get(value) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts
}

fn summarize_counts(counts: &[(&str, usize)], total: usize) -> Result<CategoricalSummary> {
    let Some((&first, rest)) = counts.split_first() else {
        return Err(ExtractError::EmptyInput(
            "categorical summary needs at least one value".to_string(),
        ));
    };

    let n = total as f64;

    let mut mode = first;
    let mut min_count = first.1;
    for &(value, count) in rest {
        if count > mode.1 {
            mode = (value, count);
        }
        min_count = min_count.min(count);
    }

    let shares: Vec<f64> = counts.iter().map(|&(_, c)| c as f64 / n).collect();

    Ok(CategoricalSummary {
        unique_count: counts.len(),
        min_freq_share: min_count as f64 / n,
        max_freq_share: mode.1 as f64 / n,
        freq_std: stats::population_std(&shares),
        mode_value: mode.0.to_string(),
    })
}
