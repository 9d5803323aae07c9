//! Per-auction time statistics reduced across auctions.
//!
//! An entity's timestamps are split by auction (first-seen order, event
//! order kept inside each auction). Each auction is summarized with
//! [`summarize_time_series`], six of its values are kept, and those six
//! sequences are reduced into eleven entity-level aggregates:
//!
//! | Per-auction value | Reductions |
//! |-------------------|------------|
//! | bid count | mean, std |
//! | time range | mean, std |
//! | interval min | min, mean |
//! | interval max | max, mean |
//! | interval mean | mean, std |
//! | interval std | mean |
//!
//! All stds are population, so a single auction reduces to zero std.

use super::stats;
use super::time_series::{summarize_time_series, TimeSeriesSummary};
use crate::error::{ExtractError, Result};
use ahash::AHashMap;

/// Eleven aggregate-of-aggregate statistics for one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuctionAggregateSummary {
    pub mean_bid_count: f64,
    pub std_bid_count: f64,
    pub mean_range: f64,
    pub std_range: f64,
    pub min_interval_min: f64,
    pub mean_interval_min: f64,
    pub max_interval_max: f64,
    pub mean_interval_max: f64,
    pub mean_interval_mean: f64,
    pub std_interval_mean: f64,
    pub mean_interval_std: f64,
}

impl AuctionAggregateSummary {
    pub const FEATURE_COUNT: usize = 11;

    /// Values in schema order (`mean_of_auction_bid_nb` ..
    /// `mean_auction_std_time_interval`).
    pub fn to_array(&self) -> [f64; Self::FEATURE_COUNT] {
        [
            self.mean_bid_count,
            self.std_bid_count,
            self.mean_range,
            self.std_range,
            self.min_interval_min,
            self.mean_interval_min,
            self.max_interval_max,
            self.mean_interval_max,
            self.mean_interval_mean,
            self.std_interval_mean,
            self.mean_interval_std,
        ]
    }

    /// Reduce per-auction summaries.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::EmptyInput`] when `groups` is empty.
    pub fn reduce(groups: &[TimeSeriesSummary]) -> Result<Self> {
        if groups.is_empty() {
            return Err(ExtractError::EmptyInput(
                "auction aggregate needs at least one auction".to_string(),
            ));
        }

        let column = |f: fn(&TimeSeriesSummary) -> f64| -> Vec<f64> { groups.iter().map(f).collect() };

        let counts = column(|g| g.count as f64);
        let ranges = column(|g| g.range);
        let imins = column(|g| g.interval_min);
        let imaxs = column(|g| g.interval_max);
        let imeans = column(|g| g.interval_mean);
        let istds = column(|g| g.interval_std);

        Ok(Self {
            mean_bid_count: stats::mean(&counts),
            std_bid_count: stats::population_std(&counts),
            mean_range: stats::mean(&ranges),
            std_range: stats::population_std(&ranges),
            min_interval_min: stats::min(&imins),
            mean_interval_min: stats::mean(&imins),
            max_interval_max: stats::max(&imaxs),
            mean_interval_max: stats::mean(&imaxs),
            mean_interval_mean: stats::mean(&imeans),
            std_interval_mean: stats::population_std(&imeans),
            mean_interval_std: stats::mean(&istds),
        })
    }
}

/// Entity-wide and per-auction time statistics together (22 values).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupedTimeSummary {
    pub overall: TimeSeriesSummary,
    pub auctions: AuctionAggregateSummary,
    pub auction_count: usize,
}

/// Split `(auction, timestamp)` pairs by auction in first-seen order.
pub fn group_by_auction<'a, I>(events: I) -> Vec<(&'a str, Vec<f64>)>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut slots: AHashMap<&'a str, usize> = AHashMap::new();
    let mut groups: Vec<(&'a str, Vec<f64>)> = Vec::new();

    for (auction, ts) in events {
        let slot = *slots.entry(auction).or_insert_with(|| {
            groups.push((auction, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(ts);
    }

    groups
}

/// Summarize an entity's full timestamp sequence and its auction breakdown.
///
/// `events` yields `(auction, timestamp)` in event order.
///
/// # Errors
///
/// Returns [`ExtractError::EmptyInput`] when there are no events.
pub fn summarize_grouped<'a, I>(events: I) -> Result<GroupedTimeSummary>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let events: Vec<(&'a str, f64)> = events.into_iter().collect();
    let all_times: Vec<f64> = events.iter().map(|&(_, t)| t).collect();

    let overall = summarize_time_series(&all_times)?;

    let groups = group_by_auction(events);
    let per_auction = groups
        .iter()
        .map(|(_, times)| summarize_time_series(times))
        .collect::<Result<Vec<_>>>()?;

    Ok(GroupedTimeSummary {
        overall,
        auctions: AuctionAggregateSummary::reduce(&per_auction)?,
        auction_count: groups.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_group_by_auction_first_seen() {
        let groups = group_by_auction([("b", 1.0), ("a", 2.0), ("b", 3.0)]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], ("b", vec![1.0, 3.0]));
        assert_eq!(groups[1], ("a", vec![2.0]));
    }

    #[test]
    fn test_reference_entity() {
        let s = summarize_grouped([("1", 10.0), ("1", 20.0), ("2", 15.0)]).unwrap();
        assert_eq!(s.auction_count, 2);
        assert_eq!(s.overall.count, 3);
        assert_eq!(s.overall.interval_min, -5.0);

        let a = s.auctions;
        assert!((a.mean_bid_count - 1.5).abs() < EPS);
        assert!((a.std_bid_count - 0.5).abs() < EPS);
        assert!((a.mean_range - 5.0).abs() < EPS);
        assert!((a.std_range - 5.0).abs() < EPS);
        assert_eq!(a.min_interval_min, 0.0);
        assert!((a.mean_interval_min - 5.0).abs() < EPS);
        assert_eq!(a.max_interval_max, 10.0);
        assert!((a.mean_interval_max - 5.0).abs() < EPS);
        assert!((a.mean_interval_mean - 5.0).abs() < EPS);
        assert!((a.std_interval_mean - 5.0).abs() < EPS);
        assert_eq!(a.mean_interval_std, 0.0);
    }

    #[test]
    fn test_single_auction_has_zero_std() {
        let s = summarize_grouped([("x", 1.0), ("x", 4.0), ("x", 6.0)]).unwrap();
        assert_eq!(s.auction_count, 1);
        assert_eq!(s.auctions.std_bid_count, 0.0);
        assert_eq!(s.auctions.std_range, 0.0);
        assert_eq!(s.auctions.std_interval_mean, 0.0);
        assert_eq!(s.auctions.mean_bid_count, 3.0);
    }

    #[test]
    fn test_empty_is_error() {
        let err = summarize_grouped(std::iter::empty::<(&str, f64)>()).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyInput(_)));
        assert!(AuctionAggregateSummary::reduce(&[]).is_err());
    }
}
