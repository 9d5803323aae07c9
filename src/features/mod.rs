//! Per-entity feature extraction.
//!
//! Turns one entity's variable-length event group into a fixed-width,
//! named feature vector.
//!
//! # Architecture
//!
//! The extraction is organized into:
//! - `stats`: shared numeric helpers (population std, linear percentiles)
//! - `categorical`: five distribution statistics per categorical column
//! - `time_series`: eleven interval/range statistics over timestamps
//! - `auction`: per-auction time statistics reduced across auctions
//!
//! # Layout
//!
//! | Block | Width | Source |
//! |-------|-------|--------|
//! | Categorical summaries | 30 | 6 columns x 5 statistics |
//! | Entity time series | 11 | all timestamps, event order |
//! | Auction aggregates | 11 | per-auction summaries, reduced |
//!
//! # Usage
//!
//! ```
//! use bidder_feature_extractor::events::{EntityEventGroup, Event};
//! use bidder_feature_extractor::features::FeatureExtractor;
//!
//! let events = vec![
//!     Event::new("A", "1", 10.0).with_ip("x"),
//!     Event::new("A", "1", 20.0).with_ip("x"),
//!     Event::new("A", "2", 15.0).with_ip("y"),
//! ];
//! let group = EntityEventGroup::new("A", events.iter().collect());
//!
//! let extractor = FeatureExtractor::new();
//! let vector = extractor.extract(&group).unwrap();
//! assert_eq!(vector.len(), 52);
//! ```

pub mod auction;
pub mod categorical;
pub mod stats;
pub mod time_series;

pub use auction::{summarize_grouped, AuctionAggregateSummary, GroupedTimeSummary};
pub use categorical::{summarize_categorical, summarize_categorical_over, CategoricalSummary};
pub use time_series::{summarize_time_series, TimeSeriesSummary};

use crate::error::{ExtractError, Result};
use crate::events::{CategoricalColumn, EntityEventGroup, TIMESTAMP_COLUMN};
use crate::schema::{FeatureKind, FeatureSchema};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One cell of a raw feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Nominal(String),
    /// Statistic undefined for this entity (column absent from its events).
    Missing,
}

impl FeatureValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Nominal(s) => Some(s),
            _ => None,
        }
    }

    /// True for `Missing` and for NaN numerics.
    pub fn is_missing(&self) -> bool {
        match self {
            FeatureValue::Missing => true,
            FeatureValue::Numeric(v) => v.is_nan(),
            FeatureValue::Nominal(_) => false,
        }
    }

    /// Whether the value can live in a column of the given kind.
    /// `Missing` fits either.
    pub fn matches_kind(&self, kind: FeatureKind) -> bool {
        match (self, kind) {
            (FeatureValue::Missing, _) => true,
            (FeatureValue::Numeric(_), FeatureKind::Continuous) => true,
            (FeatureValue::Nominal(_), FeatureKind::Categorical) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Numeric(v) => write!(f, "{v}"),
            FeatureValue::Nominal(s) => f.write_str(s),
            FeatureValue::Missing => f.write_str("<missing>"),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Numeric(v)
    }
}

/// Raw feature vector of one entity, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub entity_id: String,
    pub values: Vec<FeatureValue>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a value by feature name.
    pub fn get(&self, schema: &FeatureSchema, name: &str) -> Option<&FeatureValue> {
        schema.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Numeric value by feature name.
    pub fn numeric(&self, schema: &FeatureSchema, name: &str) -> Option<f64> {
        self.get(schema, name).and_then(FeatureValue::as_f64)
    }
}

/// Builds the fixed-width feature vector of one entity.
///
/// Stateless apart from the schema; one extractor can be shared across
/// threads.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    schema: FeatureSchema,
}

impl FeatureExtractor {
    /// Extractor over the standard 52-column bidder schema.
    pub fn new() -> Self {
        Self {
            schema: FeatureSchema::bidder(),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Total number of features per vector.
    #[inline]
    pub fn feature_count(&self) -> usize {
        self.schema.total_count()
    }

    /// Extract the feature vector of one entity.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::EmptyInput`] for a group without events
    /// - [`ExtractError::MalformedInput`] if any event lacks an auction or a
    ///   finite timestamp; the error names the entity and the column
    pub fn extract(&self, group: &EntityEventGroup<'_>) -> Result<FeatureVector> {
        let mut values = Vec::with_capacity(self.feature_count());
        self.extract_into(group, &mut values)?;
        Ok(FeatureVector {
            entity_id: group.entity_id().to_string(),
            values,
        })
    }

    /// Extract into a caller-provided buffer (cleared first).
    pub fn extract_into(
        &self,
        group: &EntityEventGroup<'_>,
        output: &mut Vec<FeatureValue>,
    ) -> Result<()> {
        output.clear();

        let entity = group.entity_id();
        if group.is_empty() {
            return Err(ExtractError::EmptyInput(format!(
                "entity '{entity}' has no events"
            )));
        }

        // 1. Required columns, checked up front so nothing partial is built
        let timed = required_auction_times(group)?;

        // 2. Categorical summaries (30)
        for &column in CategoricalColumn::all() {
            let present = group.categorical_values(column);
            if present.is_empty() {
                output.extend(std::iter::repeat(FeatureValue::Missing).take(5));
                continue;
            }
            let summary = summarize_categorical_over(present, group.len())?;
            output.extend(summary.numeric().into_iter().map(FeatureValue::Numeric));
            output.push(FeatureValue::Nominal(summary.mode_value));
        }

        // 3. Entity-wide time series (11) and auction aggregates (11)
        let grouped = summarize_grouped(timed)?;
        output.extend(grouped.overall.to_array().into_iter().map(FeatureValue::Numeric));
        output.extend(grouped.auctions.to_array().into_iter().map(FeatureValue::Numeric));

        debug_assert_eq!(output.len(), self.feature_count());
        Ok(())
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// `(auction, timestamp)` pairs in event order, or the first violation.
fn required_auction_times<'a>(group: &EntityEventGroup<'a>) -> Result<Vec<(&'a str, f64)>> {
    let entity = group.entity_id();
    group
        .events()
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let auction = event.auction.as_deref().ok_or_else(|| {
                ExtractError::malformed(
                    entity,
                    CategoricalColumn::Auction.name(),
                    format!("value missing in event {i}"),
                )
            })?;
            let ts = match event.timestamp {
                Some(t) if t.is_finite() => t,
                Some(t) => {
                    return Err(ExtractError::malformed(
                        entity,
                        TIMESTAMP_COLUMN,
                        format!("non-finite value {t} in event {i}"),
                    ))
                }
                None => {
                    return Err(ExtractError::malformed(
                        entity,
                        TIMESTAMP_COLUMN,
                        format!("value missing in event {i}"),
                    ))
                }
            };
            Ok((auction, ts))
        })
        .collect()
}
