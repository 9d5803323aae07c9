//! Feature definitions and schema types.
//!
//! This module defines the core types for feature metadata:
//! - `FeatureCategory`: which summarizer produced a feature
//! - `FeatureKind`: how the normalization pass treats a feature
//! - `FeatureDef`: metadata for a single feature
//! - `FeatureSchema`: the ordered collection of feature definitions

use crate::events::CategoricalColumn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Statistic names produced per categorical column, in vector order.
pub const CATEGORICAL_STAT_NAMES: [&str; 5] =
    ["nb_unique", "low_freq", "high_freq", "std_freq", "arg_max"];

/// Entity-wide time statistics, in vector order.
pub const TIME_SERIES_FEATURE_NAMES: [&str; 11] = [
    "bid_nb",
    "min_time",
    "max_time",
    "range_time",
    "min_time_interval",
    "max_time_interval",
    "mean_time_interval",
    "std_time_interval",
    "time_interval_25",
    "time_interval_50",
    "time_interval_75",
];

/// Per-auction statistics reduced across auctions, in vector order.
pub const AUCTION_AGGREGATE_FEATURE_NAMES: [&str; 11] = [
    "mean_of_auction_bid_nb",
    "std_of_auction_bid_nb",
    "mean_of_auction_range_time",
    "std_of_auction_range_time",
    "min_of_auction_min_time_interval",
    "mean_of_auction_min_time_interval",
    "max_auction_max_time_interval",
    "mean_auction_max_time_interval",
    "mean_auction_mean_time_interval",
    "std_auction_mean_time_interval",
    "mean_auction_std_time_interval",
];

/// Feature category by producing summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureCategory {
    /// Distribution summary of one categorical column
    CategoricalSummary,

    /// Interval and range statistics over all of an entity's bids
    TimeSeries,

    /// Per-auction time statistics reduced across auctions
    AuctionAggregate,
}

impl FeatureCategory {
    /// Get all categories in vector order.
    pub fn all() -> &'static [FeatureCategory] {
        &[
            FeatureCategory::CategoricalSummary,
            FeatureCategory::TimeSeries,
            FeatureCategory::AuctionAggregate,
        ]
    }

    /// Get the display name for this category.
    pub fn name(&self) -> &'static str {
        match self {
            FeatureCategory::CategoricalSummary => "Categorical Summary",
            FeatureCategory::TimeSeries => "Time Series",
            FeatureCategory::AuctionAggregate => "Auction Aggregate",
        }
    }
}

/// How the normalization pass treats a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Numeric; standardized to zero mean and unit variance
    Continuous,

    /// Nominal; expanded into indicator columns
    Categorical,
}

/// Definition of a single feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDef {
    /// Unique feature name (e.g., "nb_unique_ip", "bid_nb")
    pub name: String,

    /// Index in the feature vector
    pub index: usize,

    /// Producing summarizer
    pub category: FeatureCategory,

    /// Normalization treatment
    pub kind: FeatureKind,

    /// Human-readable description
    pub description: String,

    /// Source column for categorical summaries
    pub column: Option<CategoricalColumn>,
}

impl FeatureDef {
    /// Create a new continuous feature definition.
    pub fn new(
        name: impl Into<String>,
        index: usize,
        category: FeatureCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            index,
            category,
            kind: FeatureKind::Continuous,
            description: description.into(),
            column: None,
        }
    }

    /// Set the normalization kind.
    pub fn with_kind(mut self, kind: FeatureKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the source column.
    pub fn with_column(mut self, column: CategoricalColumn) -> Self {
        self.column = Some(column);
        self
    }

    pub fn is_categorical(&self) -> bool {
        self.kind == FeatureKind::Categorical
    }
}

/// Ordered feature schema.
///
/// Column order and count are identical for every entity; downstream code
/// addresses columns by name through this schema.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    /// Schema version
    pub version: String,

    features: Vec<FeatureDef>,

    name_index: HashMap<String, usize>,

    category_indices: HashMap<FeatureCategory, Vec<usize>>,
}

impl FeatureSchema {
    /// Create a new empty schema.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            features: Vec::new(),
            name_index: HashMap::new(),
            category_indices: HashMap::new(),
        }
    }

    /// The standard per-bidder schema: six categorical summaries, the
    /// entity-wide time statistics, then the auction aggregates.
    pub fn bidder() -> Self {
        FeatureSchemaBuilder::new()
            .with_categorical_summaries(CategoricalColumn::all())
            .with_time_series()
            .with_auction_aggregates()
            .build()
    }

    /// Add a feature to the schema.
    pub fn add_feature(&mut self, feature: FeatureDef) {
        let index = feature.index;
        let name = feature.name.clone();
        let category = feature.category;

        self.features.push(feature);
        self.name_index.insert(name, index);
        self.category_indices
            .entry(category)
            .or_default()
            .push(index);
    }

    /// Get the total number of features.
    pub fn total_count(&self) -> usize {
        self.features.len()
    }

    /// Get a feature by name.
    pub fn get_feature(&self, name: &str) -> Option<&FeatureDef> {
        self.name_index
            .get(name)
            .and_then(|&idx| self.features.get(idx))
    }

    /// Vector position of a named feature.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    /// Get a feature by index.
    pub fn get_feature_by_index(&self, index: usize) -> Option<&FeatureDef> {
        self.features.get(index)
    }

    /// Get all features in a category.
    pub fn features_by_category(&self, category: FeatureCategory) -> Vec<&FeatureDef> {
        self.features
            .iter()
            .filter(|f| f.category == category)
            .collect()
    }

    /// Get feature indices for a category.
    pub fn indices_by_category(&self, category: FeatureCategory) -> &[usize] {
        self.category_indices
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all feature definitions.
    pub fn all_features(&self) -> &[FeatureDef] {
        &self.features
    }

    /// Check if the schema contains a feature.
    pub fn contains(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    /// Get feature names in vector order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// Owned feature names in vector order.
    pub fn column_names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name.clone()).collect()
    }
}

/// Builder for feature schemas.
pub struct FeatureSchemaBuilder {
    schema: FeatureSchema,
    next_index: usize,
}

impl FeatureSchemaBuilder {
    /// Create a new schema builder.
    pub fn new() -> Self {
        Self {
            schema: FeatureSchema::new(super::SCHEMA_VERSION),
            next_index: 0,
        }
    }

    fn push(&mut self, feature: FeatureDef) {
        self.schema.add_feature(feature);
        self.next_index += 1;
    }

    /// Add the five distribution statistics for each column.
    pub fn with_categorical_summaries(mut self, columns: &[CategoricalColumn]) -> Self {
        for &column in columns {
            let col = column.name();
            let defs = [
                ("nb_unique", "Number of distinct values", FeatureKind::Continuous),
                ("low_freq", "Share of the least frequent value", FeatureKind::Continuous),
                ("high_freq", "Share of the most frequent value", FeatureKind::Continuous),
                ("std_freq", "Population std of value shares", FeatureKind::Continuous),
                ("arg_max", "Most frequent value", FeatureKind::Categorical),
            ];
            for (stat, desc, kind) in defs {
                let feat = FeatureDef::new(
                    format!("{stat}_{col}"),
                    self.next_index,
                    FeatureCategory::CategoricalSummary,
                    format!("{desc} of {col}"),
                )
                .with_kind(kind)
                .with_column(column);
                self.push(feat);
            }
        }
        self
    }

    /// Add the eleven entity-wide time statistics.
    pub fn with_time_series(mut self) -> Self {
        let descriptions = [
            "Number of bids",
            "Earliest bid time",
            "Latest bid time",
            "Latest minus earliest bid time",
            "Smallest interval between consecutive bids",
            "Largest interval between consecutive bids",
            "Mean interval between consecutive bids",
            "Population std of intervals",
            "25th percentile of intervals",
            "Median interval",
            "75th percentile of intervals",
        ];
        for (name, desc) in TIME_SERIES_FEATURE_NAMES.iter().zip(descriptions) {
            let feat = FeatureDef::new(*name, self.next_index, FeatureCategory::TimeSeries, desc);
            self.push(feat);
        }
        self
    }

    /// Add the eleven auction aggregate statistics.
    pub fn with_auction_aggregates(mut self) -> Self {
        let descriptions = [
            "Mean bids per auction",
            "Std of bids per auction",
            "Mean per-auction time range",
            "Std of per-auction time range",
            "Smallest per-auction minimum interval",
            "Mean per-auction minimum interval",
            "Largest per-auction maximum interval",
            "Mean per-auction maximum interval",
            "Mean per-auction mean interval",
            "Std of per-auction mean interval",
            "Mean per-auction interval std",
        ];
        for (name, desc) in AUCTION_AGGREGATE_FEATURE_NAMES.iter().zip(descriptions) {
            let feat = FeatureDef::new(
                *name,
                self.next_index,
                FeatureCategory::AuctionAggregate,
                desc,
            );
            self.push(feat);
        }
        self
    }

    /// Build the schema.
    pub fn build(self) -> FeatureSchema {
        self.schema
    }
}

impl Default for FeatureSchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
