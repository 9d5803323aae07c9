//! Feature Schema Module
//!
//! Provides the versioned, named feature layout shared by extraction,
//! normalization and export.
//!
//! # Design Philosophy
//!
//! - **Versioned**: schema version travels with fitted transforms and exports
//! - **Named**: every column is addressed by name, positions are derived
//! - **Typed**: each feature declares whether it is continuous or categorical
//!
//! # Example
//!
//! ```
//! use bidder_feature_extractor::schema::{FeatureSchema, FeatureKind};
//!
//! let schema = FeatureSchema::bidder();
//! assert_eq!(schema.total_count(), 52);
//!
//! let mode = schema.get_feature("arg_max_ip").unwrap();
//! assert_eq!(mode.kind, FeatureKind::Categorical);
//! ```

mod feature_def;

pub use feature_def::{
    FeatureCategory, FeatureDef, FeatureKind, FeatureSchema, FeatureSchemaBuilder,
    AUCTION_AGGREGATE_FEATURE_NAMES, CATEGORICAL_STAT_NAMES, TIME_SERIES_FEATURE_NAMES,
};

/// Current schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Width of the standard per-bidder feature vector
pub const BIDDER_FEATURE_COUNT: usize = 52;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version() {
        assert!(!SCHEMA_VERSION.is_empty());
        assert_eq!(FeatureSchema::bidder().version, SCHEMA_VERSION);
    }

    #[test]
    fn test_bidder_schema_width() {
        let schema = FeatureSchema::bidder();
        assert_eq!(schema.total_count(), BIDDER_FEATURE_COUNT);
    }

    #[test]
    fn test_feature_lookup() {
        let schema = FeatureSchema::bidder();

        let feat = schema.get_feature("nb_unique_ip").unwrap();
        assert_eq!(feat.index, 0);
        assert_eq!(feat.category, FeatureCategory::CategoricalSummary);

        let feat = schema.get_feature("arg_max_auction").unwrap();
        assert_eq!(feat.index, 29);

        assert_eq!(schema.index_of("bid_nb"), Some(30));
        assert_eq!(schema.index_of("mean_auction_std_time_interval"), Some(51));
        assert!(!schema.contains("ask_price_1"));
    }

    #[test]
    fn test_feature_category_slices() {
        let schema = FeatureSchema::bidder();
        assert_eq!(
            schema.features_by_category(FeatureCategory::CategoricalSummary).len(),
            30
        );
        assert_eq!(schema.indices_by_category(FeatureCategory::TimeSeries).len(), 11);
        assert_eq!(
            schema.indices_by_category(FeatureCategory::AuctionAggregate).len(),
            11
        );
    }

    #[test]
    fn test_exactly_six_categorical_columns() {
        let schema = FeatureSchema::bidder();
        let categorical: Vec<&str> = schema
            .all_features()
            .iter()
            .filter(|f| f.is_categorical())
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(
            categorical,
            vec![
                "arg_max_ip",
                "arg_max_device",
                "arg_max_merchandise",
                "arg_max_country",
                "arg_max_url",
                "arg_max_auction"
            ]
        );
    }

    #[test]
    fn test_indices_are_dense_and_ordered() {
        let schema = FeatureSchema::bidder();
        for (i, feat) in schema.all_features().iter().enumerate() {
            assert_eq!(feat.index, i, "feature {} out of place", feat.name);
        }
    }
}
