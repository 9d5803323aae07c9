//! Bidder Feature Extractor
//!
//! Per-entity behavioral feature extraction from raw auction bid logs, for
//! training bot-bidder classifiers.
//!
//! # Overview
//!
//! Each bidder's event stream is reduced to a fixed 52-column vector:
//!
//! - **Categorical statistics** (30): distinct count, least/most frequent
//!   share, share std and mode for ip, device, merchandise, country, url
//!   and auction
//! - **Time series statistics** (11): bid count, time span and inter-bid
//!   interval distribution
//! - **Per-auction aggregates** (11): the time statistics computed per
//!   auction, then reduced across auctions
//!
//! The raw matrix is filled and normalized column-wise (standard scaling for
//! continuous columns, indicator expansion for categorical ones) with
//! parameters fitted once and reused for held-out entities.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Bidder Feature Extractor                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  events/        - Bid events, CSV loading, grouping             │
//! │  schema/        - The named 52-column feature schema            │
//! │  features/      - Summarizers and per-entity vector building    │
//! │  matrix         - Raw and normalized keyed matrices             │
//! │  preprocessing/ - Scaler, binarizer, fitted transform           │
//! │  pipeline       - Extract, fill, fit, apply                     │
//! │  cache          - Named artifact store and cached runs          │
//! │  labels         - Ground truth and key join                     │
//! │  export/        - NumPy export for Python                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use bidder_feature_extractor::prelude::*;
//!
//! let events = load_events_csv("bids.csv", &ColumnMapping::default())?;
//! let output = Pipeline::new().fit_transform(&events)?;
//!
//! let labels = load_labels_csv("train.csv", "bidder_id", "outcome")?;
//! let dataset = labels.join(&output.normalized)?;
//! NumpyExporter::new("output").export_labeled(&dataset)?;
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod features;
pub mod labels;
pub mod matrix;
pub mod pipeline;
pub mod prelude;
pub mod preprocessing;
pub mod schema;
pub mod validation;

// Re-exports - Errors
pub use error::{ExtractError, Result};

// Re-exports - Events
pub use events::{
    load_events_csv, CategoricalColumn, ColumnMapping, EntityEventGroup, Event, EventLoader,
    EventTable,
};

// Re-exports - Schema
pub use schema::{FeatureCategory, FeatureDef, FeatureKind, FeatureSchema, SCHEMA_VERSION};

// Re-exports - Features
pub use features::{
    summarize_categorical, summarize_grouped, summarize_time_series, AuctionAggregateSummary,
    CategoricalSummary, FeatureExtractor, FeatureValue, FeatureVector, GroupedTimeSummary,
    TimeSeriesSummary,
};
pub use matrix::{FeatureMatrix, NormalizedMatrix};

// Re-exports - Preprocessing
pub use preprocessing::{
    FittedTransform, LabelBinarizer, Normalizer, StandardScaler, TransformReport,
    UnseenCategoryPolicy,
};

// Re-exports - Config
pub use config::{ExperimentMetadata, PipelineConfig};

// Re-exports - Pipeline
pub use batch::{BatchConfig, BatchProcessor, ErrorMode};
pub use pipeline::{ExtractionOutput, Pipeline, PipelineOutput};

// Re-exports - Cache
pub use cache::{run_cached, ArtifactStore, CachedRun, FileArtifactStore, MemoryArtifactStore};

// Re-exports - Labels and Export
pub use export::{export_to_numpy, ExportMetadata, NumpyExporter};
pub use labels::{load_labels_csv, LabelMap, LabeledDataset};

// Re-exports - Validation
pub use validation::{FeatureValidator, ValidationConfig, ValidationLevel, ValidationResult};
