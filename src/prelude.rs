//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits for
//! ergonomic usage of the feature extraction library.
//!
//! # Usage
//!
//! ```ignore
//! use bidder_feature_extractor::prelude::*;
//!
//! let config = PipelineConfig::load_toml("experiment.toml")?;
//! let pipeline = Pipeline::from_config(config)?;
//! let output = pipeline.fit_transform(&events)?;
//! ```
//!
//! # What's Included
//!
//! ## Core Pipeline
//! - [`Pipeline`] - Extraction and normalization pipeline
//! - [`PipelineConfig`] - Pipeline configuration
//! - [`PipelineOutput`] - Raw and normalized matrices with the fitted transform
//!
//! ## Events
//! - [`EventTable`], [`Event`] - Raw bid events
//! - [`load_events_csv`], [`ColumnMapping`] - CSV loading
//!
//! ## Caching
//! - [`ArtifactStore`] - Named artifact storage
//! - [`run_cached`] - Cached extraction run

// ============================================================================
// Core Pipeline
// ============================================================================

pub use crate::batch::{BatchConfig, ErrorMode};
pub use crate::config::{ExperimentMetadata, PipelineConfig};
pub use crate::error::{ExtractError, Result};
pub use crate::pipeline::{ExtractionOutput, Pipeline, PipelineOutput};

// ============================================================================
// Events
// ============================================================================

pub use crate::events::{load_events_csv, ColumnMapping, Event, EventLoader, EventTable};

// ============================================================================
// Features & Matrices
// ============================================================================

pub use crate::features::{FeatureExtractor, FeatureValue, FeatureVector};
pub use crate::matrix::{FeatureMatrix, NormalizedMatrix};
pub use crate::schema::{FeatureKind, FeatureSchema};

// ============================================================================
// Preprocessing
// ============================================================================

pub use crate::preprocessing::{FittedTransform, Normalizer, TransformReport, UnseenCategoryPolicy};

// ============================================================================
// Caching, Labels & Export
// ============================================================================

pub use crate::cache::{
    get_or_compute, run_cached, ArtifactStore, CachedRun, FileArtifactStore, MemoryArtifactStore,
};
pub use crate::export::{export_to_numpy, ExportMetadata, NumpyExporter};
pub use crate::labels::{load_labels_csv, LabelMap, LabeledDataset};

// ============================================================================
// Validation
// ============================================================================

pub use crate::validation::{FeatureValidator, ValidationResult};
