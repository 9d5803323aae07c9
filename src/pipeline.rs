//! Feature extraction pipeline.
//!
//! Connects grouping, per-entity extraction, missing-value fill and the
//! column-wise normalization pass:
//!
//! # Architecture
//!
//! ```text
//! EventTable ─► group_by_entity ─► BatchProcessor ─► FeatureMatrix ─► fill_missing
//!                (first-seen)       (FeatureExtractor,    (raw, keyed)
//!                                    optional Rayon)            │
//!                                                               ▼
//!                         FittedTransform::fit ◄──────────── fit (train only)
//!                                  │
//!                                  ▼
//!                         FittedTransform::apply ─► NormalizedMatrix
//! ```
//!
//! The fitted transform is a returned value, never pipeline state: the
//! caller threads it from the training run into any held-out run.
//!
//! # Example
//!
//! ```ignore
//! use bidder_feature_extractor::prelude::*;
//!
//! let pipeline = Pipeline::from_config(config)?;
//!
//! let train = pipeline.fit_transform(&train_events)?;
//! let test = pipeline.transform(&test_events, &train.transform)?;
//! ```
//!
//! # Output Structure
//!
//! | Field | Type | Description |
//! |-------|------|-------------|
//! | `raw` | `FeatureMatrix` | Filled, pre-normalization vectors |
//! | `normalized` | `NormalizedMatrix` | Scaled and binarized columns |
//! | `transform` | `FittedTransform` | Parameters used for `normalized` |
//! | `report` | `TransformReport` | Unseen categories encountered |
//! | `skipped` | `Vec<EntityError>` | Entities dropped in `CollectErrors` mode |

use crate::batch::{BatchProcessor, EntityError};
use crate::config::PipelineConfig;
use crate::error::{ExtractError, Result};
use crate::events::EventTable;
use crate::matrix::{FeatureMatrix, NormalizedMatrix};
use crate::preprocessing::{FittedTransform, TransformReport};
use crate::schema::FeatureSchema;
use crate::validation::FeatureValidator;
use std::time::{Duration, Instant};

/// Result of the extraction stage.
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    /// Filled raw matrix, rows in first-seen entity order.
    pub matrix: FeatureMatrix,

    /// Entities skipped in `CollectErrors` mode.
    pub skipped: Vec<EntityError>,

    /// Total events read.
    pub events_processed: usize,

    /// Cells replaced by the fill value.
    pub values_filled: usize,

    pub elapsed: Duration,
}

/// Result of a full extract + normalize run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub raw: FeatureMatrix,
    pub normalized: NormalizedMatrix,
    pub transform: FittedTransform,
    pub report: TransformReport,
    pub skipped: Vec<EntityError>,
}

impl PipelineOutput {
    /// Number of entities in the output.
    pub fn entity_count(&self) -> usize {
        self.normalized.len()
    }
}

/// The feature extraction pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    processor: BatchProcessor,
}

impl Pipeline {
    /// Pipeline with the default configuration.
    pub fn new() -> Self {
        let config = PipelineConfig::default();
        Self {
            processor: BatchProcessor::new(config.batch.clone()),
            config,
        }
    }

    /// Validate `config` and build a pipeline from it.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            processor: BatchProcessor::new(config.batch.clone()),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.processor.extractor().schema()
    }

    /// Build the filled raw feature matrix.
    ///
    /// Zero events give an empty matrix, not an error.
    pub fn extract(&self, events: &EventTable) -> Result<ExtractionOutput> {
        let start = Instant::now();
        let groups = events.group_by_entity();

        log::info!(
            "Extracting features for {} entities from {} events",
            groups.len(),
            events.len()
        );

        let batch = self.processor.process(&groups)?;

        let mut matrix = FeatureMatrix::new(self.schema());
        for vector in batch.vectors {
            matrix.push(vector)?;
        }
        let values_filled = matrix.fill_missing();

        let validation = FeatureValidator::new().validate_matrix(&matrix);
        if validation.has_errors() {
            return Err(ExtractError::InvalidInput(validation.to_string()));
        }

        if values_filled > 0 {
            log::debug!("Filled {values_filled} missing values");
        }
        if !batch.errors.is_empty() {
            log::warn!(
                "Skipped {} of {} entities",
                batch.errors.len(),
                groups.len()
            );
        }

        Ok(ExtractionOutput {
            matrix,
            skipped: batch.errors,
            events_processed: events.len(),
            values_filled,
            elapsed: start.elapsed(),
        })
    }

    /// Fit normalization parameters on a filled matrix.
    pub fn fit(&self, matrix: &FeatureMatrix) -> Result<FittedTransform> {
        FittedTransform::fit_with(matrix, self.config.normalization.min_std)
    }

    /// Apply fitted parameters, then check the output for non-finite values.
    pub fn apply(
        &self,
        matrix: &FeatureMatrix,
        transform: &FittedTransform,
    ) -> Result<(NormalizedMatrix, TransformReport)> {
        let (normalized, report) =
            transform.apply(matrix, self.config.normalization.unseen_categories)?;

        let validation = FeatureValidator::new().validate_normalized(&normalized);
        if validation.has_errors() {
            return Err(ExtractError::InvalidInput(validation.to_string()));
        }

        if !report.is_clean() {
            log::warn!(
                "{} values had categories unseen at fit time",
                report.unseen_count()
            );
        }
        Ok((normalized, report))
    }

    /// Extract, fit and normalize one event set (training data).
    pub fn fit_transform(&self, events: &EventTable) -> Result<PipelineOutput> {
        let extraction = self.extract(events)?;
        let transform = self.fit(&extraction.matrix)?;
        let (normalized, report) = self.apply(&extraction.matrix, &transform)?;

        log::info!(
            "Normalized {} entities: {} raw columns -> {} columns",
            normalized.len(),
            extraction.matrix.width(),
            normalized.width()
        );

        Ok(PipelineOutput {
            raw: extraction.matrix,
            normalized,
            transform,
            report,
            skipped: extraction.skipped,
        })
    }

    /// Extract and normalize held-out events with a previously fitted
    /// transform.
    pub fn transform(
        &self,
        events: &EventTable,
        transform: &FittedTransform,
    ) -> Result<PipelineOutput> {
        let extraction = self.extract(events)?;
        let (normalized, report) = self.apply(&extraction.matrix, transform)?;

        Ok(PipelineOutput {
            raw: extraction.matrix,
            normalized,
            transform: transform.clone(),
            report,
            skipped: extraction.skipped,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
