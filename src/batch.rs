//! Batch extraction over all entities.
//!
//! Each entity's vector depends only on that entity's events, so the batch
//! is embarrassingly parallel. When enabled, a local Rayon pool processes
//! entity groups; results are collected by index, so output order always
//! equals input (first-seen) order and parallel output is identical to
//! sequential output.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   BatchProcessor                      │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │        Rayon Thread Pool (optional)             │  │
//! │  │                                                 │  │
//! │  │  group 0      group 1      ...     group N      │  │
//! │  │     │            │                    │         │  │
//! │  │     ▼            ▼                    ▼         │  │
//! │  │  Result       Result               Result       │  │
//! │  └──────────────────────┬─────────────────────────┘  │
//! │                         ▼  (index order)              │
//! │                    BatchOutput                        │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Error Modes
//!
//! - [`ErrorMode::FailFast`] (default): the first failing entity in row
//!   order aborts the batch with its original error
//! - [`ErrorMode::CollectErrors`]: failing entities are logged at `warn`,
//!   skipped, and listed in [`BatchOutput::errors`]
//!
//! # Example
//!
//! ```ignore
//! use bidder_feature_extractor::batch::{BatchConfig, BatchProcessor, ErrorMode};
//!
//! let config = BatchConfig::new()
//!     .with_threads(8)
//!     .with_error_mode(ErrorMode::CollectErrors);
//!
//! let output = BatchProcessor::new(config).process(&table.group_by_entity())?;
//! println!("{} vectors, {} skipped", output.successful_count(), output.failed_count());
//! ```

use crate::error::{ExtractError, Result};
use crate::events::EntityEventGroup;
use crate::features::{FeatureExtractor, FeatureVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// ============================================================================
// Configuration
// ============================================================================

/// Error handling mode for batch extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Stop on the first failing entity (default).
    #[default]
    FailFast,

    /// Skip failing entities, log and report each one.
    CollectErrors,
}

/// Configuration for batch extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Process entities on a thread pool.
    pub parallel: bool,

    /// Number of threads when `parallel` is set.
    ///
    /// - `None`: Use Rayon default (typically num_cpus)
    /// - `Some(n)`: Use exactly n threads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,

    /// How to handle failing entities.
    pub error_mode: ErrorMode,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            num_threads: None,
            error_mode: ErrorMode::FailFast,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Process in parallel on exactly `threads` threads.
    ///
    /// # Panics
    ///
    /// Panics if threads is 0.
    pub fn with_threads(mut self, threads: usize) -> Self {
        assert!(threads > 0, "Thread count must be > 0");
        self.parallel = true;
        self.num_threads = Some(threads);
        self
    }

    /// Set the error handling mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Threads that will actually run (1 when sequential).
    pub fn effective_threads(&self) -> usize {
        if !self.parallel {
            return 1;
        }
        self.num_threads.unwrap_or_else(rayon::current_num_threads)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == Some(0) {
            return Err(ExtractError::Config(
                "batch.num_threads must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Results
// ============================================================================

/// A skipped entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityError {
    pub entity_id: String,

    /// Offending column, when the failure was a malformed column.
    pub column: Option<String>,

    pub error: String,
}

impl EntityError {
    fn from_error(entity_id: &str, err: &ExtractError) -> Self {
        let column = match err {
            ExtractError::MalformedInput { column, .. } => Some(column.clone()),
            _ => None,
        };
        Self {
            entity_id: entity_id.to_string(),
            column,
            error: err.to_string(),
        }
    }
}

/// Aggregated batch result.
#[derive(Debug)]
pub struct BatchOutput {
    /// Vectors in input order (skipped entities removed).
    pub vectors: Vec<FeatureVector>,

    /// Skipped entities (only populated in `CollectErrors` mode).
    pub errors: Vec<EntityError>,

    /// Wall-clock time.
    pub elapsed: Duration,

    pub threads_used: usize,
}

impl BatchOutput {
    pub fn successful_count(&self) -> usize {
        self.vectors.len()
    }

    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }

    pub fn all_successful(&self) -> bool {
        self.errors.is_empty()
    }

    /// Entities per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.vectors.len() + self.errors.len()) as f64 / secs
        } else {
            0.0
        }
    }
}

// ============================================================================
// Processor
// ============================================================================

/// Runs the feature extractor over every entity group.
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    extractor: FeatureExtractor,
    config: BatchConfig,
}

impl BatchProcessor {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Extract one vector per group, preserving group order.
    ///
    /// # Errors
    ///
    /// In `FailFast` mode, the error of the first failing group in order.
    /// Thread pool creation failures in either mode.
    pub fn process(&self, groups: &[EntityEventGroup<'_>]) -> Result<BatchOutput> {
        self.config.validate()?;
        let start = Instant::now();
        let threads_used = self.config.effective_threads();

        let results: Vec<Result<FeatureVector>> = if self.config.parallel {
            // Local pool so different processors can use different thread counts.
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads_used)
                .build()
                .map_err(|e| ExtractError::generic(format!("Failed to create thread pool: {e}")))?;

            pool.install(|| {
                groups
                    .par_iter()
                    .map(|group| self.extractor.extract(group))
                    .collect()
            })
        } else if self.config.error_mode == ErrorMode::FailFast {
            // Sequential fail-fast can stop at the first error.
            let mut results = Vec::with_capacity(groups.len());
            for group in groups {
                let result = self.extractor.extract(group);
                let failed = result.is_err();
                results.push(result);
                if failed {
                    break;
                }
            }
            results
        } else {
            groups.iter().map(|g| self.extractor.extract(g)).collect()
        };

        let mut vectors = Vec::with_capacity(results.len());
        let mut errors = Vec::new();

        for (group, result) in groups.iter().zip(results) {
            match result {
                Ok(vector) => vectors.push(vector),
                Err(err) => {
                    if self.config.error_mode == ErrorMode::FailFast {
                        log::error!("Extraction failed for entity '{}': {}", group.entity_id(), err);
                        return Err(err);
                    }
                    log::warn!("Skipping entity '{}': {}", group.entity_id(), err);
                    errors.push(EntityError::from_error(group.entity_id(), &err));
                }
            }
        }

        let output = BatchOutput {
            vectors,
            errors,
            elapsed: start.elapsed(),
            threads_used,
        };

        log::debug!(
            "Batch extracted {} entities ({} skipped) on {} thread(s) in {:?}",
            output.successful_count(),
            output.failed_count(),
            threads_used,
            output.elapsed
        );

        Ok(output)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventTable};

    fn table() -> EventTable {
        EventTable::from_events(vec![
            Event::new("a", "x", 1.0).with_ip("i1"),
            Event::new("b", "x", 2.0).with_ip("i2"),
            Event::new("a", "y", 3.0).with_ip("i1"),
            Event::new("c", "z", 4.0),
        ])
    }

    fn broken_table() -> EventTable {
        let mut bad = Event::new("bad", "x", 5.0);
        bad.auction = None;
        EventTable::from_events(vec![
            Event::new("a", "x", 1.0),
            bad,
            Event::new("c", "z", 4.0),
        ])
    }

    #[test]
    fn test_batch_config_defaults() {
        let config = BatchConfig::new();
        assert!(!config.parallel);
        assert!(config.num_threads.is_none());
        assert_eq!(config.error_mode, ErrorMode::FailFast);
        assert_eq!(config.effective_threads(), 1);
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new()
            .with_threads(4)
            .with_error_mode(ErrorMode::CollectErrors);
        assert!(config.parallel);
        assert_eq!(config.num_threads, Some(4));
        assert_eq!(config.effective_threads(), 4);
        assert_eq!(config.error_mode, ErrorMode::CollectErrors);
    }

    #[test]
    #[should_panic(expected = "Thread count must be > 0")]
    fn test_batch_config_zero_threads() {
        BatchConfig::new().with_threads(0);
    }

    #[test]
    fn test_validate_rejects_zero_threads() {
        let config = BatchConfig {
            num_threads: Some(0),
            ..BatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sequential_order() {
        let table = table();
        let output = BatchProcessor::default()
            .process(&table.group_by_entity())
            .unwrap();
        let ids: Vec<&str> = output.vectors.iter().map(|v| v.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(output.all_successful());
        assert_eq!(output.threads_used, 1);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let table = table();
        let groups = table.group_by_entity();
        let seq = BatchProcessor::default().process(&groups).unwrap();
        let par = BatchProcessor::new(BatchConfig::new().with_threads(3))
            .process(&groups)
            .unwrap();
        assert_eq!(seq.vectors, par.vectors);
    }

    #[test]
    fn test_fail_fast_returns_original_error() {
        let table = broken_table();
        let err = BatchProcessor::default()
            .process(&table.group_by_entity())
            .unwrap_err();
        match err {
            ExtractError::MalformedInput { entity, column, .. } => {
                assert_eq!(entity, "bad");
                assert_eq!(column, "auction");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_collect_errors_skips_and_reports() {
        let table = broken_table();
        for config in [
            BatchConfig::new().with_error_mode(ErrorMode::CollectErrors),
            BatchConfig::new()
                .with_threads(2)
                .with_error_mode(ErrorMode::CollectErrors),
        ] {
            let output = BatchProcessor::new(config)
                .process(&table.group_by_entity())
                .unwrap();
            assert_eq!(output.successful_count(), 2);
            assert_eq!(output.failed_count(), 1);
            assert_eq!(output.errors[0].entity_id, "bad");
            assert_eq!(output.errors[0].column.as_deref(), Some("auction"));
        }
    }

    #[test]
    fn test_empty_batch() {
        let output = BatchProcessor::default().process(&[]).unwrap();
        assert_eq!(output.successful_count(), 0);
        assert!(output.all_successful());
        assert_eq!(output.throughput(), 0.0);
    }

    #[test]
    fn test_error_mode_default() {
        assert_eq!(ErrorMode::default(), ErrorMode::FailFast);
    }
}
