//! Feature Validation Module
//!
//! Data-quality checks run before and after extraction so that undefined
//! values never reach the downstream consumer.
//!
//! # Validation Categories
//!
//! 1. **Event Completeness**: required columns present on every event
//! 2. **Feature Ranges**: NaN/Inf detection in raw and normalized matrices
//! 3. **Matrix Shape**: widths match the schema, no unfilled cells
//! 4. **Timestamp Ordering**: out-of-order bids (reported, never fatal)
//!
//! # Usage
//!
//! ```ignore
//! use bidder_feature_extractor::validation::FeatureValidator;
//!
//! let validator = FeatureValidator::default();
//! let result = validator.validate_normalized(&normalized);
//!
//! if !result.is_valid() {
//!     for warning in result.warnings() {
//!         println!("Warning: {}", warning);
//!     }
//! }
//! ```

use crate::events::{CategoricalColumn, EventTable, TIMESTAMP_COLUMN};
use crate::matrix::{FeatureMatrix, NormalizedMatrix};
use std::fmt;

/// Validation result for a single check.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    /// Data is valid
    Valid,
    /// Data has minor issues (warnings)
    Warning(String),
    /// Data has serious issues (errors)
    Error(String),
}

impl ValidationLevel {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationLevel::Valid)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ValidationLevel::Warning(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ValidationLevel::Error(_))
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationLevel::Valid => write!(f, "Valid"),
            ValidationLevel::Warning(msg) => write!(f, "Warning: {msg}"),
            ValidationLevel::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

/// Aggregated validation result.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    results: Vec<(String, ValidationLevel)>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation result.
    pub fn add(&mut self, check_name: &str, level: ValidationLevel) {
        self.results.push((check_name.to_string(), level));
    }

    /// Check if all validations passed (no errors or warnings).
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|(_, level)| level.is_valid())
    }

    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|(_, level)| level.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        self.results.iter().any(|(_, level)| level.is_warning())
    }

    /// All warnings as `check: message`.
    pub fn warnings(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(name, level)| match level {
                ValidationLevel::Warning(msg) => Some(format!("{name}: {msg}")),
                _ => None,
            })
            .collect()
    }

    /// All errors as `check: message`.
    pub fn errors(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(name, level)| match level {
                ValidationLevel::Error(msg) => Some(format!("{name}: {msg}")),
                _ => None,
            })
            .collect()
    }

    pub fn all_results(&self) -> &[(String, ValidationLevel)] {
        &self.results
    }

    pub fn check_count(&self) -> usize {
        self.results.len()
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|(_, l)| l.is_valid()).count()
    }

    /// Merge another result into this one.
    pub fn extend(&mut self, other: ValidationResult) {
        self.results.extend(other.results);
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let passed = self.passed_count();
        let total = self.check_count();
        writeln!(f, "Validation: {passed}/{total} checks passed")?;

        for (name, level) in &self.results {
            if !level.is_valid() {
                writeln!(f, "  - {name}: {level}")?;
            }
        }

        Ok(())
    }
}

/// Configuration for feature validation.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Check for NaN/Inf values
    pub check_nan_inf: bool,

    /// Check that raw matrices hold no unfilled cells
    pub check_missing: bool,

    /// Maximum number of offending cells listed per check
    pub max_reported: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_nan_inf: true,
            check_missing: true,
            max_reported: 5,
        }
    }
}

/// Feature validator.
#[derive(Debug, Clone, Default)]
pub struct FeatureValidator {
    config: ValidationConfig,
}

impl FeatureValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a raw matrix: no unfilled cells, finite numerics.
    pub fn validate_matrix(&self, matrix: &FeatureMatrix) -> ValidationResult {
        let mut result = ValidationResult::new();

        if self.config.check_missing {
            let missing = matrix.missing_count();
            if missing > 0 {
                result.add(
                    "missing_values",
                    ValidationLevel::Error(format!("{missing} unfilled cells")),
                );
            } else {
                result.add("missing_values", ValidationLevel::Valid);
            }
        }

        if self.config.check_nan_inf {
            let infinite: Vec<String> = matrix
                .entity_ids()
                .iter()
                .zip(matrix.rows())
                .flat_map(|(id, row)| {
                    row.iter()
                        .zip(matrix.columns())
                        .filter(|(v, _)| v.as_f64().is_some_and(f64::is_infinite))
                        .map(move |(_, col)| format!("{id}/{}", col.name))
                })
                .collect();
            result.add("nan_inf_check", self.cells_level("Infinite values", &infinite));
        }

        result
    }

    /// Validate a normalized matrix: consistent widths, finite values.
    pub fn validate_normalized(&self, matrix: &NormalizedMatrix) -> ValidationResult {
        let mut result = ValidationResult::new();

        let ragged = matrix
            .rows()
            .iter()
            .filter(|r| r.len() != matrix.width())
            .count();
        if ragged > 0 {
            result.add(
                "row_width",
                ValidationLevel::Error(format!("{ragged} rows differ from {} columns", matrix.width())),
            );
        } else {
            result.add("row_width", ValidationLevel::Valid);
        }

        if self.config.check_nan_inf {
            let bad: Vec<String> = matrix
                .entity_ids()
                .iter()
                .zip(matrix.rows())
                .flat_map(|(id, row)| {
                    row.iter()
                        .zip(matrix.columns())
                        .filter(|(v, _)| !v.is_finite())
                        .map(move |(_, col)| format!("{id}/{col}"))
                })
                .collect();
            result.add("nan_inf_check", self.cells_level("Non-finite values", &bad));
        }

        result
    }

    /// Count events lacking a required column.
    pub fn validate_events(&self, events: &EventTable) -> ValidationResult {
        let mut result = ValidationResult::new();

        let no_auction = events
            .events()
            .iter()
            .filter(|e| e.categorical(CategoricalColumn::Auction).is_none())
            .count();
        let no_time = events
            .events()
            .iter()
            .filter(|e| !e.timestamp.is_some_and(f64::is_finite))
            .count();

        for (column, count) in [
            (CategoricalColumn::Auction.name(), no_auction),
            (TIMESTAMP_COLUMN, no_time),
        ] {
            let level = if count == 0 {
                ValidationLevel::Valid
            } else {
                ValidationLevel::Error(format!("{count} events without a usable value"))
            };
            result.add(&format!("required_{column}"), level);
        }

        result.add("timestamp_ordering", self.ordering_level(events));

        result
    }

    /// Out-of-order bids within an entity are only a warning: intervals are
    /// taken in event order and negative intervals are valid features.
    fn ordering_level(&self, events: &EventTable) -> ValidationLevel {
        let unordered: Vec<String> = events
            .group_by_entity()
            .iter()
            .filter_map(|group| {
                let times: Vec<f64> = group
                    .events()
                    .iter()
                    .filter_map(|e| e.timestamp)
                    .filter(|t| t.is_finite())
                    .collect();
                first_out_of_order(&times)
                    .map(|i| format!("{} (event {i})", group.entity_id()))
            })
            .collect();

        if unordered.is_empty() {
            return ValidationLevel::Valid;
        }
        let shown: Vec<&str> = unordered
            .iter()
            .take(self.config.max_reported)
            .map(String::as_str)
            .collect();
        ValidationLevel::Warning(format!(
            "{} entities with non-monotonic timestamps (first: {})",
            unordered.len(),
            shown.join(", ")
        ))
    }

    fn cells_level(&self, what: &str, cells: &[String]) -> ValidationLevel {
        if cells.is_empty() {
            return ValidationLevel::Valid;
        }
        let shown: Vec<&str> = cells
            .iter()
            .take(self.config.max_reported)
            .map(String::as_str)
            .collect();
        ValidationLevel::Error(format!(
            "{what} in {} cells (first: {})",
            cells.len(),
            shown.join(", ")
        ))
    }
}

/// Index of the first timestamp smaller than its predecessor.
fn first_out_of_order(timestamps: &[f64]) -> Option<usize> {
    timestamps.windows(2).position(|w| w[1] < w[0]).map(|i| i + 1)
}
