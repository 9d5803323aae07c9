//! Continuous-column scaling.
//!
//! # Z-Score Standardization
//!
//! ```text
//! normalized = (x - mean) / std
//! ```
//!
//! Mean and population std are accumulated with Welford's online algorithm,
//! so fitting is a single pass and numerically stable. A std below
//! `min_std` is replaced by `1.0`: constant columns map to `0.0` instead of
//! dividing by zero.
//!
//! # Architecture
//!
//! ```text
//! Normalizer (trait)
//!     └── StandardScaler
//! ```

use serde::{Deserialize, Serialize};

/// Default floor below which a column's std is treated as zero.
pub const DEFAULT_MIN_STD: f64 = 1e-8;

/// Trait for feature normalization strategies.
///
/// Implementers provide methods to:
/// 1. Update internal state with new data
/// 2. Normalize a single value
/// 3. Normalize a batch of values
/// 4. Reset state
pub trait Normalizer: Send + Sync {
    /// Update normalizer state with a new value.
    fn update(&mut self, value: f64);

    /// Normalize a single value.
    fn normalize(&self, value: f64) -> f64;

    /// Normalize a batch of values.
    fn normalize_batch(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.normalize(v)).collect()
    }

    /// Reset normalizer state.
    fn reset(&mut self);

    /// Check if normalizer has seen enough data to normalize.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Population z-score scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Running mean (Welford's algorithm)
    mean: f64,

    /// Running M2 for variance calculation (Welford's algorithm)
    m2: f64,

    /// Number of samples seen
    count: u64,

    /// Minimum std; anything smaller scales by 1.0
    min_std: f64,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::with_min_std(DEFAULT_MIN_STD)
    }

    pub fn with_min_std(min_std: f64) -> Self {
        Self {
            mean: 0.0,
            m2: 0.0,
            count: 0,
            min_std,
        }
    }

    /// Fit on a full column in one pass.
    pub fn fit<I: IntoIterator<Item = f64>>(values: I, min_std: f64) -> Self {
        let mut scaler = Self::with_min_std(min_std);
        for v in values {
            scaler.update(v);
        }
        scaler
    }

    /// Mean of the fitted column (`0.0` if empty).
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population std of the fitted column.
    pub fn raw_std(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.m2 / self.count as f64).sqrt()
    }

    /// Divisor applied by [`Normalizer::normalize`].
    pub fn scale(&self) -> f64 {
        let std = self.raw_std();
        if std < self.min_std {
            1.0
        } else {
            std
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for StandardScaler {
    fn update(&mut self, value: f64) {
        // Welford's online algorithm for mean and variance
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    #[inline]
    fn normalize(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale()
    }

    fn reset(&mut self) {
        self.mean = 0.0;
        self.m2 = 0.0;
        self.count = 0;
    }
}
