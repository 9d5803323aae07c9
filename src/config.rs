//! Pipeline configuration management.
//!
//! One serializable struct covers the whole run (input files, batch
//! execution, normalization, caching, output) so an experiment can be
//! reproduced from a single file.
//!
//! # Features
//!
//! - **Unified Configuration**: Single struct combining all pipeline stages
//! - **Serialization**: Save/load configurations to TOML or JSON
//! - **Validation**: Ensure configurations are valid before use
//!
//! # Example
//!
//! ```ignore
//! use bidder_feature_extractor::config::PipelineConfig;
//!
//! let config = PipelineConfig::default();
//! config.save_toml("experiment_config.toml")?;
//!
//! let loaded = PipelineConfig::load_toml("experiment_config.toml")?;
//! let pipeline = Pipeline::from_config(loaded)?;
//! ```

use crate::batch::BatchConfig;
use crate::error::{ExtractError, Result};
use crate::events::ColumnMapping;
use crate::preprocessing::{UnseenCategoryPolicy, DEFAULT_MIN_STD};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Unified pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub normalization: NormalizationConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Experiment metadata (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExperimentMetadata>,
}

/// Input files and their layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Bid events CSV.
    pub bids_path: PathBuf,

    /// Ground-truth CSV (entity id, outcome). Optional.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels_path: Option<PathBuf>,

    /// Entity id header in the ground-truth file.
    pub label_id_column: String,

    /// Outcome header in the ground-truth file.
    pub label_outcome_column: String,

    /// Header names in the bids file.
    pub columns: ColumnMapping,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            bids_path: PathBuf::from("data/bids.csv"),
            labels_path: Some(PathBuf::from("data/train.csv")),
            label_id_column: "bidder_id".to_string(),
            label_outcome_column: "outcome".to_string(),
            columns: ColumnMapping::default(),
        }
    }
}

/// Normalization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Column std below which scaling divides by 1.0.
    pub min_std: f64,

    /// Handling of categories unseen at fit time.
    pub unseen_categories: UnseenCategoryPolicy,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            min_std: DEFAULT_MIN_STD,
            unseen_categories: UnseenCategoryPolicy::ZeroFill,
        }
    }
}

/// Artifact cache location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("cache"),
        }
    }
}

/// Export location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

/// Experiment metadata for tracking and reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    /// Experiment name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Version or git commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set experiment metadata.
    pub fn with_metadata(mut self, metadata: ExperimentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_bids_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.input.bids_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_labels_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.input.labels_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }

    pub fn with_unseen_categories(mut self, policy: UnseenCategoryPolicy) -> Self {
        self.normalization.unseen_categories = policy;
        self
    }

    pub fn with_cache_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cache.enabled = true;
        self.cache.dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache.enabled = false;
        self
    }

    pub fn with_output_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.output.dir = dir.as_ref().to_path_buf();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.batch.validate()?;

        if self.input.bids_path.as_os_str().is_empty() {
            return Err(ExtractError::Config("input.bids_path must be set".to_string()));
        }
        if self.input.labels_path.is_some()
            && (self.input.label_id_column.is_empty() || self.input.label_outcome_column.is_empty())
        {
            return Err(ExtractError::Config(
                "label_id_column and label_outcome_column must be set when labels_path is"
                    .to_string(),
            ));
        }

        let m = &self.input.columns;
        let names = [
            &m.entity_id,
            &m.auction,
            &m.ip,
            &m.device,
            &m.merchandise,
            &m.country,
            &m.url,
            &m.timestamp,
        ];
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(ExtractError::Config(
                "input.columns entries must be non-empty".to_string(),
            ));
        }
        for (i, a) in names.iter().enumerate() {
            if names[i + 1..].contains(a) {
                return Err(ExtractError::Config(format!(
                    "input.columns maps two fields to header '{a}'"
                )));
            }
        }

        if !self.normalization.min_std.is_finite() || self.normalization.min_std < 0.0 {
            return Err(ExtractError::Config(format!(
                "normalization.min_std must be finite and >= 0 (got {})",
                self.normalization.min_std
            )));
        }
        if self.cache.enabled && self.cache.dir.as_os_str().is_empty() {
            return Err(ExtractError::Config(
                "cache.dir must be set when the cache is enabled".to_string(),
            ));
        }
        if self.output.dir.as_os_str().is_empty() {
            return Err(ExtractError::Config("output.dir must be set".to_string()));
        }

        Ok(())
    }

    /// Save configuration to TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Load and validate configuration from TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Load and validate configuration from JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}
