//! Data Export Module
//!
//! Export normalized feature matrices and labels for ML training.
//!
//! # Supported Formats
//!
//! - NumPy (.npy) - For Python / scikit-learn integration
//! - JSON - For row keys and metadata
//!
//! # Example
//!
//! ```ignore
//! use bidder_feature_extractor::export::NumpyExporter;
//!
//! let exporter = NumpyExporter::new(output_dir);
//! exporter.export_labeled(&dataset)?;
//!
//! // Labeled rows at the root, held-out rows under `unlabeled/`
//! exporter.export_split(&dataset, &normalized)?;
//! ```

use crate::error::{ExtractError, Result};
use crate::labels::LabeledDataset;
use crate::matrix::NormalizedMatrix;
use crate::schema::SCHEMA_VERSION;
use ndarray::Array1;
use ndarray_npy::WriteNpyExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const FEATURES_FILE: &str = "features.npy";
pub const LABELS_FILE: &str = "labels.npy";
pub const ENTITY_IDS_FILE: &str = "entity_ids.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Subdirectory receiving rows without a label.
pub const UNLABELED_DIR: &str = "unlabeled";

/// Metadata about exported dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Number of samples (entities)
    pub n_samples: usize,

    /// Number of features per sample
    pub n_features: usize,

    /// Feature column names, in array column order
    pub feature_names: Vec<String>,

    pub schema_version: String,

    /// Whether labels.npy was written
    pub has_labels: bool,

    /// Positive labels, when labeled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_positive: Option<usize>,

    /// Export timestamp (RFC 3339)
    pub export_timestamp: String,
}

/// Files produced by one export.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub features_path: PathBuf,
    pub labels_path: Option<PathBuf>,
    pub entity_ids_path: PathBuf,
    pub metadata_path: PathBuf,
    pub metadata: ExportMetadata,
}

/// Files produced by [`NumpyExporter::export_split`].
#[derive(Debug, Clone)]
pub struct SplitExport {
    pub labeled: ExportSummary,

    /// `None` when every row had a label.
    pub unlabeled: Option<ExportSummary>,
}

/// NumPy exporter - exports to .npy files for Python
#[derive(Debug, Clone)]
pub struct NumpyExporter {
    output_dir: PathBuf,
}

impl NumpyExporter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Export an unlabeled matrix (e.g. the held-out scoring set).
    ///
    /// Creates:
    /// - features.npy: \[N_samples, N_features\] f64 array
    /// - entity_ids.json: row keys, `entity_ids[i]` is row `i`
    /// - metadata.json: Dataset metadata
    pub fn export(&self, matrix: &NormalizedMatrix) -> Result<ExportSummary> {
        self.export_inner(matrix, None)
    }

    /// Export a labeled dataset; additionally writes labels.npy (\[N\] i8).
    pub fn export_labeled(&self, dataset: &LabeledDataset) -> Result<ExportSummary> {
        self.export_inner(&dataset.features, Some(&dataset.labels))
    }

    /// Export the labeled rows of `dataset`, then the rows of `matrix` it
    /// left unlabeled into [`UNLABELED_DIR`].
    ///
    /// `matrix` must be the matrix `dataset` was joined from; unlabeled rows
    /// are selected from it by id.
    pub fn export_split(
        &self,
        dataset: &LabeledDataset,
        matrix: &NormalizedMatrix,
    ) -> Result<SplitExport> {
        let labeled = self.export_labeled(dataset)?;

        let unlabeled = if dataset.unlabeled.is_empty() {
            None
        } else {
            let rows = matrix.select_rows(&dataset.unlabeled)?;
            let held_out = NumpyExporter::new(self.output_dir.join(UNLABELED_DIR));
            Some(held_out.export(&rows)?)
        };

        Ok(SplitExport { labeled, unlabeled })
    }

    fn export_inner(
        &self,
        matrix: &NormalizedMatrix,
        labels: Option<&[i8]>,
    ) -> Result<ExportSummary> {
        if matrix.is_empty() {
            return Err(ExtractError::EmptyInput("No features to export".to_string()));
        }
        if let Some(labels) = labels {
            if labels.len() != matrix.len() {
                return Err(ExtractError::InvalidInput(format!(
                    "{} labels for {} feature rows",
                    labels.len(),
                    matrix.len()
                )));
            }
        }

        fs::create_dir_all(&self.output_dir)?;

        let features_path = self.export_features(matrix)?;
        let labels_path = labels.map(|l| self.export_labels(l)).transpose()?;
        let entity_ids_path = self.export_entity_ids(matrix.entity_ids())?;

        let metadata = ExportMetadata {
            n_samples: matrix.len(),
            n_features: matrix.width(),
            feature_names: matrix.columns().to_vec(),
            schema_version: SCHEMA_VERSION.to_string(),
            has_labels: labels.is_some(),
            n_positive: labels.map(|l| l.iter().filter(|&&v| v == 1).count()),
            export_timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let metadata_path = self.export_metadata(&metadata)?;

        Ok(ExportSummary {
            features_path,
            labels_path,
            entity_ids_path,
            metadata_path,
            metadata,
        })
    }

    /// Export features as 2D NumPy array
    fn export_features(&self, matrix: &NormalizedMatrix) -> Result<PathBuf> {
        let array = matrix.to_array()?;

        let path = self.output_dir.join(FEATURES_FILE);
        let file = File::create(&path)?;
        array.write_npy(BufWriter::new(file))?;

        log::info!(
            "Exported features: {} [{} samples x {} features]",
            path.display(),
            matrix.len(),
            matrix.width()
        );
        Ok(path)
    }

    fn export_labels(&self, labels: &[i8]) -> Result<PathBuf> {
        let array = Array1::from_vec(labels.to_vec());

        let path = self.output_dir.join(LABELS_FILE);
        let file = File::create(&path)?;
        array.write_npy(BufWriter::new(file))?;

        log::info!("Exported labels: {} [{} samples]", path.display(), labels.len());
        Ok(path)
    }

    fn export_entity_ids(&self, ids: &[String]) -> Result<PathBuf> {
        let path = self.output_dir.join(ENTITY_IDS_FILE);
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), ids)?;
        Ok(path)
    }

    /// Export metadata as JSON
    fn export_metadata(&self, metadata: &ExportMetadata) -> Result<PathBuf> {
        let path = self.output_dir.join(METADATA_FILE);
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), metadata)?;

        log::info!("Exported metadata: {}", path.display());
        Ok(path)
    }
}

/// Convenience function for direct export of a labeled dataset
pub fn export_to_numpy<P: AsRef<Path>>(
    dataset: &LabeledDataset,
    output_dir: P,
) -> Result<ExportSummary> {
    NumpyExporter::new(output_dir).export_labeled(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelMap;
    use ndarray::Array2;
    use ndarray_npy::ReadNpyExt;
    use tempfile::TempDir;

    fn matrix() -> NormalizedMatrix {
        let mut m = NormalizedMatrix::new(vec!["a".into(), "b".into()]);
        m.push_row("e1", vec![1.0, -1.0]).unwrap();
        m.push_row("e2", vec![0.5, 2.0]).unwrap();
        m.push_row("e3", vec![0.0, 0.0]).unwrap();
        m
    }

    #[test]
    fn test_export_unlabeled() {
        let temp_dir = TempDir::new().unwrap();
        let summary = NumpyExporter::new(temp_dir.path()).export(&matrix()).unwrap();

        assert!(summary.labels_path.is_none());
        assert!(!temp_dir.path().join(LABELS_FILE).exists());

        let file = File::open(&summary.features_path).unwrap();
        let array = Array2::<f64>::read_npy(file).unwrap();
        assert_eq!(array.shape(), &[3, 2]);
        assert_eq!(array[[1, 1]], 2.0);

        let ids: Vec<String> =
            serde_json::from_reader(File::open(&summary.entity_ids_path).unwrap()).unwrap();
        assert_eq!(ids, vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn test_export_labeled() {
        let temp_dir = TempDir::new().unwrap();
        let mut labels = LabelMap::new();
        labels.insert("e3", 1).unwrap();
        labels.insert("e1", 0).unwrap();
        let dataset = labels.join(&matrix()).unwrap();

        let summary = export_to_numpy(&dataset, temp_dir.path()).unwrap();

        let file = File::open(summary.labels_path.unwrap()).unwrap();
        let array = Array1::<i8>::read_npy(file).unwrap();
        assert_eq!(array.to_vec(), vec![0, 1]);

        let metadata: ExportMetadata =
            serde_json::from_reader(File::open(&summary.metadata_path).unwrap()).unwrap();
        assert_eq!(metadata.n_samples, 2);
        assert_eq!(metadata.n_features, 2);
        assert_eq!(metadata.feature_names, vec!["a", "b"]);
        assert_eq!(metadata.n_positive, Some(1));
        assert!(metadata.has_labels);
        assert!(chrono::DateTime::parse_from_rfc3339(&metadata.export_timestamp).is_ok());
    }

    #[test]
    fn test_empty_features_error() {
        let temp_dir = TempDir::new().unwrap();
        let empty = NormalizedMatrix::new(vec!["a".into()]);
        let result = NumpyExporter::new(temp_dir.path()).export(&empty);
        assert!(matches!(result, Err(ExtractError::EmptyInput(_))));
    }
}
