//! Ground-truth labels and their join onto feature rows.
//!
//! Labels are attached by entity id, never by row position: a ground-truth
//! file may list entities in any order, include entities without bids, or
//! miss entities that do have bids.

use crate::error::{ExtractError, Result};
use crate::matrix::NormalizedMatrix;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Entity id to binary label (`1` = bot).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMap {
    labels: BTreeMap<String, i8>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label. Re-inserting the same label is a no-op.
    ///
    /// # Errors
    ///
    /// [`ExtractError::InvalidInput`] if the entity already has a different
    /// label.
    pub fn insert(&mut self, entity_id: impl Into<String>, label: i8) -> Result<()> {
        let entity_id = entity_id.into();
        match self.labels.get(&entity_id) {
            Some(&existing) if existing != label => Err(ExtractError::InvalidInput(format!(
                "entity '{entity_id}' labeled both {existing} and {label}"
            ))),
            _ => {
                self.labels.insert(entity_id, label);
                Ok(())
            }
        }
    }

    pub fn get(&self, entity_id: &str) -> Option<i8> {
        self.labels.get(entity_id).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn positive_count(&self) -> usize {
        self.labels.values().filter(|&&l| l == 1).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i8)> {
        self.labels.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Keep the matrix rows that have a label, in matrix order.
    pub fn join(&self, matrix: &NormalizedMatrix) -> Result<LabeledDataset> {
        let mut matched = Vec::new();
        let mut labels = Vec::new();
        let mut unlabeled = Vec::new();

        for id in matrix.entity_ids() {
            match self.get(id) {
                Some(label) => {
                    matched.push(id.as_str());
                    labels.push(label);
                }
                None => unlabeled.push(id.clone()),
            }
        }

        let features = matrix.select_rows(&matched)?;
        let labels_without_rows = self
            .labels
            .keys()
            .filter(|id| !matrix.contains(id))
            .count();

        log::info!(
            "Joined {} labeled rows ({} rows unlabeled, {} labels without rows)",
            labels.len(),
            unlabeled.len(),
            labels_without_rows
        );

        Ok(LabeledDataset {
            features,
            labels,
            unlabeled,
            labels_without_rows,
        })
    }
}

/// Feature rows paired with labels by entity id.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    /// Labeled rows in matrix order.
    pub features: NormalizedMatrix,

    /// `labels[i]` belongs to `features.entity_ids()[i]`.
    pub labels: Vec<i8>,

    /// Matrix entities with no label (e.g. held-out set).
    pub unlabeled: Vec<String>,

    /// Labels whose entity has no feature row.
    pub labels_without_rows: usize,
}

impl LabeledDataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of one entity in the dataset.
    pub fn label_of(&self, entity_id: &str) -> Option<i8> {
        self.features
            .entity_ids()
            .iter()
            .position(|id| id == entity_id)
            .map(|i| self.labels[i])
    }
}

/// Load labels from a CSV file.
pub fn load_labels_csv<P: AsRef<Path>>(
    path: P,
    id_column: &str,
    outcome_column: &str,
) -> Result<LabelMap> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ExtractError::generic(format!("Failed to open {}: {e}", path.display())))?;
    let labels = load_labels_from_reader(file, id_column, outcome_column)?;
    log::info!(
        "Loaded {} labels ({} positive) from {}",
        labels.len(),
        labels.positive_count(),
        path.display()
    );
    Ok(labels)
}

/// Load labels from any CSV reader.
///
/// Outcomes parse as numbers (`1`, `1.0`); any non-zero value is positive.
pub fn load_labels_from_reader<R: Read>(
    reader: R,
    id_column: &str,
    outcome_column: &str,
) -> Result<LabelMap> {
    let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| ExtractError::malformed("<header>", name, "column absent from labels"))
    };
    let id_idx = find(id_column)?;
    let outcome_idx = find(outcome_column)?;

    let mut labels = LabelMap::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let id = record.get(id_idx).map(str::trim).unwrap_or_default();
        if id.is_empty() {
            return Err(ExtractError::malformed(
                format!("<row {}>", row + 1),
                id_column,
                "entity identifier missing",
            ));
        }
        let raw = record.get(outcome_idx).map(str::trim).unwrap_or_default();
        let outcome: f64 = raw.parse().map_err(|_| {
            ExtractError::malformed(id, outcome_column, format!("'{raw}' is not a number"))
        })?;
        labels.insert(id, i8::from(outcome != 0.0))?;
    }

    Ok(labels)
}
