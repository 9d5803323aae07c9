//! Feature matrices.
//!
//! - [`FeatureMatrix`]: raw per-entity vectors keyed by entity id, rows in
//!   extraction order, values still typed (numeric or nominal)
//! - [`NormalizedMatrix`]: the all-numeric output of a fitted transform,
//!   with named columns and key-based row/column selection
//!
//! Rows are always addressed by entity id, never by position, so labels and
//! held-out subsets join by key.

use crate::error::{ExtractError, Result};
use crate::features::{FeatureValue, FeatureVector};
use crate::schema::{FeatureKind, FeatureSchema};
use ahash::AHashMap;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Numeric fill for missing statistics.
pub const FILL_VALUE: f64 = 0.0;

/// Category assigned to a missing nominal (the numeric fill as text).
pub const FILL_CATEGORY: &str = "0.0";

/// Name and normalization kind of one raw column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: FeatureKind,
}

#[derive(Serialize, Deserialize)]
struct FeatureMatrixData {
    schema_version: String,
    columns: Vec<ColumnSpec>,
    entity_ids: Vec<String>,
    rows: Vec<Vec<FeatureValue>>,
}

/// Raw feature matrix: one row per entity, schema-ordered columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "FeatureMatrixData", into = "FeatureMatrixData")]
pub struct FeatureMatrix {
    schema_version: String,
    columns: Vec<ColumnSpec>,
    entity_ids: Vec<String>,
    rows: Vec<Vec<FeatureValue>>,
    index: AHashMap<String, usize>,
}

impl FeatureMatrix {
    /// Empty matrix with the columns of `schema`.
    pub fn new(schema: &FeatureSchema) -> Self {
        let columns = schema
            .all_features()
            .iter()
            .map(|f| ColumnSpec {
                name: f.name.clone(),
                kind: f.kind,
            })
            .collect();
        Self::with_columns(schema.version.clone(), columns)
    }

    /// Empty matrix with explicit columns.
    pub fn with_columns(schema_version: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        Self {
            schema_version: schema_version.into(),
            columns,
            entity_ids: Vec::new(),
            rows: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Append one entity's vector.
    ///
    /// # Errors
    ///
    /// [`ExtractError::InvalidInput`] on a width mismatch, a duplicate
    /// entity id, or a value of the wrong kind for its column.
    pub fn push(&mut self, vector: FeatureVector) -> Result<()> {
        if vector.values.len() != self.columns.len() {
            return Err(ExtractError::InvalidInput(format!(
                "entity '{}' has {} values, matrix has {} columns",
                vector.entity_id,
                vector.values.len(),
                self.columns.len()
            )));
        }
        if self.index.contains_key(&vector.entity_id) {
            return Err(ExtractError::InvalidInput(format!(
                "duplicate entity '{}'",
                vector.entity_id
            )));
        }
        if let Some((col, value)) = self
            .columns
            .iter()
            .zip(&vector.values)
            .find(|(col, value)| !value.matches_kind(col.kind))
        {
            return Err(ExtractError::InvalidInput(format!(
                "entity '{}': value '{}' does not fit {:?} column '{}'",
                vector.entity_id, value, col.kind, col.name
            )));
        }

        self.index.insert(vector.entity_id.clone(), self.rows.len());
        self.entity_ids.push(vector.entity_id);
        self.rows.push(vector.values);
        Ok(())
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Entity ids in row order.
    pub fn entity_ids(&self) -> &[String] {
        &self.entity_ids
    }

    pub fn rows(&self) -> &[Vec<FeatureValue>] {
        &self.rows
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.index.contains_key(entity_id)
    }

    /// Row of one entity.
    pub fn row(&self, entity_id: &str) -> Option<&[FeatureValue]> {
        self.index.get(entity_id).map(|&i| self.rows[i].as_slice())
    }

    /// Single cell by entity id and column name.
    pub fn value(&self, entity_id: &str, column: &str) -> Option<&FeatureValue> {
        let col = self.column_index(column)?;
        self.row(entity_id).map(|row| &row[col])
    }

    /// Iterate one column top to bottom.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &FeatureValue> + '_ {
        self.rows.iter().map(move |row| &row[col])
    }

    /// Count of `Missing`/NaN cells.
    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|v| v.is_missing())
            .count()
    }

    /// Replace every missing cell with the fill value for its column kind.
    ///
    /// Numeric columns get [`FILL_VALUE`], categorical columns
    /// [`FILL_CATEGORY`]. The fill is permanent. Returns the number of cells
    /// replaced.
    pub fn fill_missing(&mut self) -> usize {
        let mut filled = 0;
        for row in &mut self.rows {
            for (value, col) in row.iter_mut().zip(&self.columns) {
                if value.is_missing() {
                    *value = match col.kind {
                        FeatureKind::Continuous => FeatureValue::Numeric(FILL_VALUE),
                        FeatureKind::Categorical => {
                            FeatureValue::Nominal(FILL_CATEGORY.to_string())
                        }
                    };
                    filled += 1;
                }
            }
        }
        filled
    }
}

impl PartialEq for FeatureMatrix {
    // `index` is derived from `entity_ids`
    fn eq(&self, other: &Self) -> bool {
        self.schema_version == other.schema_version
            && self.columns == other.columns
            && self.entity_ids == other.entity_ids
            && self.rows == other.rows
    }
}

impl TryFrom<FeatureMatrixData> for FeatureMatrix {
    type Error = String;

    fn try_from(data: FeatureMatrixData) -> std::result::Result<Self, Self::Error> {
        if data.entity_ids.len() != data.rows.len() {
            return Err(format!(
                "{} entity ids for {} rows",
                data.entity_ids.len(),
                data.rows.len()
            ));
        }
        let mut matrix = FeatureMatrix::with_columns(data.schema_version, data.columns);
        for (entity_id, values) in data.entity_ids.into_iter().zip(data.rows) {
            matrix
                .push(FeatureVector { entity_id, values })
                .map_err(|e| e.to_string())?;
        }
        Ok(matrix)
    }
}

impl From<FeatureMatrix> for FeatureMatrixData {
    fn from(m: FeatureMatrix) -> Self {
        Self {
            schema_version: m.schema_version,
            columns: m.columns,
            entity_ids: m.entity_ids,
            rows: m.rows,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct NormalizedMatrixData {
    columns: Vec<String>,
    entity_ids: Vec<String>,
    rows: Vec<Vec<f64>>,
}

/// All-numeric matrix produced by a fitted transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "NormalizedMatrixData", into = "NormalizedMatrixData")]
pub struct NormalizedMatrix {
    columns: Vec<String>,
    entity_ids: Vec<String>,
    rows: Vec<Vec<f64>>,
    index: AHashMap<String, usize>,
}

impl NormalizedMatrix {
    /// Empty matrix with the given output columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            entity_ids: Vec::new(),
            rows: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Append one row.
    ///
    /// # Errors
    ///
    /// [`ExtractError::InvalidInput`] on a width mismatch or a duplicate
    /// entity id.
    pub fn push_row(&mut self, entity_id: impl Into<String>, row: Vec<f64>) -> Result<()> {
        let entity_id = entity_id.into();
        if row.len() != self.columns.len() {
            return Err(ExtractError::InvalidInput(format!(
                "row for '{}' has {} values, expected {}",
                entity_id,
                row.len(),
                self.columns.len()
            )));
        }
        if self.index.contains_key(&entity_id) {
            return Err(ExtractError::InvalidInput(format!(
                "duplicate entity '{entity_id}'"
            )));
        }
        self.index.insert(entity_id.clone(), self.rows.len());
        self.entity_ids.push(entity_id);
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn entity_ids(&self) -> &[String] {
        &self.entity_ids
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.index.contains_key(entity_id)
    }

    /// Row of one entity.
    pub fn row(&self, entity_id: &str) -> Option<&[f64]> {
        self.index.get(entity_id).map(|&i| self.rows[i].as_slice())
    }

    /// All values of a named column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let col = self
            .column_index(name)
            .ok_or_else(|| ExtractError::FeatureNotFound(name.to_string()))?;
        Ok(self.rows.iter().map(|row| row[col]).collect())
    }

    /// Rows for the given entity ids, in the requested order.
    ///
    /// # Errors
    ///
    /// [`ExtractError::InvalidInput`] if an id is not in the matrix or is
    /// requested twice.
    pub fn select_rows<S: AsRef<str>>(&self, entity_ids: &[S]) -> Result<NormalizedMatrix> {
        let mut out = NormalizedMatrix::new(self.columns.clone());
        for id in entity_ids {
            let id = id.as_ref();
            let row = self
                .row(id)
                .ok_or_else(|| ExtractError::InvalidInput(format!("unknown entity '{id}'")))?;
            out.push_row(id, row.to_vec())?;
        }
        Ok(out)
    }

    /// Named columns, in the requested order.
    ///
    /// # Errors
    ///
    /// [`ExtractError::FeatureNotFound`] for an unknown column.
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<NormalizedMatrix> {
        let cols = names
            .iter()
            .map(|n| {
                self.column_index(n.as_ref())
                    .ok_or_else(|| ExtractError::FeatureNotFound(n.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(NormalizedMatrix {
            columns: cols.iter().map(|&c| self.columns[c].clone()).collect(),
            entity_ids: self.entity_ids.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| cols.iter().map(|&c| row[c]).collect())
                .collect(),
            index: self.index.clone(),
        })
    }

    /// Dense `[rows, columns]` array.
    pub fn to_array(&self) -> Result<Array2<f64>> {
        let flat: Vec<f64> = self.rows.iter().flatten().copied().collect();
        Array2::from_shape_vec((self.rows.len(), self.columns.len()), flat)
            .map_err(|e| ExtractError::generic(format!("Failed to shape matrix: {e}")))
    }
}

impl PartialEq for NormalizedMatrix {
    // `index` is derived from `entity_ids`
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
            && self.entity_ids == other.entity_ids
            && self.rows == other.rows
    }
}

impl TryFrom<NormalizedMatrixData> for NormalizedMatrix {
    type Error = String;

    fn try_from(data: NormalizedMatrixData) -> std::result::Result<Self, Self::Error> {
        if data.entity_ids.len() != data.rows.len() {
            return Err(format!(
                "{} entity ids for {} rows",
                data.entity_ids.len(),
                data.rows.len()
            ));
        }
        let mut matrix = NormalizedMatrix::new(data.columns);
        for (entity_id, row) in data.entity_ids.into_iter().zip(data.rows) {
            matrix.push_row(entity_id, row).map_err(|e| e.to_string())?;
        }
        Ok(matrix)
    }
}

impl From<NormalizedMatrix> for NormalizedMatrixData {
    fn from(m: NormalizedMatrix) -> Self {
        Self {
            columns: m.columns,
            entity_ids: m.entity_ids,
            rows: m.rows,
        }
    }
}
