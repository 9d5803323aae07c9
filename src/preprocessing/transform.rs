//! Explicit fit/apply normalization of a feature matrix.
//!
//! [`FittedTransform::fit`] learns one column transform per raw column
//! (scaler for continuous, binarizer for categorical) and returns an
//! immutable value. [`FittedTransform::apply`] takes that value and a
//! matrix and produces a [`NormalizedMatrix`]. The same value normalizes
//! training rows and any held-out rows; nothing is stored on the pipeline.
//!
//! Applying to a matrix whose columns (names, order or kinds) differ from
//! the fit-time columns is a [`ExtractError::SchemaMismatch`]. Categories
//! not seen at fit time follow the [`UnseenCategoryPolicy`].

use super::binarizer::LabelBinarizer;
use super::normalization::{Normalizer, StandardScaler, DEFAULT_MIN_STD};
use crate::error::{ExtractError, Result};
use crate::features::FeatureValue;
use crate::matrix::{ColumnSpec, FeatureMatrix, NormalizedMatrix};
use crate::schema::FeatureKind;
use serde::{Deserialize, Serialize};

/// Handling of categories absent at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnseenCategoryPolicy {
    /// Encode as all zeros, report and log each occurrence.
    #[default]
    ZeroFill,

    /// Fail with a schema mismatch naming column and category.
    Strict,
}

/// Learned transform of one raw column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnTransform {
    Scale(StandardScaler),
    Binarize(LabelBinarizer),
}

impl ColumnTransform {
    pub fn output_width(&self) -> usize {
        match self {
            ColumnTransform::Scale(_) => 1,
            ColumnTransform::Binarize(b) => b.output_width(),
        }
    }
}

/// One category seen at apply time but not at fit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnseenCategory {
    pub entity_id: String,
    pub column: String,
    pub category: String,
}

/// What an apply pass had to work around.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformReport {
    pub unseen: Vec<UnseenCategory>,
}

impl TransformReport {
    pub fn is_clean(&self) -> bool {
        self.unseen.is_empty()
    }

    pub fn unseen_count(&self) -> usize {
        self.unseen.len()
    }
}

/// Immutable, serializable normalization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransform {
    schema_version: String,
    columns: Vec<ColumnSpec>,
    transforms: Vec<ColumnTransform>,
    output_columns: Vec<String>,
}

impl FittedTransform {
    /// Fit with the default std floor.
    pub fn fit(matrix: &FeatureMatrix) -> Result<Self> {
        Self::fit_with(matrix, DEFAULT_MIN_STD)
    }

    /// Fit every column of a filled matrix.
    ///
    /// # Errors
    ///
    /// [`ExtractError::InvalidInput`] if the matrix still holds missing
    /// values.
    pub fn fit_with(matrix: &FeatureMatrix, min_std: f64) -> Result<Self> {
        ensure_filled(matrix)?;

        let mut transforms = Vec::with_capacity(matrix.width());
        let mut output_columns = Vec::new();

        for (col, spec) in matrix.columns().iter().enumerate() {
            let transform = match spec.kind {
                FeatureKind::Continuous => {
                    let values = matrix.column_values(col).filter_map(FeatureValue::as_f64);
                    output_columns.push(spec.name.clone());
                    ColumnTransform::Scale(StandardScaler::fit(values, min_std))
                }
                FeatureKind::Categorical => {
                    let values = matrix.column_values(col).filter_map(FeatureValue::as_str);
                    let binarizer = LabelBinarizer::fit(values);
                    output_columns.extend(binarizer.output_names(&spec.name));
                    ColumnTransform::Binarize(binarizer)
                }
            };
            transforms.push(transform);
        }

        log::debug!(
            "Fitted transform: {} input columns -> {} output columns over {} rows",
            matrix.width(),
            output_columns.len(),
            matrix.len()
        );

        Ok(Self {
            schema_version: matrix.schema_version().to_string(),
            columns: matrix.columns().to_vec(),
            transforms,
            output_columns,
        })
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn input_columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }

    pub fn output_width(&self) -> usize {
        self.output_columns.len()
    }

    pub fn transforms(&self) -> &[ColumnTransform] {
        &self.transforms
    }

    /// Transform of a named input column.
    pub fn column_transform(&self, name: &str) -> Option<&ColumnTransform> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .map(|i| &self.transforms[i])
    }

    /// Normalize a filled matrix with the fitted parameters.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::SchemaMismatch`] when the column set differs from
    ///   fit time, or an unseen category appears under
    ///   [`UnseenCategoryPolicy::Strict`]
    /// - [`ExtractError::InvalidInput`] when missing values remain
    pub fn apply(
        &self,
        matrix: &FeatureMatrix,
        policy: UnseenCategoryPolicy,
    ) -> Result<(NormalizedMatrix, TransformReport)> {
        self.check_columns(matrix)?;
        ensure_filled(matrix)?;

        let mut out = NormalizedMatrix::new(self.output_columns.clone());
        let mut report = TransformReport::default();

        for (entity_id, row) in matrix.entity_ids().iter().zip(matrix.rows()) {
            let mut encoded = Vec::with_capacity(self.output_width());

            for ((value, spec), transform) in row.iter().zip(&self.columns).zip(&self.transforms) {
                match (transform, value) {
                    (ColumnTransform::Scale(scaler), FeatureValue::Numeric(v)) => {
                        encoded.push(scaler.normalize(*v));
                    }
                    (ColumnTransform::Binarize(binarizer), FeatureValue::Nominal(category)) => {
                        if !binarizer.encode_into(category, &mut encoded) {
                            if policy == UnseenCategoryPolicy::Strict {
                                return Err(ExtractError::SchemaMismatch(format!(
                                    "column '{}': category '{}' (entity '{}') not seen at fit time",
                                    spec.name, category, entity_id
                                )));
                            }
                            log::warn!(
                                "Unseen category '{}' in column '{}' for entity '{}', zero-filled",
                                category,
                                spec.name,
                                entity_id
                            );
                            report.unseen.push(UnseenCategory {
                                entity_id: entity_id.clone(),
                                column: spec.name.clone(),
                                category: category.clone(),
                            });
                        }
                    }
                    _ => {
                        return Err(ExtractError::SchemaMismatch(format!(
                            "column '{}' expects {:?} values, entity '{}' has '{}'",
                            spec.name, spec.kind, entity_id, value
                        )));
                    }
                }
            }

            out.push_row(entity_id.clone(), encoded)?;
        }

        Ok((out, report))
    }

    fn check_columns(&self, matrix: &FeatureMatrix) -> Result<()> {
        if matrix.width() != self.columns.len() {
            return Err(ExtractError::SchemaMismatch(format!(
                "matrix has {} columns, transform was fitted on {}",
                matrix.width(),
                self.columns.len()
            )));
        }
        for (i, (got, want)) in matrix.columns().iter().zip(&self.columns).enumerate() {
            if got.name != want.name {
                return Err(ExtractError::SchemaMismatch(format!(
                    "column {i} is '{}', transform was fitted on '{}'",
                    got.name, want.name
                )));
            }
            if got.kind != want.kind {
                return Err(ExtractError::SchemaMismatch(format!(
                    "column '{}' is {:?}, transform was fitted on {:?}",
                    got.name, got.kind, want.kind
                )));
            }
        }
        Ok(())
    }
}

fn ensure_filled(matrix: &FeatureMatrix) -> Result<()> {
    match matrix.missing_count() {
        0 => Ok(()),
        n => Err(ExtractError::InvalidInput(format!(
            "matrix holds {n} missing values; fill before normalizing"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;

    fn columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec {
                name: "n".into(),
                kind: FeatureKind::Continuous,
            },
            ColumnSpec {
                name: "c".into(),
                kind: FeatureKind::Categorical,
            },
        ]
    }

    fn matrix(rows: &[(&str, f64, &str)]) -> FeatureMatrix {
        let mut m = FeatureMatrix::with_columns("1.0.0", columns());
        for &(id, n, c) in rows {
            m.push(FeatureVector {
                entity_id: id.into(),
                values: vec![n.into(), FeatureValue::Nominal(c.into())],
            })
            .unwrap();
        }
        m
    }

    fn train() -> FeatureMatrix {
        matrix(&[("a", 1.0, "x"), ("b", 3.0, "y"), ("c", 5.0, "z")])
    }

    #[test]
    fn test_fit_output_columns() {
        let t = FittedTransform::fit(&train()).unwrap();
        assert_eq!(t.output_columns(), &["n", "c=x", "c=y", "c=z"]);
        assert_eq!(t.output_width(), 4);
        assert!(matches!(
            t.column_transform("c"),
            Some(ColumnTransform::Binarize(_))
        ));
    }

    #[test]
    fn test_apply_scales_and_encodes() {
        let m = train();
        let t = FittedTransform::fit(&m).unwrap();
        let (out, report) = t.apply(&m, UnseenCategoryPolicy::ZeroFill).unwrap();

        assert!(report.is_clean());
        assert_eq!(out.len(), 3);
        let n = out.column("n").unwrap();
        assert!((n.iter().sum::<f64>()).abs() < 1e-12);
        assert_eq!(out.row("b").unwrap()[1..], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_held_out_uses_fit_parameters() {
        let t = FittedTransform::fit(&train()).unwrap();
        let test = matrix(&[("t1", 3.0, "x")]);
        let (out, _) = t.apply(&test, UnseenCategoryPolicy::ZeroFill).unwrap();
        assert_eq!(out.row("t1").unwrap()[0], 0.0);
    }

    #[test]
    fn test_unseen_category_zero_fill_reports() {
        let t = FittedTransform::fit(&train()).unwrap();
        let test = matrix(&[("t1", 1.0, "new")]);
        let (out, report) = t.apply(&test, UnseenCategoryPolicy::ZeroFill).unwrap();
        assert_eq!(out.row("t1").unwrap()[1..], [0.0, 0.0, 0.0]);
        assert_eq!(report.unseen_count(), 1);
        assert_eq!(report.unseen[0].column, "c");
        assert_eq!(report.unseen[0].category, "new");
    }

    #[test]
    fn test_unseen_category_strict_fails() {
        let t = FittedTransform::fit(&train()).unwrap();
        let test = matrix(&[("t1", 1.0, "new")]);
        let err = t.apply(&test, UnseenCategoryPolicy::Strict).unwrap_err();
        assert!(matches!(err, ExtractError::SchemaMismatch(_)));
        assert!(err.to_string().contains("new"));
    }

    #[test]
    fn test_column_mismatch_detected() {
        let t = FittedTransform::fit(&train()).unwrap();
        let other = FeatureMatrix::with_columns(
            "1.0.0",
            vec![
                ColumnSpec {
                    name: "c".into(),
                    kind: FeatureKind::Categorical,
                },
                ColumnSpec {
                    name: "n".into(),
                    kind: FeatureKind::Continuous,
                },
            ],
        );
        assert!(matches!(
            t.apply(&other, UnseenCategoryPolicy::ZeroFill),
            Err(ExtractError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_missing_values_rejected() {
        let mut m = FeatureMatrix::with_columns("1.0.0", columns());
        m.push(FeatureVector {
            entity_id: "a".into(),
            values: vec![FeatureValue::Missing, FeatureValue::Nominal("x".into())],
        })
        .unwrap();
        assert!(matches!(
            FittedTransform::fit(&m),
            Err(ExtractError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_matrix() {
        let m = FeatureMatrix::with_columns("1.0.0", columns());
        let t = FittedTransform::fit(&m).unwrap();
        assert_eq!(t.output_columns(), &["n"]);
        let (out, report) = t.apply(&m, UnseenCategoryPolicy::ZeroFill).unwrap();
        assert!(out.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn test_serde_round_trip() {
        let t = FittedTransform::fit(&train()).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        let back: FittedTransform = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
