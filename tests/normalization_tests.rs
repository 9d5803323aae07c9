//! Fit/apply behavior of the column-wise normalization pass.

use bidder_feature_extractor::matrix::ColumnSpec;
use bidder_feature_extractor::preprocessing::ColumnTransform;
use bidder_feature_extractor::{
    Event, EventTable, ExtractError, FeatureKind, FeatureMatrix, FeatureValue, FeatureVector,
    FittedTransform, Pipeline, PipelineConfig, UnseenCategoryPolicy,
};

fn columns(names: &[(&str, FeatureKind)]) -> Vec<ColumnSpec> {
    names
        .iter()
        .map(|(name, kind)| ColumnSpec {
            name: name.to_string(),
            kind: *kind,
        })
        .collect()
}

fn matrix(cols: &[(&str, FeatureKind)], rows: &[(&str, f64, &str)]) -> FeatureMatrix {
    let mut m = FeatureMatrix::with_columns("1.0.0", columns(cols));
    for (id, num, cat) in rows {
        m.push(FeatureVector {
            entity_id: id.to_string(),
            values: vec![
                FeatureValue::Numeric(*num),
                FeatureValue::Nominal(cat.to_string()),
            ],
        })
        .unwrap();
    }
    m
}

const COLS: [(&str, FeatureKind); 2] = [
    ("bid_nb", FeatureKind::Continuous),
    ("arg_max_country", FeatureKind::Categorical),
];

fn train() -> FeatureMatrix {
    matrix(
        &COLS,
        &[("a", 1.0, "us"), ("b", 2.0, "fr"), ("c", 3.0, "in"), ("d", 6.0, "us")],
    )
}

#[test]
fn test_scaled_columns_have_zero_mean_unit_variance() {
    let transform = FittedTransform::fit(&train()).unwrap();
    let (normalized, report) = transform
        .apply(&train(), UnseenCategoryPolicy::ZeroFill)
        .unwrap();
    assert!(report.is_clean());

    let col = normalized.column("bid_nb").unwrap();
    let n = col.len() as f64;
    let mean = col.iter().sum::<f64>() / n;
    let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    assert!(mean.abs() < 1e-12);
    assert!((var - 1.0).abs() < 1e-12);
}

#[test]
fn test_indicator_columns_per_class() {
    let transform = FittedTransform::fit(&train()).unwrap();
    assert_eq!(
        transform.output_columns(),
        &[
            "bid_nb",
            "arg_max_country=fr",
            "arg_max_country=in",
            "arg_max_country=us"
        ]
    );

    let (normalized, _) = transform
        .apply(&train(), UnseenCategoryPolicy::ZeroFill)
        .unwrap();
    assert_eq!(normalized.row("d").unwrap()[1..], [0.0, 0.0, 1.0]);
    assert_eq!(normalized.row("b").unwrap()[1..], [1.0, 0.0, 0.0]);
}

#[test]
fn test_held_out_rows_use_training_parameters() {
    let transform = FittedTransform::fit(&train()).unwrap();
    let held_out = matrix(&COLS, &[("t", 3.0, "fr")]);
    let (normalized, _) = transform
        .apply(&held_out, UnseenCategoryPolicy::ZeroFill)
        .unwrap();

    let scaler = match transform.column_transform("bid_nb") {
        Some(ColumnTransform::Scale(s)) => s,
        other => panic!("unexpected transform {other:?}"),
    };
    assert_eq!(scaler.mean(), 3.0);
    // 3.0 is the training mean: scales to zero even though it is the only row
    assert_eq!(normalized.row("t").unwrap()[0], 0.0);
}

#[test]
fn test_constant_column_maps_to_zero() {
    let m = matrix(&COLS, &[("a", 5.0, "x"), ("b", 5.0, "x")]);
    let transform = FittedTransform::fit(&m).unwrap();
    let (normalized, _) = transform.apply(&m, UnseenCategoryPolicy::ZeroFill).unwrap();
    assert_eq!(normalized.column("bid_nb").unwrap(), vec![0.0, 0.0]);
    // single class: one constant indicator
    assert_eq!(normalized.column("arg_max_country=x").unwrap(), vec![0.0, 0.0]);
}

#[test]
fn test_different_columns_is_schema_mismatch() {
    let transform = FittedTransform::fit(&train()).unwrap();

    let renamed = matrix(
        &[
            ("bid_nb", FeatureKind::Continuous),
            ("arg_max_ip", FeatureKind::Categorical),
        ],
        &[("a", 1.0, "us")],
    );
    let err = transform
        .apply(&renamed, UnseenCategoryPolicy::ZeroFill)
        .unwrap_err();
    assert!(matches!(err, ExtractError::SchemaMismatch(_)));
}

#[test]
fn test_unseen_category_policies() {
    let transform = FittedTransform::fit(&train()).unwrap();
    let held_out = matrix(&COLS, &[("t1", 1.0, "us"), ("t2", 1.0, "jp")]);

    let err = transform
        .apply(&held_out, UnseenCategoryPolicy::Strict)
        .unwrap_err();
    assert!(matches!(err, ExtractError::SchemaMismatch(_)));
    assert!(err.to_string().contains("jp"));

    let (normalized, report) = transform
        .apply(&held_out, UnseenCategoryPolicy::ZeroFill)
        .unwrap();
    assert_eq!(report.unseen_count(), 1);
    assert_eq!(report.unseen[0].entity_id, "t2");
    assert_eq!(report.unseen[0].column, "arg_max_country");
    assert_eq!(normalized.row("t2").unwrap()[1..], [0.0, 0.0, 0.0]);
}

#[test]
fn test_missing_values_rejected_before_fill() {
    let mut m = FeatureMatrix::with_columns("1.0.0", columns(&COLS));
    m.push(FeatureVector {
        entity_id: "a".to_string(),
        values: vec![FeatureValue::Missing, FeatureValue::Nominal("us".to_string())],
    })
    .unwrap();
    assert!(matches!(
        FittedTransform::fit(&m),
        Err(ExtractError::InvalidInput(_))
    ));

    assert_eq!(m.fill_missing(), 1);
    assert!(FittedTransform::fit(&m).is_ok());
}

#[test]
fn test_fitted_transform_serde_round_trip() {
    let transform = FittedTransform::fit(&train()).unwrap();
    let json = serde_json::to_string(&transform).unwrap();
    let back: FittedTransform = serde_json::from_str(&json).unwrap();
    assert_eq!(back, transform);
}

#[test]
fn test_pipeline_strict_policy_on_held_out_events() {
    let pipeline = Pipeline::from_config(
        PipelineConfig::default().with_unseen_categories(UnseenCategoryPolicy::Strict),
    )
    .unwrap();

    let train = EventTable::from_events(vec![
        Event::new("a", "1", 1.0).with_device("d1"),
        Event::new("b", "1", 2.0).with_device("d2"),
    ]);
    let fitted = pipeline.fit_transform(&train).unwrap();

    let test = EventTable::from_events(vec![Event::new("t", "2", 3.0).with_device("d9")]);
    let err = pipeline.transform(&test, &fitted.transform).unwrap_err();
    assert!(matches!(err, ExtractError::SchemaMismatch(_)));
}
