//! Cached runs against a filesystem artifact store.

use bidder_feature_extractor::cache::{
    get_or_compute, FITTED_TRANSFORM, TRAIN_ANSWER, TRAIN_DATA_SET, TRAIN_FEATURES, TRAIN_IDS,
};
use bidder_feature_extractor::{
    run_cached, ArtifactStore, Event, EventTable, ExtractError, FileArtifactStore, LabelMap,
    Pipeline,
};
use std::cell::Cell;
use tempfile::TempDir;

fn events() -> EventTable {
    EventTable::from_events(vec![
        Event::new("A", "1", 10.0).with_ip("x").with_country("us"),
        Event::new("B", "1", 11.5).with_ip("z").with_country("fr"),
        Event::new("A", "1", 20.0).with_ip("x").with_country("us"),
        Event::new("A", "2", 15.0).with_ip("y"),
        Event::new("C", "3", 12.25).with_device("d1"),
    ])
}

#[test]
fn test_second_run_never_loads_events() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new();
    let loads = Cell::new(0);

    let first = {
        let mut store = FileArtifactStore::open(dir.path()).unwrap();
        run_cached(&mut store, &pipeline, || {
            loads.set(loads.get() + 1);
            Ok(events())
        })
        .unwrap()
    };
    assert_eq!(loads.get(), 1);
    assert_eq!(
        first.computed,
        vec![TRAIN_FEATURES, TRAIN_IDS, FITTED_TRANSFORM, TRAIN_DATA_SET]
    );
    for name in [TRAIN_FEATURES, TRAIN_IDS, FITTED_TRANSFORM, TRAIN_DATA_SET] {
        assert!(dir.path().join(format!("{name}.json")).exists(), "{name}");
    }

    // Fresh store over the same directory, as a new process would see it.
    let mut store = FileArtifactStore::open(dir.path()).unwrap();
    let second = run_cached(&mut store, &pipeline, || {
        loads.set(loads.get() + 1);
        Ok(EventTable::new())
    })
    .unwrap();

    assert_eq!(loads.get(), 1);
    assert!(second.fully_cached());
    assert_eq!(second.entity_ids, vec!["A", "B", "C"]);
    assert_eq!(second.raw, first.raw);
    assert_eq!(second.transform, first.transform);
    assert_eq!(second.normalized, first.normalized);
}

#[test]
fn test_removed_artifact_is_recomputed_without_loading() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new();
    let mut store = FileArtifactStore::open(dir.path()).unwrap();
    run_cached(&mut store, &pipeline, || Ok(events())).unwrap();

    store.remove(TRAIN_DATA_SET).unwrap();
    let run = run_cached(&mut store, &pipeline, || {
        Err(ExtractError::generic("events must not be loaded"))
    })
    .unwrap();
    assert_eq!(run.computed, vec![TRAIN_DATA_SET]);
}

#[test]
fn test_stale_id_list_is_reported() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new();
    let mut store = FileArtifactStore::open(dir.path()).unwrap();
    run_cached(&mut store, &pipeline, || Ok(events())).unwrap();

    // Same ids, different order: alignment is by key, so this is stale.
    store
        .put(TRAIN_IDS, &vec!["B".to_string(), "A".to_string(), "C".to_string()])
        .unwrap();
    let err = run_cached(&mut store, &pipeline, || Ok(events())).unwrap_err();
    assert!(matches!(err, ExtractError::SchemaMismatch(_)));
    assert!(err.to_string().contains(TRAIN_IDS));
}

#[test]
fn test_corrupt_artifact_names_artifact() {
    let dir = TempDir::new().unwrap();
    let mut store = FileArtifactStore::open(dir.path()).unwrap();
    std::fs::write(store.path_of(TRAIN_FEATURES), "{not json").unwrap();

    let err = run_cached(&mut store, &Pipeline::new(), || Ok(events())).unwrap_err();
    match err {
        ExtractError::Artifact { name, .. } => assert_eq!(name, TRAIN_FEATURES),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_labels_cached_as_train_answer() {
    let dir = TempDir::new().unwrap();
    let mut store = FileArtifactStore::open(dir.path()).unwrap();

    let (labels, hit) = get_or_compute(&mut store, TRAIN_ANSWER, || {
        let mut labels = LabelMap::new();
        labels.insert("A", 1)?;
        labels.insert("B", 0)?;
        Ok(labels)
    })
    .unwrap();
    assert!(!hit);

    let (cached, hit): (LabelMap, bool) = get_or_compute(&mut store, TRAIN_ANSWER, || {
        Err(ExtractError::generic("labels must not be reloaded"))
    })
    .unwrap();
    assert!(hit);
    assert_eq!(cached, labels);
}
