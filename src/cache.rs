//! Named artifact store and cached pipeline runs.
//!
//! Intermediate results are persisted under fixed names. An artifact that
//! exists short-circuits its stage; nothing is invalidated automatically,
//! so stale artifacts must be removed to force recomputation.
//!
//! | Name | Content |
//! |------|---------|
//! | `train_ids` | entity ids, row order of the raw matrix |
//! | `train` | filled raw [`FeatureMatrix`] |
//! | `fitted_transform` | [`FittedTransform`] fitted on `train` |
//! | `train_data_set` | [`NormalizedMatrix`] |
//! | `train_answer` | [`LabelMap`](crate::labels::LabelMap) |
//!
//! Extraction stays a pure function of its inputs; caching wraps it from
//! the outside through [`run_cached`].

use crate::error::{ExtractError, Result};
use crate::events::EventTable;
use crate::matrix::{FeatureMatrix, NormalizedMatrix};
use crate::pipeline::Pipeline;
use crate::preprocessing::FittedTransform;
use ahash::AHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Entity id list.
pub const TRAIN_IDS: &str = "train_ids";
/// Raw, filled feature matrix.
pub const TRAIN_FEATURES: &str = "train";
/// Normalized feature matrix.
pub const TRAIN_DATA_SET: &str = "train_data_set";
/// Fitted normalization parameters.
pub const FITTED_TRANSFORM: &str = "fitted_transform";
/// Entity id to label map.
pub const TRAIN_ANSWER: &str = "train_answer";

/// Storage of serialized artifacts by name.
pub trait ArtifactStore {
    /// Whether an artifact is present.
    fn exists(&self, name: &str) -> Result<bool>;

    /// Serialized content, `None` if absent.
    fn read_raw(&self, name: &str) -> Result<Option<String>>;

    /// Store serialized content, replacing any previous value.
    fn write_raw(&mut self, name: &str, content: &str) -> Result<()>;

    /// Delete an artifact. Removing an absent artifact is not an error.
    fn remove(&mut self, name: &str) -> Result<()>;

    /// Deserialize an artifact.
    fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>>
    where
        Self: Sized,
    {
        match self.read_raw(name)? {
            Some(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| ExtractError::artifact(name, format!("unreadable: {e}"))),
            None => Ok(None),
        }
    }

    /// Serialize and store an artifact.
    fn put<T: Serialize>(&mut self, name: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        let content = serde_json::to_string(value)?;
        self.write_raw(name, &content)
    }
}

fn check_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && !name.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(ExtractError::artifact(name, "invalid artifact name"))
    }
}

/// Artifacts as `<root>/<name>.json`.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    root: PathBuf,
}

impl FileArtifactStore {
    /// Open a store, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing an artifact.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}

impl ArtifactStore for FileArtifactStore {
    fn exists(&self, name: &str) -> Result<bool> {
        check_name(name)?;
        Ok(self.path_of(name).is_file())
    }

    fn read_raw(&self, name: &str) -> Result<Option<String>> {
        check_name(name)?;
        let path = self.path_of(name);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn write_raw(&mut self, name: &str, content: &str) -> Result<()> {
        check_name(name)?;
        // Replaced atomically via rename.
        let tmp = self.root.join(format!(".{name}.json.tmp"));
        fs::write(&tmp, content)?;
        fs::rename(&tmp, self.path_of(name))?;
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        check_name(name)?;
        let path = self.path_of(name);
        if path.is_file() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactStore {
    entries: AHashMap<String, String>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn exists(&self, name: &str) -> Result<bool> {
        check_name(name)?;
        Ok(self.entries.contains_key(name))
    }

    fn read_raw(&self, name: &str) -> Result<Option<String>> {
        check_name(name)?;
        Ok(self.entries.get(name).cloned())
    }

    fn write_raw(&mut self, name: &str, content: &str) -> Result<()> {
        check_name(name)?;
        self.entries.insert(name.to_string(), content.to_string());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        check_name(name)?;
        self.entries.remove(name);
        Ok(())
    }
}

/// Load an artifact, or compute and store it.
///
/// Returns the value and whether it came from the store.
pub fn get_or_compute<S, T, F>(store: &mut S, name: &str, compute: F) -> Result<(T, bool)>
where
    S: ArtifactStore,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T>,
{
    if let Some(value) = store.get(name)? {
        log::info!("Cache hit: {name}");
        return Ok((value, true));
    }
    log::info!("Cache miss: {name}, computing");
    let value = compute()?;
    store.put(name, &value)?;
    Ok((value, false))
}

/// Artifacts of a cached training run.
#[derive(Debug, Clone)]
pub struct CachedRun {
    pub entity_ids: Vec<String>,
    pub raw: FeatureMatrix,
    pub transform: FittedTransform,
    pub normalized: NormalizedMatrix,

    /// Names of artifacts computed (not loaded) in this run.
    pub computed: Vec<&'static str>,
}

impl CachedRun {
    /// True when every artifact came from the store.
    pub fn fully_cached(&self) -> bool {
        self.computed.is_empty()
    }
}

/// Run extraction and normalization through an artifact store.
///
/// `load_events` is called at most once, and only when the raw matrix is
/// not in the store. The stored id list must match the raw matrix's row
/// keys and the stored normalized matrix must match both; otherwise the
/// store holds artifacts from different runs and a
/// [`ExtractError::SchemaMismatch`] is returned.
pub fn run_cached<S, F>(store: &mut S, pipeline: &Pipeline, load_events: F) -> Result<CachedRun>
where
    S: ArtifactStore,
    F: FnOnce() -> Result<EventTable>,
{
    let mut computed = Vec::new();

    let (raw, hit) = get_or_compute(store, TRAIN_FEATURES, || {
        let events = load_events()?;
        let extraction = pipeline.extract(&events)?;
        for skipped in &extraction.skipped {
            log::warn!("Entity '{}' not in matrix: {}", skipped.entity_id, skipped.error);
        }
        Ok(extraction.matrix)
    })?;
    mark(&mut computed, TRAIN_FEATURES, hit);

    let (entity_ids, hit): (Vec<String>, bool) =
        get_or_compute(store, TRAIN_IDS, || Ok(raw.entity_ids().to_vec()))?;
    mark(&mut computed, TRAIN_IDS, hit);

    if entity_ids.as_slice() != raw.entity_ids() {
        return Err(stale(TRAIN_IDS, TRAIN_FEATURES));
    }

    let (transform, hit) = get_or_compute(store, FITTED_TRANSFORM, || pipeline.fit(&raw))?;
    mark(&mut computed, FITTED_TRANSFORM, hit);

    let (normalized, hit) = get_or_compute(store, TRAIN_DATA_SET, || {
        pipeline.apply(&raw, &transform).map(|(normalized, _)| normalized)
    })?;
    mark(&mut computed, TRAIN_DATA_SET, hit);

    if normalized.entity_ids() != entity_ids.as_slice() {
        return Err(stale(TRAIN_DATA_SET, TRAIN_IDS));
    }
    if normalized.columns() != transform.output_columns() {
        return Err(stale(TRAIN_DATA_SET, FITTED_TRANSFORM));
    }

    Ok(CachedRun {
        entity_ids,
        raw,
        transform,
        normalized,
        computed,
    })
}

fn mark(computed: &mut Vec<&'static str>, name: &'static str, hit: bool) {
    if !hit {
        computed.push(name);
    }
}

fn stale(a: &str, b: &str) -> ExtractError {
    ExtractError::SchemaMismatch(format!(
        "cached artifacts '{a}' and '{b}' disagree; remove stale artifacts to recompute"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use std::cell::Cell;

    fn events() -> EventTable {
        EventTable::from_events(vec![
            Event::new("A", "1", 10.0).with_ip("x"),
            Event::new("B", "2", 11.0).with_ip("y"),
            Event::new("A", "1", 20.0).with_ip("x"),
        ])
    }

    #[test]
    fn test_memory_store_contract() {
        let mut store = MemoryArtifactStore::new();
        assert!(!store.exists("k").unwrap());
        assert_eq!(store.get::<Vec<u32>>("k").unwrap(), None);

        store.put("k", &vec![1u32, 2, 3]).unwrap();
        assert!(store.exists("k").unwrap());
        assert_eq!(store.get::<Vec<u32>>("k").unwrap(), Some(vec![1, 2, 3]));

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalid_names_rejected() {
        let store = MemoryArtifactStore::new();
        for name in ["", "../x", "a/b", ".hidden"] {
            assert!(store.exists(name).is_err(), "{name:?}");
        }
    }

    #[test]
    fn test_unreadable_artifact() {
        let mut store = MemoryArtifactStore::new();
        store.write_raw("bad", "not json").unwrap();
        let err = store.get::<Vec<u32>>("bad").unwrap_err();
        assert!(matches!(err, ExtractError::Artifact { .. }));
    }

    #[test]
    fn test_run_cached_loads_once() {
        let mut store = MemoryArtifactStore::new();
        let pipeline = Pipeline::new();
        let calls = Cell::new(0);

        let first = run_cached(&mut store, &pipeline, || {
            calls.set(calls.get() + 1);
            Ok(events())
        })
        .unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(first.computed.len(), 4);
        assert_eq!(first.entity_ids, vec!["A", "B"]);

        let second = run_cached(&mut store, &pipeline, || {
            calls.set(calls.get() + 1);
            Ok(events())
        })
        .unwrap();
        assert_eq!(calls.get(), 1);
        assert!(second.fully_cached());
        assert_eq!(second.normalized, first.normalized);
    }

    #[test]
    fn test_removed_stage_recomputed_without_loading() {
        let mut store = MemoryArtifactStore::new();
        let pipeline = Pipeline::new();
        run_cached(&mut store, &pipeline, || Ok(events())).unwrap();

        store.remove(TRAIN_DATA_SET).unwrap();
        let run = run_cached(&mut store, &pipeline, || {
            Err(ExtractError::generic("loader must not run"))
        })
        .unwrap();
        assert_eq!(run.computed, vec![TRAIN_DATA_SET]);
    }

    #[test]
    fn test_stale_ids_detected() {
        let mut store = MemoryArtifactStore::new();
        let pipeline = Pipeline::new();
        store
            .put(TRAIN_IDS, &vec!["B".to_string(), "A".to_string()])
            .unwrap();

        let err = run_cached(&mut store, &pipeline, || Ok(events())).unwrap_err();
        assert!(matches!(err, ExtractError::SchemaMismatch(_)));
    }
}
