//! Filter-state persistence behind a key/value storage collaborator.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use taskboard_core::FilterState;
use thiserror::Error;
use tracing::{debug, warn};

/// Storage key the filter state lives under.
pub const FILTER_STORAGE_KEY: &str = "task-tracker-filters";

/// Errors raised by [`FilterStorage`] implementations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem access failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Filter state could not be encoded.
    #[error("failed to serialize filter state: {0}")]
    Serialize(#[from] serde_json::Error),

    /// In-memory storage lock was poisoned.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// String key/value storage, read at startup and written after each filter change.
pub trait FilterStorage {
    /// Stored value for `key`, if any.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be read. A missing key is `Ok(None)`.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error when the backend cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: FilterStorage + ?Sized> FilterStorage for &S {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value)
    }
}

/// Process-local storage, used in tests and when persistence is disabled.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with one entry.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::new();
        if let Ok(mut entries) = storage.entries.lock() {
            entries.insert(key.to_owned(), value.to_owned());
        }
        storage
    }
}

impl FilterStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`; the directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl FilterStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(key);
        fs::write(&path, value).map_err(|source| StorageError::Io { path, source })
    }
}

/// Read the persisted filter state.
///
/// Missing, unreadable, or malformed entries yield the empty state; the failure is only
/// logged.
#[must_use]
pub fn load_filters(storage: &impl FilterStorage) -> FilterState {
    let raw = match storage.read(FILTER_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("no persisted filter state");
            return FilterState::new();
        }
        Err(err) => {
            warn!(error = %err, "failed to read persisted filter state");
            return FilterState::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!(error = %err, "discarding malformed persisted filter state");
        FilterState::new()
    })
}

/// Persist `filters` under [`FILTER_STORAGE_KEY`].
///
/// # Errors
/// Returns an error when encoding or writing fails.
pub fn save_filters(storage: &impl FilterStorage, filters: &FilterState) -> Result<(), StorageError> {
    let encoded = serde_json::to_string(filters)?;
    storage.write(FILTER_STORAGE_KEY, &encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::{Category, DateRange, Status};
    use tempfile::tempdir;
    use time::macros::date;

    fn sample() -> FilterState {
        FilterState::from_parts(
            vec![Status::Done],
            vec![Category::B, Category::A],
            DateRange::new(Some(date!(2025 - 09 - 01)), None),
            "deploy",
        )
    }

    #[test]
    fn missing_entry_loads_the_empty_state() {
        let storage = MemoryStorage::new();
        assert!(load_filters(&storage).is_empty());
    }

    #[test]
    fn malformed_entry_falls_back_silently() {
        let storage = MemoryStorage::with_entry(FILTER_STORAGE_KEY, "{not json");
        assert_eq!(load_filters(&storage), FilterState::new());
    }

    #[test]
    fn saved_state_is_restored() {
        let storage = MemoryStorage::new();
        save_filters(&storage, &sample()).unwrap_or_else(|err| panic!("save: {err}"));
        assert_eq!(load_filters(&storage), sample());
    }

    #[test]
    fn stored_json_uses_the_wire_field_names() {
        let storage = MemoryStorage::new();
        save_filters(&storage, &sample()).unwrap_or_else(|err| panic!("save: {err}"));
        let raw = storage
            .read(FILTER_STORAGE_KEY)
            .unwrap_or_else(|err| panic!("read: {err}"))
            .unwrap_or_else(|| panic!("entry missing"));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap_or_else(|err| panic!("json: {err}"));
        assert_eq!(value["selectedStatuses"], serde_json::json!(["done"]));
        assert_eq!(value["selectedCategories"], serde_json::json!(["B", "A"]));
        assert_eq!(value["dateRange"]["start"], "2025-09-01");
        assert_eq!(value["dateRange"]["end"], serde_json::Value::Null);
        assert_eq!(value["searchQuery"], "deploy");
    }

    #[test]
    fn partial_entry_fills_missing_fields_with_defaults() {
        let storage = MemoryStorage::with_entry(FILTER_STORAGE_KEY, r#"{"selectedStatuses":["todo"]}"#);
        let filters = load_filters(&storage);
        assert_eq!(filters.selected_statuses(), [Status::Todo]);
        assert!(filters.selected_categories().is_empty());
        assert!(!filters.date_range().is_bounded());
    }

    #[test]
    fn file_storage_writes_one_file_per_key() {
        let dir = tempdir().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let storage = FileStorage::new(dir.path().join("state"));

        assert_eq!(storage.read(FILTER_STORAGE_KEY).ok().flatten(), None);
        save_filters(&storage, &sample()).unwrap_or_else(|err| panic!("save: {err}"));

        let path = dir.path().join("state").join("task-tracker-filters.json");
        assert!(path.exists());
        assert_eq!(load_filters(&storage), sample());
    }

    #[test]
    fn file_storage_recovers_from_garbage() {
        let dir = tempdir().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let storage = FileStorage::new(dir.path());
        fs::write(storage.path_for(FILTER_STORAGE_KEY), "[1, 2")
            .unwrap_or_else(|err| panic!("write: {err}"));
        assert!(load_filters(&storage).is_empty());
    }
}
