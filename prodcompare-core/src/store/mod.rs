//! Key-value storage port and the stores built on it.
//!
//! The [`KeyValueStore`] trait stands in for browser local storage: string
//! values under string keys, synchronous, last writer wins. Two backends are
//! provided:
//! - `InMemoryStore`: process-local map, used in tests and one-shot runs.
//! - `JsonDirStore`: one JSON file per key inside a directory.
//!
//! Stores that find a value they cannot parse treat it as empty and remove it.

pub mod comments;
pub mod favorites;
pub mod selection;

pub use comments::CommentStore;
pub use favorites::FavoritesStore;
pub use selection::SelectionStore;

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::StoreError;
use crate::persistence::atomic_write;

/// Storage key of the comparison selection.
pub const SELECTION_KEY: &str = "product-comparison";
/// Storage key of the favorites set.
pub const FAVORITES_KEY: &str = "product-favorites";
/// Storage key of the comment list.
pub const COMMENTS_KEY: &str = "product-comments";
/// Storage key of the signed-in user.
pub const SESSION_KEY: &str = "auth-user";

/// Synchronous string key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Shared storage handle used by every store.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Process-local storage backed by a `Mutex<HashMap>`.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a fresh in-memory store in an `Arc` for shared use.
    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Directory-backed storage: each key is kept in `<dir>/<key>.json`.
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonDirStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::ReadFailed {
                    key: key.to_string(),
                    message: e.to_string(),
                });
            }
        };
        match String::from_utf8(bytes) {
            Ok(content) => Ok(Some(content)),
            Err(e) => {
                // Not text at all, so no reader can use it.
                tracing::warn!(key, error = %e, "discarding non-UTF-8 persisted value");
                self.remove(key)?;
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        atomic_write(&path, value.as_bytes()).map_err(|e| StoreError::WriteFailed {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::WriteFailed {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// Read and parse `key`. A value that fails to parse is logged, removed, and
/// reported as absent.
pub(crate) fn load_or_reset<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding corrupt persisted value");
            store.remove(key)?;
            Ok(None)
        }
    }
}

/// Serialize `value` as JSON under `key`.
pub(crate) fn save<T: serde::Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string(value).map_err(|e| StoreError::WriteFailed {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(key, &json)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_set_get_remove() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v2".to_string()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_json_dir_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path().join("store"));
        store.set(SELECTION_KEY, "[\"1\"]").unwrap();
        assert!(dir.path().join("store").join("product-comparison.json").exists());
        assert_eq!(
            store.get(SELECTION_KEY).unwrap(),
            Some("[\"1\"]".to_string())
        );
        store.remove(SELECTION_KEY).unwrap();
        store.remove(SELECTION_KEY).unwrap();
        assert_eq!(store.get(SELECTION_KEY).unwrap(), None);
    }

    #[test]
    fn test_json_dir_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(store.get("").is_err());
    }

    #[test]
    fn test_json_dir_store_discards_non_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        let path = dir.path().join("product-comparison.json");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        assert_eq!(store.get(SELECTION_KEY).unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_stores_open_over_non_utf8_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("product-comparison.json"), [0xff, 0xfe, 0x00]).unwrap();
        std::fs::write(dir.path().join("product-comments.json"), [0xc3, 0x28]).unwrap();
        let store: SharedStore = Arc::new(JsonDirStore::new(dir.path()));

        let selection = SelectionStore::open(store.clone()).unwrap();
        assert!(selection.is_empty());
        let comments = CommentStore::open(store).unwrap();
        assert!(comments.all().is_empty());
        assert!(!dir.path().join("product-comments.json").exists());
    }

    #[test]
    fn test_load_or_reset_clears_corrupt_value() {
        let store = InMemoryStore::new();
        store.set("ids", "{broken").unwrap();
        let loaded: Option<Vec<String>> = load_or_reset(&store, "ids").unwrap();
        assert_eq!(loaded, None);
        assert_eq!(store.get("ids").unwrap(), None);
    }

    #[test]
    fn test_load_or_reset_wrong_shape_is_corrupt() {
        let store = InMemoryStore::new();
        store.set("ids", "{\"not\": \"an array\"}").unwrap();
        let loaded: Option<Vec<String>> = load_or_reset(&store, "ids").unwrap();
        assert_eq!(loaded, None);
    }
}
