//! JSON-file-backed store implementation.

use crate::{LocalStore, StoreError, StoreResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key/value store persisted as a single pretty-printed JSON object.
///
/// The whole map is rewritten on every mutation; the data is a handful of
/// tokens and snapshots, far below the point where that matters.
pub struct FileStore {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or create) a file store at the given path.
    pub fn new(path: PathBuf) -> StoreResult<Self> {
        let data = if path.exists() {
            Self::read_map(&path)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    fn read_map(path: &Path) -> StoreResult<BTreeMap<String, String>> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Encoding(e.to_string()))
    }

    fn persist(&self, data: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(data).map_err(|e| StoreError::Encoding(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), value.to_string());
        self.persist(&data)
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let data = self.data.lock().unwrap();
        Ok(data.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut data = self.data.lock().unwrap();
        let removed = data.remove(key).is_some();
        if removed {
            self.persist(&data)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::new(path.clone()).unwrap();
        store.set("k1", "v1").unwrap();
        store.set("k2", "v2").unwrap();

        // A second instance sees persisted data
        let reopened = FileStore::new(path).unwrap();
        assert_eq!(reopened.get("k1").unwrap(), Some("v1".to_string()));
        assert_eq!(reopened.get("k2").unwrap(), Some("v2".to_string()));
    }

    #[test]
    fn test_file_store_delete_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::new(path.clone()).unwrap();
        store.set("k1", "v1").unwrap();
        assert!(store.delete("k1").unwrap());
        assert!(!store.delete("k1").unwrap());

        let reopened = FileStore::new(path).unwrap();
        assert_eq!(reopened.get("k1").unwrap(), None);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("store.json");

        let store = FileStore::new(path.clone()).unwrap();
        store.set("k", "v").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_file_store_corrupt_file_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = FileStore::new(path);
        assert!(matches!(result, Err(StoreError::Encoding(_))));
    }
}
