//! Persistence store: a small key-value abstraction the orchestrator host
//! can use to save/restore run history or lineups across process restarts.
//! Generalizes the teacher's `DataInterface`/`DataManager` dependency
//! injection pattern (`src/data.rs`) from race-data fetches to arbitrary
//! JSON-serializable values.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{SimError, SimResult};

pub trait PersistenceStore: Send + Sync {
    fn get_item(&self, key: &str) -> SimResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> SimResult<()>;
    fn remove_item(&self, key: &str) -> SimResult<()>;
}

/// Convenience helpers layered over the raw string `PersistenceStore` API.
pub trait PersistenceStoreExt: PersistenceStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> SimResult<Option<T>> {
        match self.get_item(key)? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .map_err(|e| SimError::internal("store-deserialize", e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> SimResult<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| SimError::internal("store-serialize", e.to_string()))?;
        self.set_item(key, &raw)
    }
}

impl<T: PersistenceStore + ?Sized> PersistenceStoreExt for T {}

/// In-memory store, useful for tests and for hosts that don't need
/// persistence across process restarts.
#[derive(Default)]
pub struct InMemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceStore for InMemoryStore {
    fn get_item(&self, key: &str) -> SimResult<Option<String>> {
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> SimResult<()> {
        self.items.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> SimResult<()> {
        self.items.lock().unwrap().remove(key);
        Ok(())
    }
}

/// One JSON file per key under a base directory, the file-backed
/// equivalent of the teacher's `DATA_DIR` convention in `data.rs`.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> SimResult<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)
            .map_err(|e| SimError::internal("store-init", e.to_string()))?;
        Ok(FileStore { base_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{safe_key}.json"))
    }
}

impl PersistenceStore for FileStore {
    fn get_item(&self, key: &str) -> SimResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(path)
            .map(Some)
            .map_err(|e| SimError::internal("store-read", e.to_string()))
    }

    fn set_item(&self, key: &str, value: &str) -> SimResult<()> {
        fs::write(self.path_for(key), value)
            .map_err(|e| SimError::internal("store-write", e.to_string()))
    }

    fn remove_item(&self, key: &str) -> SimResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path).map_err(|e| SimError::internal("store-remove", e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_round_trips_json() {
        let store = InMemoryStore::new();
        store.set_json("key", &vec![1, 2, 3]).unwrap();
        let value: Option<Vec<i32>> = store.get_json("key").unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[test]
    fn in_memory_store_remove_clears_value() {
        let store = InMemoryStore::new();
        store.set_item("key", "value").unwrap();
        store.remove_item("key").unwrap();
        assert_eq!(store.get_item("key").unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = std::env::temp_dir().join(format!("f1-race-predictor-test-{}", std::process::id()));
        let store = FileStore::new(&dir).unwrap();
        store.set_item("lineup", "abc").unwrap();
        drop(store);

        let reopened = FileStore::new(&dir).unwrap();
        assert_eq!(reopened.get_item("lineup").unwrap(), Some("abc".to_string()));
        reopened.remove_item("lineup").unwrap();
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = std::env::temp_dir().join(format!("f1-race-predictor-test-missing-{}", std::process::id()));
        let store = FileStore::new(&dir).unwrap();
        assert_eq!(store.get_item("nope").unwrap(), None);
        let _ = fs::remove_dir_all(&dir);
    }
}
