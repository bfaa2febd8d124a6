//! Local durable storage for the handful of values that outlive a session.

use crate::error::StorageError;
#[cfg(test)]
use mockall::automock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Key under which the last used stage name is stored.
pub const PLAYER_NAME_KEY: &str = "playerName";

/// A string key-value store. Writes overwrite any previous value.
#[cfg_attr(test, automock)]
pub trait LocalStore: Send + Sync {
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Keeps all items in a single JSON object on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_items(&self) -> Result<Map<String, Value>, StorageError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl LocalStore for JsonFileStore {
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.read_items()?;
        items.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // Write to a sibling file first so a crash never leaves half a document.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&items)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Process-lifetime store.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.get(key).cloned()
    }
}

impl LocalStore for MemoryStore {
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_creates_and_overwrites() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("local_storage.json");
        let store = JsonFileStore::new(&path);

        store.set_item(PLAYER_NAME_KEY, "Alex")?;
        store.set_item("theme", "dark")?;
        store.set_item(PLAYER_NAME_KEY, "Sam")?;

        let saved: Map<String, Value> = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[PLAYER_NAME_KEY], "Sam");
        assert_eq!(saved["theme"], "dark");
        Ok(())
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("local_storage.json");
        fs::write(&path, "[1, 2, 3]")?;

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.set_item(PLAYER_NAME_KEY, "Alex"),
            Err(StorageError::Format(_))
        ));
        Ok(())
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item(PLAYER_NAME_KEY), None);
        store.set_item(PLAYER_NAME_KEY, "Alex").unwrap();
        assert_eq!(store.get_item(PLAYER_NAME_KEY).as_deref(), Some("Alex"));
    }
}
