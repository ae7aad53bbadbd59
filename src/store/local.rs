//! Persistent local consent store.
//!
//! `localStorage`-style backend: plain string key/value pairs with no expiry.
//! Values persist until explicitly overwritten or the backing file is removed.
//! Redundancy layer only; the cookie jar stays authoritative at merge time.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::errors::ConsentError;
use crate::store::ConsentStore;

/// Consent store backed by an in-memory map, optionally persisted to a JSON
/// file. Loads tolerantly (missing or corrupt file = empty store).
#[derive(Default)]
pub struct LocalValueStore {
    path: Option<PathBuf>,
    map: Mutex<HashMap<String, String>>,
}

impl LocalValueStore {
    /// In-memory store without persistence.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Store persisted to a JSON file at `path`.
    pub fn with_file(path: PathBuf) -> Self {
        let map = fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str::<HashMap<String, String>>(&s).ok())
            .unwrap_or_default();

        Self {
            path: Some(path),
            map: Mutex::new(map),
        }
    }

    fn save(&self, map: &HashMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let contents = serde_json::to_string_pretty(map).context("serialize local store")?;
        fs::write(path, contents).map_err(|e| {
            ConsentError::StorageUnavailable(format!("local store at {}: {e}", path.display())).into()
        })
    }
}

impl ConsentStore for LocalValueStore {
    fn read(&self, key: &str) -> Option<String> {
        self.map.lock().ok()?.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| ConsentError::StorageUnavailable("local store lock poisoned".into()))?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_contract() {
        let store = LocalValueStore::in_memory();
        assert!(store.read("missing").is_none());

        store.write("a", "1").unwrap();
        store.write("b", "2").unwrap();
        assert_eq!(store.read("a").as_deref(), Some("1"));
        assert_eq!(store.read("b").as_deref(), Some("2"));

        // overwrite
        store.write("a", "ONE").unwrap();
        assert_eq!(store.read("a").as_deref(), Some("ONE"));
    }

    #[test]
    fn values_have_no_expiry() {
        // Nothing in the record carries a timestamp; a value written is a
        // value read, whenever it is read.
        let store = LocalValueStore::in_memory();
        store.write("cookie-consent", "custom").unwrap();
        assert_eq!(store.read("cookie-consent").as_deref(), Some("custom"));
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consent.json");

        let store = LocalValueStore::with_file(path.clone());
        store.write("cookie-analytics", "true").unwrap();
        drop(store);

        let reopened = LocalValueStore::with_file(path);
        assert_eq!(reopened.read("cookie-analytics").as_deref(), Some("true"));
    }

    #[test]
    fn corrupt_file_opens_as_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consent.json");
        fs::write(&path, "]]").unwrap();

        let store = LocalValueStore::with_file(path);
        assert!(store.read("cookie-consent").is_none());
    }
}
