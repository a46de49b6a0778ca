//! Key/value persistence standing in for browser local storage.
//!
//! Values are opaque strings and every write replaces the whole value.
//! [`FileStore`] keeps all keys in one JSON object on disk; two stores
//! pointed at the same file behave like two browser tabs (last writer wins).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::CoreError;

/// Minimal string key/value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

fn poisoned() -> CoreError {
    CoreError::Internal("storage lock poisoned".into())
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let values = self.values.lock().map_err(|_| poisoned())?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        values.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Store backed by a single JSON object file.
///
/// The file is re-read on every access so separate processes observe each
/// other's writes. A missing file is an empty store; an unparsable file is
/// treated as empty and overwritten by the next write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, CoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(CoreError::Internal(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        match serde_json::from_str(&raw) {
            Ok(values) => Ok(values),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable storage file");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::Internal(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(values)
            .map_err(|e| CoreError::Internal(format!("Failed to encode storage: {e}")))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                CoreError::Internal(format!("Failed to write {}: {e}", self.path.display()))
            })
    }

    fn update(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().map_err(|_| poisoned())?;
        let mut values = self.read_all()?;
        f(&mut values);
        self.write_all(&values)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        FileStore::new(&path).set("adminToken", "x").unwrap();
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("adminToken").unwrap().as_deref(), Some("x"));

        reopened.remove("adminToken").unwrap();
        assert_eq!(FileStore::new(&path).get("adminToken").unwrap(), None);
    }

    #[test]
    fn file_store_treats_garbage_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get("anything").unwrap(), None);
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn last_writer_wins_between_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let tab_a = FileStore::new(&path);
        let tab_b = FileStore::new(&path);

        tab_a.set("k", "a").unwrap();
        tab_b.set("k", "b").unwrap();
        assert_eq!(tab_a.get("k").unwrap().as_deref(), Some("b"));
    }
}
