//! Key-value stores backing the session counters.
//!
//! `MemoryStore` plays the role of `sessionStorage` (and of `localStorage`
//! in tests); `FileStore` is the durable store, one JSON object per file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use paramsync_core::{KeyValueStore, SyncError};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Volatile in-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> SyncError {
    SyncError::storage("store lock poisoned")
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        Ok(self.entries.lock().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        self.entries
            .lock()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SyncError> {
        self.entries.lock().map_err(poisoned)?.remove(key);
        Ok(())
    }
}

/// Durable store persisted as a flat JSON object.
///
/// Every mutation rewrites the file through a temp file + rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store; an unreadable one is reported, a
    /// corrupt one is discarded with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding corrupt state file");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(SyncError::storage(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        debug!(path = %path.display(), keys = entries.len(), "Opened state file");
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &Map<String, Value>) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| SyncError::storage(format!("failed to encode state: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json.as_bytes()).map_err(|e| {
            SyncError::storage(format!("failed to write {}: {e}", tmp_path.display()))
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            SyncError::storage(format!("failed to replace {}: {e}", self.path.display()))
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.to_string(), Value::String(value.to_string()));
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), SyncError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}
