//! JSON file storage backend
//!
//! All keys live in one JSON object. Every mutation serializes the whole map
//! into a temporary file next to the target and renames it into place, so a
//! concurrent reader (or a crash) never observes a half-written file.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{KeyValueStore, StorageError, StorageResult};

/// File-backed key-value store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A file that does not parse as a JSON object of strings is discarded with
    /// a warning; the next write replaces it.
    ///
    /// # Errors
    /// Returns `StorageError::Io` if an existing file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "discarding unreadable session file");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(StorageError::io(&path, err)),
        };

        debug!(path = %path.display(), keys = entries.len(), "opened file store");
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` to a copy of the map, persist it, then publish it.
    fn commit<F>(&self, mutate: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        mutate(&mut next);
        if next == *entries {
            return Ok(());
        }
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;

        let serialized = serde_json::to_vec_pretty(entries)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| StorageError::io(&dir, e))?;
        tmp.write_all(&serialized).map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.as_file().sync_all().map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.persist(&self.path).map_err(|e| StorageError::io(&self.path, e.error))?;

        debug!(path = %self.path.display(), keys = entries.len(), "session file written");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.commit(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.commit(|map| {
            map.remove(key);
        })
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        self.commit(|map| {
            for (key, value) in entries {
                map.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        self.commit(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
    }
}
