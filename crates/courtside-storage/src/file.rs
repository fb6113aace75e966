//! File-backed [`KeyValueStore`].

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::{KeyValueStore, StorageError, StorageResult};

/// A [`KeyValueStore`] persisted as one JSON object on disk.
///
/// The whole map is kept in memory and rewritten on every change. Writes
/// go to a sibling temp file, synced to disk, that is then renamed over
/// the real one, so a crash mid-write leaves the previous contents intact.
/// The in-memory map only changes once the write has succeeded.
///
/// A file that exists but doesn't parse is treated like a missing one:
/// the cache starts empty and the next write replaces the corrupt file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens (or prepares to create) the store at `path`.
    ///
    /// # Errors
    /// Returns [`StorageError::Io`] if the file exists but can't be read.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(err @ StorageError::Corrupt { .. }) => {
                warn!(error = %err, "ignoring corrupt credential file");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        debug!(path = %path.display(), keys = entries.len(), "credential file opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(entries).map_err(|e| {
            StorageError::Corrupt {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent)?;
                Some(parent)
            }
            _ => None,
        };

        let tmp = self.path.with_extension("tmp");
        let written = (|| -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)?;
            if let Some(dir) = dir {
                if let Ok(dir) = fs::File::open(dir) {
                    let _ = dir.sync_all();
                }
            }
            Ok(())
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries.lock().map_err(|_| StorageError::Poisoned)
    }
}

fn load_entries(path: &Path) -> StorageResult<BTreeMap<String, String>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(BTreeMap::new());
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&raw).map_err(|e| StorageError::Corrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.lock()?;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        let mut entries = self.lock()?;
        if !entries.contains_key(key) {
            return Ok(false);
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn temp_path() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds").join("credentials.json");
        (dir, path)
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let (_dir, path) = temp_path();
        let store = FileStore::open(path).unwrap();
        assert_eq!(store.get("accessToken").unwrap(), None);
        assert!(!store.path().exists(), "nothing written until first set");
    }

    #[test]
    fn test_values_survive_reopen() {
        let (_dir, path) = temp_path();
        {
            let store = FileStore::open(&path).unwrap();
            store.set("accessToken", "\"a-1\"").unwrap();
            store.set("refreshToken", "\"r-1\"").unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();

        assert_eq!(reopened.get("accessToken").unwrap().as_deref(), Some("\"a-1\""));
        assert_eq!(reopened.get("refreshToken").unwrap().as_deref(), Some("\"r-1\""));
    }

    #[test]
    fn test_remove_is_persisted() {
        let (_dir, path) = temp_path();
        let store = FileStore::open(&path).unwrap();
        store.set("userData", "{}").unwrap();

        assert!(store.remove("userData").unwrap());

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("userData").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_treated_as_empty() {
        let (_dir, path) = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{ this is not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("accessToken").unwrap(), None);

        store.set("accessToken", "\"a-2\"").unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("accessToken").unwrap().as_deref(), Some("\"a-2\""));
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let (_dir, path) = temp_path();
        let store = FileStore::open(&path).unwrap();
        store.set("accessToken", "\"a-1\"").unwrap();

        // Replace the parent directory with a plain file so the next write fails.
        let parent = path.parent().unwrap();
        fs::remove_dir_all(parent).unwrap();
        fs::write(parent, b"in the way").unwrap();

        assert!(store.set("accessToken", "\"a-2\"").is_err());
        assert!(store.remove("accessToken").is_err());
        assert_eq!(store.get("accessToken").unwrap().as_deref(), Some("\"a-1\""));
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let (_dir, path) = temp_path();
        let store = FileStore::open(&path).unwrap();
        store.set("accessToken", "\"a-1\"").unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
