use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::warn;

use super::KeyValueStore;
use crate::domain::error::{AppError, Result};

pub const STORE_FILE_NAME: &str = "storage.json";

/// A single JSON object on disk, read and rewritten whole on every call.
pub struct FileStore {
    path: PathBuf,
    // Serializes file access within the process; it is released between calls.
    io: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io: Mutex::new(()),
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&content) {
            Ok(map) => Ok(map),
            Err(err) => {
                // A damaged file should not lock the user out; start over.
                warn!(path = %self.path.display(), error = %err, "Discarding unreadable store file");
                Ok(BTreeMap::new())
            }
        }
    }

    /// Writes a sibling temp file and renames it over the store, so a crash
    /// mid-write leaves the previous contents in place.
    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent)?;
        }
        let content = serde_json::to_string_pretty(map)?;
        let mut staged = NamedTempFile::new_in(&parent)?;
        staged.write_all(content.as_bytes())?;
        staged.as_file().sync_all()?;
        staged
            .persist(&self.path)
            .map_err(|e| AppError::PersistenceError(format!("Failed to replace store file: {}", e)))?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.io
            .lock()
            .map_err(|e| AppError::Internal(format!("file store poisoned: {}", e)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock()?;
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock()?;
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock()?;
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kv_store::{CREDENTIAL_KEY, HISTORY_KEY};

    #[test]
    fn test_values_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        store.set("theme", "dark").unwrap();

        let reopened = FileStore::in_dir(dir.path());
        assert_eq!(reopened.get("theme").unwrap(), Some("dark".to_string()));
    }

    #[test]
    fn test_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("deeper").join("s.json"));
        store.set("a", "1").unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_remove_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn test_abandoned_staging_file_leaves_store_intact() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        store.set(CREDENTIAL_KEY, "hf_abcdefghijk").unwrap();
        store.set(HISTORY_KEY, "[]").unwrap();

        // A writer that died before its rename leaves only a half-written sibling.
        let full = fs::read_to_string(store.path()).unwrap();
        fs::write(dir.path().join(".tmpdead"), &full[..full.len() / 2]).unwrap();

        let reopened = FileStore::in_dir(dir.path());
        assert_eq!(
            reopened.get(CREDENTIAL_KEY).unwrap(),
            Some("hf_abcdefghijk".to_string())
        );
        assert_eq!(reopened.get(HISTORY_KEY).unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn test_writes_leave_no_staging_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        for n in 0..5 {
            store.set("k", &n.to_string()).unwrap();
        }
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(STORE_FILE_NAME)]);
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        let store = FileStore::new(&path);
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));
    }
}
