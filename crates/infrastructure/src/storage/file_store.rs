//! File-backed key-value store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tally_application::ports::{KeyValueStore, KeyValueStoreError};

use crate::serialization::{from_json, to_json_stable};

/// File name of the local store inside the config directory.
pub const LOCAL_STORAGE_FILE: &str = "local-storage.json";

/// Key-value store persisted as one JSON object in a file.
///
/// Entries are cached in memory and the whole file is rewritten on every
/// change, through a temporary file so a crash never leaves it half written.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Opens the store at `path`.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// logged and replaced on the next write.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::read_entries(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Opens the store in the platform config directory.
    ///
    /// Returns `None` when the platform has no config directory.
    #[must_use]
    pub fn open_default() -> Option<Self> {
        Self::default_path().map(Self::open)
    }

    /// Returns the default location of the store.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        super::config_dir().map(|dir| dir.join(LOCAL_STORAGE_FILE))
    }

    /// Returns the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(path: &Path) -> BTreeMap<String, String> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Local storage unreadable");
                return BTreeMap::new();
            }
        };

        from_json(&content).unwrap_or_else(|error| {
            tracing::warn!(path = %path.display(), %error, "Local storage corrupt, starting empty");
            BTreeMap::new()
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), KeyValueStoreError> {
        let json = to_json_stable(entries)
            .map_err(|e| KeyValueStoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove_item(&self, key: &str) -> Result<(), KeyValueStoreError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn default_path_is_under_tally() {
        if let Some(path) = FileKeyValueStore::default_path() {
            assert!(path.ends_with("tally/local-storage.json"));
        }
    }

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(LOCAL_STORAGE_FILE);

        let store = FileKeyValueStore::open(&path);
        assert_eq!(store.get_item("app-storage").unwrap(), None);
        store.set_item("app-storage", r#"{"theme":"dark"}"#).unwrap();
        store.set_item("other", "1").unwrap();
        store.remove_item("other").unwrap();

        let reopened = FileKeyValueStore::open(&path);
        assert_eq!(
            reopened.get_item("app-storage").unwrap().as_deref(),
            Some(r#"{"theme":"dark"}"#)
        );
        assert_eq!(reopened.get_item("other").unwrap(), None);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_starts_empty_and_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOCAL_STORAGE_FILE);
        fs::write(&path, "{not json").unwrap();

        let store = FileKeyValueStore::open(&path);
        assert_eq!(store.get_item("app-storage").unwrap(), None);

        store.set_item("app-storage", "{}").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"app-storage\""));
    }
}
