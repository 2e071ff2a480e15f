//! In-memory key-value store.

use std::collections::HashMap;

use parking_lot::RwLock;
use tally_application::ports::{KeyValueStore, KeyValueStoreError};

/// Key-value store that lives as long as the process.
///
/// Used when no config directory is available and as the backing store of
/// a simulated cloud mirror.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.entries.write().remove(key);
        Ok(())
    }
}
