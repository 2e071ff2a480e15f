//! Settings object persisted under a single key-value store entry.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tally_domain::{APP_STORAGE_KEY, StorageKey};

use crate::ports::KeyValueStore;

/// JSON object of settings keyed by [`StorageKey`] names.
///
/// The object is loaded once and kept in memory; every mutation is written
/// back immediately. Unreadable content never fails an operation: it is
/// logged and replaced by the defaults.
pub struct AppStorage {
    backend: Arc<dyn KeyValueStore>,
    state: RwLock<Map<String, Value>>,
}

impl AppStorage {
    /// Loads the settings object from `backend`.
    #[must_use]
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Self {
        let state = Self::load_initial(backend.as_ref());
        Self {
            backend,
            state: RwLock::new(state),
        }
    }

    fn defaults() -> Map<String, Value> {
        Map::new()
    }

    fn load_initial(backend: &dyn KeyValueStore) -> Map<String, Value> {
        let raw = match backend.get_item(APP_STORAGE_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return Self::defaults(),
            Err(error) => {
                tracing::error!(%error, "Storage read error");
                return Self::defaults();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                tracing::error!(kind = json_kind(&other), "Storage deserialize error: not an object");
                Self::defaults()
            }
            Err(error) => {
                tracing::error!(%error, "Storage deserialize error");
                Self::defaults()
            }
        }
    }

    fn save(&self, state: &Map<String, Value>) {
        let raw = match serde_json::to_string(state) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::error!(%error, "Storage serialize error");
                return;
            }
        };

        if let Err(error) = self.backend.set_item(APP_STORAGE_KEY, &raw) {
            tracing::error!(%error, "Storage write error");
        }
    }

    /// Returns the value stored under `key`.
    ///
    /// Missing keys, `null` and values of the wrong shape all read as `None`.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let value = self.state.read().get(key.as_str()).cloned()?;
        if value.is_null() {
            return None;
        }

        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::error!(%key, %error, "Storage value has unexpected shape");
                None
            }
        }
    }

    /// Stores `value` under `key`. `None` is stored as `null`.
    pub fn set<T: Serialize>(&self, key: StorageKey, value: Option<&T>) {
        let value = match value.map(serde_json::to_value).transpose() {
            Ok(value) => value.unwrap_or(Value::Null),
            Err(error) => {
                tracing::error!(%key, %error, "Storage serialize error");
                return;
            }
        };

        let mut state = self.state.write();
        state.insert(key.as_str().to_string(), value);
        self.save(&state);
    }

    /// Merges `values` into the settings object.
    pub fn patch(&self, values: impl IntoIterator<Item = (StorageKey, Value)>) {
        let mut state = self.state.write();
        for (key, value) in values {
            state.insert(key.as_str().to_string(), value);
        }
        self.save(&state);
    }

    /// Removes `key`.
    pub fn delete(&self, key: StorageKey) {
        let mut state = self.state.write();
        state.remove(key.as_str());
        self.save(&state);
    }

    /// Resets the settings object to its defaults.
    pub fn clear(&self) {
        let mut state = self.state.write();
        *state = Self::defaults();
        self.save(&state);
    }

    /// Returns a copy of the whole settings object.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.state.read().clone()
    }
}

impl std::fmt::Debug for AppStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self.state.read().keys().cloned().collect();
        f.debug_struct("AppStorage").field("keys", &keys).finish()
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_support::MapStore;
    use pretty_assertions::assert_eq;
    use tally_domain::ThemeMode;

    #[test]
    fn set_then_get_round_trips() {
        let backend = Arc::new(MapStore::default());
        let storage = AppStorage::load(backend.clone());

        storage.set(StorageKey::AccessToken, Some(&"token-1"));
        storage.set(StorageKey::Theme, Some(&ThemeMode::Dark));

        assert_eq!(
            storage.get::<String>(StorageKey::AccessToken).as_deref(),
            Some("token-1")
        );
        assert_eq!(storage.get::<ThemeMode>(StorageKey::Theme), Some(ThemeMode::Dark));

        let reloaded = AppStorage::load(backend.clone());
        assert_eq!(
            reloaded.get::<String>(StorageKey::AccessToken).as_deref(),
            Some("token-1")
        );
        let raw: Value = serde_json::from_str(&backend.raw(APP_STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(raw["accessToken"], "token-1");
        assert_eq!(raw["theme"], "dark");
    }

    #[test]
    fn corrupted_content_yields_defaults() {
        let backend = Arc::new(MapStore::with(APP_STORAGE_KEY, "{not json"));
        let storage = AppStorage::load(backend);
        assert!(storage.get::<String>(StorageKey::AccessToken).is_none());
        assert!(storage.snapshot().is_empty());
    }

    #[test]
    fn non_object_content_yields_defaults() {
        let backend = Arc::new(MapStore::with(APP_STORAGE_KEY, "[1, 2]"));
        let storage = AppStorage::load(backend);
        assert!(storage.snapshot().is_empty());
    }

    #[test]
    fn wrong_shape_reads_as_none() {
        let backend = Arc::new(MapStore::with(APP_STORAGE_KEY, r#"{"theme": "purple"}"#));
        let storage = AppStorage::load(backend);
        assert!(storage.get::<ThemeMode>(StorageKey::Theme).is_none());
    }

    #[test]
    fn null_and_delete_read_as_none() {
        let storage = AppStorage::load(Arc::new(MapStore::default()));
        storage.set::<String>(StorageKey::AccessToken, None);
        assert!(storage.get::<String>(StorageKey::AccessToken).is_none());
        assert!(storage.snapshot().contains_key("accessToken"));

        storage.set(StorageKey::AccessToken, Some(&"t"));
        storage.delete(StorageKey::AccessToken);
        assert!(!storage.snapshot().contains_key("accessToken"));
    }

    #[test]
    fn patch_and_clear() {
        let backend = Arc::new(MapStore::default());
        let storage = AppStorage::load(backend.clone());
        storage.patch([
            (StorageKey::AccessToken, Value::from("a")),
            (StorageKey::Theme, Value::from("light")),
        ]);
        assert_eq!(storage.snapshot().len(), 2);

        storage.clear();
        assert!(storage.snapshot().is_empty());
        assert_eq!(backend.raw(APP_STORAGE_KEY).as_deref(), Some("{}"));
    }
}
