//! Cloud storage adapters.

use std::sync::Arc;

use async_trait::async_trait;
use tally_application::ports::{CloudStorage, CloudStorageError, KeyValueStore};
use tally_domain::cloud_storage_supported;

/// Cloud storage of a platform that offers none.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCloudStorage;

#[async_trait]
impl CloudStorage for DisabledCloudStorage {
    fn is_supported(&self) -> bool {
        false
    }

    async fn get_item(&self, _key: &str) -> Result<Option<String>, CloudStorageError> {
        Err(CloudStorageError::Unsupported)
    }

    async fn set_item(&self, _key: &str, _value: &str) -> Result<(), CloudStorageError> {
        Err(CloudStorageError::Unsupported)
    }

    async fn remove_item(&self, _key: &str) -> Result<(), CloudStorageError> {
        Err(CloudStorageError::Unsupported)
    }
}

/// Cloud storage backed by a key-value store, gated on the platform version.
///
/// Stands in for the Telegram `CloudStorage` API, which only exists from
/// WebApp version 6.1 on.
pub struct KeyValueCloudStorage {
    store: Arc<dyn KeyValueStore>,
    platform_version: String,
    supported: bool,
}

impl KeyValueCloudStorage {
    /// Creates a cloud store for a platform reporting `platform_version`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, platform_version: impl Into<String>) -> Self {
        let platform_version = platform_version.into();
        let supported = cloud_storage_supported(&platform_version);
        if !supported {
            tracing::info!(version = %platform_version, "Cloud storage unavailable on this platform version");
        }
        Self {
            store,
            platform_version,
            supported,
        }
    }

    /// Returns the platform version this store was created for.
    #[must_use]
    pub fn platform_version(&self) -> &str {
        &self.platform_version
    }

    const fn check(&self) -> Result<(), CloudStorageError> {
        if self.supported {
            Ok(())
        } else {
            Err(CloudStorageError::Unsupported)
        }
    }
}

impl std::fmt::Debug for KeyValueCloudStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueCloudStorage")
            .field("platform_version", &self.platform_version)
            .field("supported", &self.supported)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CloudStorage for KeyValueCloudStorage {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>, CloudStorageError> {
        self.check()?;
        self.store
            .get_item(key)
            .map_err(|e| CloudStorageError::Platform(e.to_string()))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), CloudStorageError> {
        self.check()?;
        self.store
            .set_item(key, value)
            .map_err(|e| CloudStorageError::Platform(e.to_string()))
    }

    async fn remove_item(&self, key: &str) -> Result<(), CloudStorageError> {
        self.check()?;
        self.store
            .remove_item(key)
            .map_err(|e| CloudStorageError::Platform(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn supported_version_reads_and_writes() {
        let cloud = KeyValueCloudStorage::new(Arc::new(MemoryKeyValueStore::new()), "7.2");
        assert!(cloud.is_supported());

        cloud.set_item("accessToken", "abc").await.unwrap();
        assert_eq!(cloud.get_item("accessToken").await.unwrap().as_deref(), Some("abc"));
        cloud.remove_item("accessToken").await.unwrap();
        assert_eq!(cloud.get_item("accessToken").await.unwrap(), None);
    }

    #[tokio::test]
    async fn old_versions_are_rejected() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let cloud = KeyValueCloudStorage::new(store.clone(), "6.0");

        assert!(!cloud.is_supported());
        assert_eq!(
            cloud.set_item("accessToken", "abc").await,
            Err(CloudStorageError::Unsupported)
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn disabled_cloud_is_unsupported() {
        let cloud = DisabledCloudStorage;
        assert!(!cloud.is_supported());
        assert_eq!(cloud.get_item("x").await, Err(CloudStorageError::Unsupported));
    }
}
