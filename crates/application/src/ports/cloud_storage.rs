//! Platform cloud storage port.

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by the platform cloud store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CloudStorageError {
    /// The platform does not offer cloud storage.
    #[error("cloud storage is not supported on this platform")]
    Unsupported,

    /// The platform reported an error.
    #[error("cloud storage error: {0}")]
    Platform(String),
}

/// Key-value store provided by the Telegram client, mirrored alongside
/// local storage.
#[async_trait]
pub trait CloudStorage: Send + Sync {
    /// Returns true if the platform offers cloud storage.
    fn is_supported(&self) -> bool;

    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    async fn get_item(&self, key: &str) -> Result<Option<String>, CloudStorageError>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), CloudStorageError>;

    /// Removes `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    async fn remove_item(&self, key: &str) -> Result<(), CloudStorageError>;
}
