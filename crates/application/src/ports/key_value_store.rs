//! Synchronous key-value store port, the local-storage analogue.

use thiserror::Error;

/// Errors raised by a key-value store backend.
#[derive(Debug, Error)]
pub enum KeyValueStoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// String key-value storage that survives restarts.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), KeyValueStoreError>;
}
