//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod cloud_storage;
mod http_client;
mod key_value_store;
mod navigator;

pub use cloud_storage::{CloudStorage, CloudStorageError};
pub use http_client::{HttpClient, HttpClientError};
pub use key_value_store::{KeyValueStore, KeyValueStoreError};
pub use navigator::Navigator;
