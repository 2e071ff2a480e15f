//! Tally Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading and
//! tracing setup.

pub mod adapters;
pub mod config_loader;
pub mod serialization;
pub mod storage;
pub mod telemetry;

pub use adapters::{API_PREFIX, ReqwestHttpClient, RouteTracker};
pub use config_loader::{default_config_path, load_config, load_config_with};
pub use serialization::{SerializationError, from_json, to_json_stable};
pub use storage::{
    DisabledCloudStorage, FileKeyValueStore, KeyValueCloudStorage, MemoryKeyValueStore,
};
pub use telemetry::init_tracing;
