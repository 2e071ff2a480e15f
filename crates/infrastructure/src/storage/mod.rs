//! Key-value and cloud storage adapters.
//!
//! Local settings are kept in the platform config directory:
//! - Linux: ~/.config/tally/local-storage.json
//! - macOS: ~/Library/Application Support/tally/local-storage.json
//! - Windows: %APPDATA%/tally/local-storage.json

mod cloud;
mod file_store;
mod memory_store;

pub use cloud::{DisabledCloudStorage, KeyValueCloudStorage};
pub use file_store::FileKeyValueStore;
pub use memory_store::MemoryKeyValueStore;

use std::path::PathBuf;

/// Returns the Tally directory inside the platform config directory.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tally"))
}
