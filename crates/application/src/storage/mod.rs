//! Persistent client state: the settings object and typed views onto it.

mod app_storage;
mod theme_storage;
mod token_storage;

pub use app_storage::AppStorage;
pub use theme_storage::ThemeStorage;
pub use token_storage::TokenStorage;
