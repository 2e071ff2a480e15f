//! Theme preference persistence.

use std::sync::Arc;

use tally_domain::{StorageKey, ThemeMode};

use super::AppStorage;

/// Reads and writes the selected theme.
#[derive(Debug, Clone)]
pub struct ThemeStorage {
    storage: Arc<AppStorage>,
}

impl ThemeStorage {
    /// Creates a theme storage on top of the shared settings object.
    #[must_use]
    pub const fn new(storage: Arc<AppStorage>) -> Self {
        Self { storage }
    }

    /// Returns the stored theme.
    #[must_use]
    pub fn theme(&self) -> Option<ThemeMode> {
        self.storage.get(StorageKey::Theme)
    }

    /// Stores `theme`; `None` resets to the system preference.
    pub fn set_theme(&self, theme: Option<ThemeMode>) {
        self.storage.set(StorageKey::Theme, theme.as_ref());
    }

    /// Resolves the effective theme and persists it.
    pub fn initialize(&self, system_prefers_dark: bool) -> ThemeMode {
        let theme = ThemeMode::resolve(self.theme(), system_prefers_dark);
        self.set_theme(Some(theme));
        theme
    }
}
