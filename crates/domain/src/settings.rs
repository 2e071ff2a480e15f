//! Persisted settings model
//!
//! Everything the client persists lives in one JSON object, keyed by the
//! logical setting names defined here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Key of the single local-store entry holding all settings.
pub const APP_STORAGE_KEY: &str = "app-storage";

/// Lowest Telegram WebApp version exposing `CloudStorage`.
pub const MIN_CLOUD_STORAGE_VERSION: (u32, u32) = (6, 1);

/// Logical setting names inside the settings object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKey {
    /// Current session token.
    #[serde(rename = "accessToken")]
    AccessToken,
    /// Selected color theme.
    #[serde(rename = "theme")]
    Theme,
}

impl StorageKey {
    /// Returns all known keys.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::AccessToken, Self::Theme]
    }

    /// Returns the field name used in the settings object.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "accessToken",
            Self::Theme => "theme",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKey {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| DomainError::UnknownStorageKey(s.to_string()))
    }
}

/// Theme mode preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light mode theme.
    Light,
    /// Dark mode theme.
    Dark,
}

impl ThemeMode {
    /// Returns true for the dark theme.
    #[must_use]
    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    /// Returns the theme name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Picks the stored theme, falling back to the system preference.
    #[must_use]
    pub const fn resolve(stored: Option<Self>, system_prefers_dark: bool) -> Self {
        match stored {
            Some(theme) => theme,
            None if system_prefers_dark => Self::Dark,
            None => Self::Light,
        }
    }
}

impl FromStr for ThemeMode {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(DomainError::UnknownTheme(other.to_string())),
        }
    }
}

/// Returns true if a platform reporting `version` supports cloud storage.
///
/// Versions are `major.minor`; anything unparsable is unsupported.
#[must_use]
pub fn cloud_storage_supported(version: &str) -> bool {
    let mut parts = version.trim().split('.');
    let major = parts.next().and_then(|p| p.parse::<u32>().ok());
    let minor = parts.next().map_or(Some(0), |p| p.parse::<u32>().ok());

    match (major, minor) {
        (Some(major), Some(minor)) => (major, minor) >= MIN_CLOUD_STORAGE_VERSION,
        _ => false,
    }
}
