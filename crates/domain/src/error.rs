//! Domain error types

use thiserror::Error;

/// Errors raised when parsing names received from storage or routing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A route path does not match any known route.
    #[error("unknown route: {0}")]
    UnknownRoute(String),

    /// A storage key name does not match any known key.
    #[error("unknown storage key: {0}")]
    UnknownStorageKey(String),

    /// A theme name is not recognized.
    #[error("unknown theme: {0}")]
    UnknownTheme(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
