//! Application error types

use thiserror::Error;
use tally_domain::{AuthError, DomainError};

use crate::ports::{HttpClientError, KeyValueStoreError};

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Authentication failed or the session could not be renewed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpClientError),

    /// The server answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, or a short description.
        message: String,
    },

    /// A response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] KeyValueStoreError),

    /// The configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApplicationError {
    /// Returns true for failures that mean the session is gone.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Auth(_)) || matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
