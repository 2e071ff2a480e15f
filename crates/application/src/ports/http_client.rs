//! HTTP client port

use async_trait::async_trait;
use thiserror::Error;

use tally_domain::{request::RequestSpec, response::ResponseSpec};

/// Transport-level failures. A response with any status is not an error here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpClientError {
    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("DNS lookup for {host} failed: {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Error description.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection to {host}:{port} refused")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The connection failed for another reason.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request body could not be encoded.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for executing HTTP requests.
///
/// This trait abstracts the HTTP client implementation, allowing
/// the application layer to be independent of specific HTTP libraries.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes an HTTP request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails due to network issues,
    /// timeout, or other transport problems. Error statuses are returned
    /// as regular responses.
    async fn execute(&self, request: &RequestSpec) -> Result<ResponseSpec, HttpClientError>;
}
