//! Response specification type

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;

/// HTTP response as seen by the application layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseSpec {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Raw response body
    pub body: Vec<u8>,
    /// Response time
    pub duration: Duration,
}

impl ResponseSpec {
    /// Creates a response.
    #[must_use]
    pub const fn new(
        status: u16,
        headers: HashMap<String, String>,
        body: Vec<u8>,
        duration: Duration,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            duration,
        }
    }

    /// Creates a response with a JSON body and no headers.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            headers: HashMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: body.to_string().into_bytes(),
            duration: Duration::ZERO,
        }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns true for 401 Unauthorized.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Returns true for 401 or 403.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        self.status == 401 || self.status == 403
    }

    /// Returns the body as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
