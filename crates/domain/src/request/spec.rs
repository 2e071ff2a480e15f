//! Request specification type

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AUTHORIZATION, Header, Headers, HttpMethod};

/// Path fragment identifying the token refresh endpoint.
pub const REFRESH_PATH_MARKER: &str = "/refresh";

/// An API request, addressed by a path relative to the API root.
///
/// The HTTP adapter resolves `path` against the configured base URL, so the
/// same spec works for every deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Correlation id, carried through retries.
    pub id: Uuid,
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the API root, e.g. `/budgeting/overview`.
    pub path: String,
    /// Query parameters, in order.
    #[serde(default)]
    pub query: Vec<(String, String)>,
    /// Request headers
    #[serde(default)]
    pub headers: Headers,
    /// Optional JSON body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Whether cookies (the refresh cookie) should accompany the request.
    #[serde(default)]
    pub with_credentials: bool,
}

impl RequestSpec {
    /// Creates a request with the given method and path.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: None,
            with_credentials: false,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Appends query parameters.
    #[must_use]
    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets a header, replacing any header with the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(Header::new(name, value));
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sends cookies with this request.
    #[must_use]
    pub const fn with_credentials(mut self) -> Self {
        self.with_credentials = true;
        self
    }

    /// Returns a copy of this request carrying `token` as bearer credential.
    #[must_use]
    pub fn with_bearer(&self, token: &str) -> Self {
        let mut request = self.clone();
        request.headers.set(Header::bearer(token));
        request
    }

    /// Returns the bearer token attached to this request, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Returns true if this request targets the refresh endpoint.
    #[must_use]
    pub fn is_refresh_call(&self) -> bool {
        self.path.contains(REFRESH_PATH_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_with_bearer_replaces_previous_token() {
        let request = RequestSpec::get("/user").with_bearer("first");
        let retried = request.with_bearer("second");

        assert_eq!(request.bearer_token(), Some("first"));
        assert_eq!(retried.bearer_token(), Some("second"));
        assert_eq!(retried.headers.len(), 1);
        assert_eq!(retried.id, request.id);
    }

    #[test]
    fn test_is_refresh_call() {
        assert!(RequestSpec::post("/auth/refresh").is_refresh_call());
        assert!(!RequestSpec::post("/auth/login").is_refresh_call());
    }

    #[test]
    fn test_builder() {
        let request = RequestSpec::get("/budgeting/transactions")
            .with_query([("category", "Food")])
            .with_credentials();

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(
            request.query,
            vec![("category".to_string(), "Food".to_string())]
        );
        assert!(request.with_credentials);
        assert!(request.bearer_token().is_none());
    }
}
