//! Authentication wire types and errors

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Query parameter carrying a launch token in the Mini App URL.
pub const URL_TOKEN_PARAM: &str = "token";

/// Authenticated user identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Backend user identifier (the Telegram user id as a string).
    pub id: String,
}

impl User {
    /// Creates a user from its identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Response of `/auth/login` and `/auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Newly issued access token.
    #[serde(alias = "access_token")]
    pub access_token: String,
    /// Identifier of the authenticated user.
    #[serde(alias = "user_id")]
    pub user_id: String,
}

impl LoginResponse {
    /// Returns the user identity carried by this response.
    #[must_use]
    pub fn user(&self) -> User {
        User::new(self.user_id.clone())
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    /// Raw Telegram WebApp init data.
    pub init_data: String,
}

/// Response of `GET /user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    /// Identifier of the authenticated user.
    #[serde(alias = "userId")]
    pub user_id: String,
}

/// External credential exchanged for a session token.
#[derive(Clone, PartialEq, Eq)]
pub enum LoginCredential {
    /// Telegram WebApp init data, posted as JSON.
    InitData(String),
    /// One-time token embedded in the launch URL, sent as a bearer header.
    UrlToken(String),
}

impl LoginCredential {
    /// Extracts a `token` query parameter from a launch URL.
    ///
    /// Returns `None` when the URL carries no (or an empty) token.
    #[must_use]
    pub fn from_url(url: &Url) -> Option<Self> {
        url.query_pairs()
            .find(|(key, _)| key == URL_TOKEN_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
            .map(Self::UrlToken)
    }

    /// Returns a copy of `url` with the `token` query parameter removed.
    ///
    /// Other parameters keep their order. A URL left without parameters
    /// loses its `?` entirely.
    #[must_use]
    pub fn strip_from_url(url: &Url) -> Url {
        let mut cleaned = url.clone();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != URL_TOKEN_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            cleaned.set_query(None);
        } else {
            cleaned.query_pairs_mut().clear().extend_pairs(kept);
        }
        cleaned
    }

    /// Short label used in log output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InitData(_) => "init_data",
            Self::UrlToken(_) => "url_token",
        }
    }
}

impl std::fmt::Debug for LoginCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InitData(data) => f
                .debug_tuple("InitData")
                .field(&format_args!("<{} bytes>", data.len()))
                .finish(),
            Self::UrlToken(token) => f
                .debug_tuple("UrlToken")
                .field(&token_preview(token))
                .finish(),
        }
    }
}

/// Authentication errors.
///
/// `Clone` so a single refresh outcome can be handed to every waiter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credential is available to log in with.
    #[error("no login credential available")]
    MissingCredential,

    /// The login exchange was rejected or failed.
    #[error("login failed: {message}")]
    LoginFailed {
        /// Error description.
        message: String,
    },

    /// The refresh call was rejected or failed.
    #[error("token refresh failed: {message}")]
    RefreshFailed {
        /// Error description.
        message: String,
    },

    /// The in-flight refresh ended without publishing an outcome.
    #[error("token refresh aborted")]
    RefreshAborted,

    /// The session was logged out while the exchange was running.
    #[error("session ended during authentication")]
    SessionEnded,

    /// Transport failure while talking to the auth endpoints.
    #[error("network error: {message}")]
    Network {
        /// Error description.
        message: String,
    },

    /// The auth endpoint answered with an unexpected body.
    #[error("invalid auth response: {message}")]
    InvalidResponse {
        /// Error description.
        message: String,
    },
}

/// Get a preview of a token (first 8 chars + ...).
#[must_use]
pub fn token_preview(token: &str) -> String {
    match token.char_indices().nth(8) {
        Some((idx, _)) if token.len() > 12 => format!("{}...", &token[..idx]),
        _ => token.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn login_response_uses_camel_case() {
        let json = r#"{"accessToken":"abc","userId":"42"}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access_token, "abc");
        assert_eq!(response.user(), User::new("42"));

        let legacy: LoginResponse =
            serde_json::from_str(r#"{"access_token":"abc","user_id":"42"}"#).unwrap();
        assert_eq!(legacy, response);

        let payload = serde_json::to_string(&LoginPayload {
            init_data: "query_id=1".to_string(),
        })
        .unwrap();
        assert_eq!(payload, r#"{"initData":"query_id=1"}"#);
    }

    #[test]
    fn credential_from_url() {
        let url = Url::parse("https://app.example.com/?token=jwt123&tgWebAppStartParam=x").unwrap();
        assert_eq!(
            LoginCredential::from_url(&url),
            Some(LoginCredential::UrlToken("jwt123".to_string()))
        );

        let url = Url::parse("https://app.example.com/?token=").unwrap();
        assert!(LoginCredential::from_url(&url).is_none());

        let url = Url::parse("https://app.example.com/").unwrap();
        assert!(LoginCredential::from_url(&url).is_none());
    }

    #[test]
    fn strip_token_from_url() {
        let url = Url::parse("https://app.example.com/budgeting?a=1&token=jwt&b=2").unwrap();
        let cleaned = LoginCredential::strip_from_url(&url);
        assert_eq!(cleaned.as_str(), "https://app.example.com/budgeting?a=1&b=2");

        let url = Url::parse("https://app.example.com/?token=jwt").unwrap();
        let cleaned = LoginCredential::strip_from_url(&url);
        assert_eq!(cleaned.as_str(), "https://app.example.com/");
    }

    #[test]
    fn credential_debug_hides_secrets() {
        let debug = format!(
            "{:?}",
            LoginCredential::UrlToken("abcdefghijklmnopqrstuvwxyz".to_string())
        );
        assert_eq!(debug, r#"UrlToken("abcdefgh...")"#);

        let debug = format!("{:?}", LoginCredential::InitData("user=secret".to_string()));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(token_preview("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(token_preview("short"), "short");
    }
}
