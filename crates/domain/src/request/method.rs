//! HTTP method enumeration

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP methods the budgeting API is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Reads and the URL-token login.
    #[default]
    Get,
    /// Init-data login and token refresh.
    Post,
}

impl HttpMethod {
    /// Returns the method as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_uppercase() {
        assert_eq!(serde_json::to_string(&HttpMethod::Post).ok().as_deref(), Some("\"POST\""));
        assert_eq!(HttpMethod::default().to_string(), "GET");
    }
}
