//! Observable session state.

use tally_domain::{User, token_preview};

/// Snapshot of the current session.
///
/// A session is authenticated as soon as a token is held; the user identity
/// may arrive later (it is carried by login and refresh responses).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Current access token.
    pub access_token: Option<String>,
    /// Identity of the logged-in user.
    pub user: Option<User>,
}

impl SessionState {
    /// Creates a session state seeded with a stored token.
    #[must_use]
    pub const fn with_token(access_token: Option<String>) -> Self {
        Self {
            access_token,
            user: None,
        }
    }

    /// Returns true if a token is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("access_token", &self.access_token.as_deref().map(token_preview))
            .field("user", &self.user)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticated_follows_token() {
        assert!(!SessionState::default().is_authenticated());
        assert!(SessionState::with_token(Some("t".to_string())).is_authenticated());
    }

    #[test]
    fn debug_shows_only_token_preview() {
        let state = SessionState::with_token(Some("abcdefghijklmnopqrstuvwxyz".to_string()));
        let debug = format!("{state:?}");
        assert!(debug.contains("abcdefgh..."));
        assert!(!debug.contains("xyz"));
    }
}
