//! Fetch current user use case.

use tally_domain::{User, UserResponse};

use crate::api_client::ApiClient;
use crate::error::ApplicationResult;

const USER_PATH: &str = "/user";

/// Asks the server who the session belongs to.
pub struct FetchCurrentUser {
    api: ApiClient,
}

impl FetchCurrentUser {
    /// Creates a new `FetchCurrentUser` use case.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Executes the use case.
    ///
    /// A session the server no longer accepts is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the user cannot be fetched.
    pub async fn execute(&self) -> ApplicationResult<User> {
        match self.api.get_json::<UserResponse>(USER_PATH, Vec::new()).await {
            Ok(response) => Ok(User::new(response.user_id)),
            Err(error) => {
                if error.is_auth_failure() && self.api.auth().is_authenticated() {
                    self.api.auth().logout();
                }
                Err(error)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{AuthSettings, RefreshFailurePolicy};
    use crate::test_support::{FAKE_USER_ID, FakeBackend, RecordingNavigator, logged_in_client};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn returns_session_owner() {
        let backend = Arc::new(FakeBackend::default());
        let api = logged_in_client(
            backend,
            Arc::new(RecordingNavigator::default()),
            AuthSettings::default(),
        )
        .await;

        let user = FetchCurrentUser::new(api).execute().await.unwrap();
        assert_eq!(user, User::new(FAKE_USER_ID));
    }

    #[tokio::test]
    async fn rejected_session_is_dropped() {
        let backend = Arc::new(FakeBackend::default());
        let settings = AuthSettings {
            refresh_failure: RefreshFailurePolicy::Logout,
            ..AuthSettings::default()
        };
        let api = logged_in_client(
            backend.clone(),
            Arc::new(RecordingNavigator::default()),
            settings,
        )
        .await;
        backend.accept_only(None);
        backend.refresh_ok.store(false, Ordering::SeqCst);

        let result = FetchCurrentUser::new(api.clone()).execute().await;

        assert!(result.unwrap_err().is_auth_failure());
        assert!(!api.auth().is_authenticated());
    }
}
