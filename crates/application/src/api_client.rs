//! Authenticated access to the budgeting API.
//!
//! Every request carries the current session token. A 401 answer triggers a
//! token refresh (shared with any refresh already running) and one retry.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tally_domain::ApiEnvelope;
use tally_domain::request::RequestSpec;
use tally_domain::response::ResponseSpec;

use crate::auth::AuthService;
use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::HttpClient;

/// HTTP client that authenticates requests and recovers from expired tokens.
#[derive(Clone)]
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    auth: AuthService,
}

impl ApiClient {
    /// Creates a client sending through `http` with the session of `auth`.
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>, auth: AuthService) -> Self {
        Self { http, auth }
    }

    /// Returns the auth service backing this client.
    #[must_use]
    pub const fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Sends `request` with the current token attached.
    ///
    /// When the server answers 401 to a request that carried a token, the
    /// token is refreshed and the request is retried exactly once. The
    /// refresh endpoint itself is never retried.
    ///
    /// # Errors
    ///
    /// Returns transport failures, and the refresh failure when the token
    /// could not be renewed. Non-success statuses are returned as responses.
    pub async fn execute(&self, request: RequestSpec) -> ApplicationResult<ResponseSpec> {
        let sent = self.authorize(&request);
        let response = self.http.execute(&sent).await?;

        let Some(sent_token) = sent.bearer_token() else {
            return Ok(response);
        };
        if !response.is_unauthorized() || request.is_refresh_call() {
            return Ok(response);
        }

        tracing::debug!(
            request_id = %request.id,
            path = %request.path,
            "Unauthorized, renewing token"
        );
        let token = self.renewed_token(sent_token).await?;

        let retried = request.with_bearer(&token);
        let response = self.http.execute(&retried).await?;
        tracing::debug!(
            request_id = %request.id,
            status = response.status,
            "Request retried with renewed token"
        );
        Ok(response)
    }

    /// Sends a GET request and unwraps the `{ "data": ... }` envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Status`] for non-success answers and
    /// [`ApplicationError::Decode`] when the body has the wrong shape.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> ApplicationResult<T> {
        let response = self.execute(RequestSpec::get(path).with_query(query)).await?;

        if !response.is_success() {
            tracing::warn!(path, status = response.status, "Request failed");
            return Err(ApplicationError::Status {
                status: response.status,
                message: response.text(),
            });
        }

        response
            .json_body::<ApiEnvelope<T>>()
            .map(|envelope| envelope.data)
            .map_err(|e| ApplicationError::Decode(format!("{path}: {e}")))
    }

    fn authorize(&self, request: &RequestSpec) -> RequestSpec {
        match self.auth.access_token() {
            Some(token) => request.with_bearer(&token),
            None => request.clone(),
        }
    }

    /// Returns a token to retry with after `rejected` was refused.
    ///
    /// If the session already moved on to another token, that token is used
    /// without a new refresh call.
    async fn renewed_token(&self, rejected: &str) -> ApplicationResult<String> {
        if let Some(current) = self.auth.access_token().filter(|current| current != rejected) {
            return Ok(current);
        }

        match self.auth.refresh_token().await {
            Ok(token) => Ok(token),
            Err(error) => {
                if self.auth.is_authenticated() {
                    self.auth.logout();
                }
                Err(error.into())
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::{AuthSettings, RefreshFailurePolicy};
    use crate::test_support::{FakeBackend, RecordingNavigator, logged_in_client};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;
    use tally_domain::{AuthError, Route, UserResponse};

    struct Harness {
        backend: Arc<FakeBackend>,
        navigator: Arc<RecordingNavigator>,
        client: ApiClient,
    }

    async fn logged_in(policy: RefreshFailurePolicy) -> Harness {
        let backend = Arc::new(FakeBackend::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let settings = AuthSettings {
            refresh_failure: policy,
            ..AuthSettings::default()
        };
        let client = logged_in_client(backend.clone(), navigator.clone(), settings).await;
        Harness {
            backend,
            navigator,
            client,
        }
    }

    #[tokio::test]
    async fn attaches_current_token() {
        let h = logged_in(RefreshFailurePolicy::Logout).await;

        let user: UserResponse = h.client.get_json("/user", Vec::new()).await.unwrap();

        assert_eq!(user.user_id, "42");
        let last = h.backend.requests.lock().last().cloned().unwrap();
        assert_eq!(last.bearer_token(), Some("token-1"));
        assert_eq!(h.backend.refreshes(), 0);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_request_retried_once() {
        let h = logged_in(RefreshFailurePolicy::Logout).await;
        h.backend.accept_only(Some("rotated-elsewhere"));

        let response = h
            .client
            .execute(RequestSpec::get("/budgeting/overview"))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(h.backend.refreshes(), 1);
        // first attempt and retry
        assert_eq!(h.backend.api_requests(), 2);

        let requests = h.backend.requests.lock().clone();
        let retried = requests.last().unwrap();
        assert_eq!(retried.bearer_token(), Some("token-2"));
        assert_eq!(retried.id, requests[1].id);
    }

    #[tokio::test]
    async fn concurrent_unauthorized_requests_share_one_refresh() {
        let h = logged_in(RefreshFailurePolicy::Logout).await;
        h.backend.accept_only(None);

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let client = h.client.clone();
                tokio::spawn(async move {
                    client
                        .execute(RequestSpec::get("/budgeting/overview"))
                        .await
                })
            })
            .collect();

        for handle in handles {
            let response = handle.await.unwrap().unwrap();
            assert_eq!(response.status, 200);
        }
        assert_eq!(h.backend.refreshes(), 1);
        assert_eq!(h.backend.api_requests(), 20);
        assert!(!h.client.auth().is_refreshing());
    }

    #[tokio::test]
    async fn request_without_token_is_not_retried() {
        let h = logged_in(RefreshFailurePolicy::Logout).await;
        h.client.auth().logout();

        let response = h.client.execute(RequestSpec::get("/user")).await.unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(h.backend.refreshes(), 0);
        assert!(h.backend.requests.lock().last().unwrap().bearer_token().is_none());
    }

    #[tokio::test]
    async fn refresh_call_is_never_retried() {
        let h = logged_in(RefreshFailurePolicy::Logout).await;
        h.backend.refresh_ok.store(false, Ordering::SeqCst);

        let response = h
            .client
            .execute(RequestSpec::post("/auth/refresh"))
            .await
            .unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(h.backend.refreshes(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_logs_out_and_propagates() {
        let h = logged_in(RefreshFailurePolicy::Logout).await;
        h.backend.accept_only(None);
        h.backend.refresh_ok.store(false, Ordering::SeqCst);

        let result = h
            .client
            .get_json::<UserResponse>("/user", Vec::new())
            .await;

        assert!(matches!(
            result,
            Err(ApplicationError::Auth(AuthError::RefreshFailed { .. }))
        ));
        assert!(result.unwrap_err().is_auth_failure());
        assert!(!h.client.auth().is_authenticated());
        assert_eq!(h.navigator.last(), Some(Route::Login));
        assert_eq!(h.backend.api_requests(), 1);
    }

    #[tokio::test]
    async fn token_rotated_by_another_caller_is_reused() {
        let h = logged_in(RefreshFailurePolicy::Logout).await;
        let stale = h.client.auth().access_token().unwrap();
        h.client.auth().refresh_token().await.unwrap();
        assert_eq!(h.backend.refreshes(), 1);

        let token = h.client.renewed_token(&stale).await.unwrap();

        assert_eq!(token, "token-2");
        assert_eq!(h.backend.refreshes(), 1);
    }

    #[tokio::test]
    async fn non_success_status_becomes_error() {
        let h = logged_in(RefreshFailurePolicy::Logout).await;

        let result = h
            .client
            .get_json::<serde_json::Value>("/missing", Vec::new())
            .await;

        assert!(matches!(result, Err(ApplicationError::Status { status: 404, .. })));
    }
}
