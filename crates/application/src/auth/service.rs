//! Session lifecycle: login, refresh, logout and the background refresh timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tally_domain::request::RequestSpec;
use tally_domain::response::ResponseSpec;
use tally_domain::{AuthError, LoginCredential, LoginPayload, LoginResponse, Route, User, token_preview};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::refresh::{RefreshCoordinator, RefreshOutcome};
use super::session::SessionState;
use crate::config::{AuthSettings, RefreshFailurePolicy};
use crate::ports::{HttpClient, Navigator};
use crate::storage::TokenStorage;

const LOGIN_PATH: &str = "/auth/login";
const REFRESH_PATH: &str = "/auth/refresh";

/// Owns the session token and coordinates every change to it.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct AuthService {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    http: Arc<dyn HttpClient>,
    tokens: TokenStorage,
    navigator: Arc<dyn Navigator>,
    settings: AuthSettings,
    credential: Mutex<Option<LoginCredential>>,
    session: watch::Sender<SessionState>,
    /// Bumped by every logout; exchanges started before it are discarded.
    generation: AtomicU64,
    refresh: RefreshCoordinator,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for AuthInner {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.abort();
        }
    }
}

impl AuthService {
    /// Creates the service, seeding the session from the stored token.
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpClient>,
        tokens: TokenStorage,
        navigator: Arc<dyn Navigator>,
        settings: AuthSettings,
    ) -> Self {
        let (session, _) = watch::channel(SessionState::with_token(tokens.access_token()));
        Self {
            inner: Arc::new(AuthInner {
                http,
                tokens,
                navigator,
                settings,
                credential: Mutex::new(None),
                session,
                generation: AtomicU64::new(0),
                refresh: RefreshCoordinator::new(),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Sets the credential used by [`login`](Self::login) and by re-login
    /// after a failed refresh.
    pub fn set_credential(&self, credential: Option<LoginCredential>) {
        if let Some(credential) = &credential {
            tracing::debug!(kind = credential.kind(), "Login credential configured");
        }
        *self.inner.credential.lock() = credential;
    }

    /// Returns true if a login credential is configured.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.inner.credential.lock().is_some()
    }

    /// Restores the session on startup.
    ///
    /// Pulls the token from cloud storage, then refreshes an existing
    /// session or logs in with the configured credential.
    ///
    /// # Errors
    ///
    /// Returns the refresh or login failure.
    pub async fn initialize(&self) -> Result<User, AuthError> {
        self.inner.tokens.init().await;
        let stored = self.inner.tokens.access_token();
        self.inner
            .session
            .send_modify(|state| state.access_token.clone_from(&stored));

        let user = if let Some(token) = stored {
            tracing::info!(token = %token_preview(&token), "Stored session found, refreshing");
            self.refresh_token().await?;
            self.current_user()
                .ok_or_else(|| AuthError::InvalidResponse {
                    message: "refresh response carried no user".to_string(),
                })?
        } else {
            self.login().await?
        };

        self.start_refresh_timer();
        Ok(user)
    }

    /// Exchanges the configured credential for a session token.
    ///
    /// A launch URL token is single use and is discarded after the attempt.
    /// Without a credential the user is sent to the login view. On failure
    /// the session is cleared and the user is sent to the login view.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingCredential`] or the login failure.
    pub async fn login(&self) -> Result<User, AuthError> {
        let Some(credential) = self.take_credential() else {
            tracing::warn!("No login credential available, manual login required");
            self.inner.navigator.navigate(Route::Login);
            return Err(AuthError::MissingCredential);
        };

        tracing::info!(kind = credential.kind(), "Logging in");
        let generation = self.generation();
        match self.exchange(&credential).await {
            Ok(response) => {
                self.apply(generation, &response).await?;
                self.start_refresh_timer();
                tracing::info!(user_id = %response.user_id, "Logged in");
                Ok(response.user())
            }
            Err(error) => {
                tracing::error!(%error, "Login failed");
                self.logout();
                self.inner.navigator.navigate(Route::Login);
                Err(error)
            }
        }
    }

    /// Obtains a new access token from the refresh cookie.
    ///
    /// Concurrent callers share a single refresh call and its outcome. When
    /// the call fails, the configured [`RefreshFailurePolicy`] decides
    /// between logging out and trying a fresh login.
    ///
    /// # Errors
    ///
    /// Returns the refresh failure, shared by every waiter.
    pub async fn refresh_token(&self) -> Result<String, AuthError> {
        let service = self.clone();
        let outcome = self
            .inner
            .refresh
            .run(move || async move { service.perform_refresh().await })
            .await;
        outcome.map(|response| response.access_token)
    }

    /// Clears the token and user identity.
    ///
    /// The local state is cleared before returning; removal from the cloud
    /// mirror runs in the background. A login or refresh still running
    /// completes with [`AuthError::SessionEnded`] and leaves the session
    /// logged out.
    pub fn logout(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.tokens.remove_local();
        self.inner.session.send_modify(|state| {
            state.access_token = None;
            state.user = None;
        });
        self.inner.tokens.remove_cloud_in_background();
        tracing::info!("Logged out");
    }

    /// Starts the periodic refresh, unless it is already running.
    ///
    /// Each tick refreshes the token if a session exists; failures are
    /// logged and the timer keeps running.
    pub fn start_refresh_timer(&self) {
        let period = self.inner.settings.token_refresh_period;
        if period.is_zero() {
            tracing::warn!("Token refresh period is zero, timer disabled");
            return;
        }

        let mut timer = self.inner.timer.lock();
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No runtime, token refresh timer not started");
            return;
        };

        let inner = Arc::downgrade(&self.inner);
        *timer = Some(runtime.spawn(refresh_loop(inner, period)));
        tracing::debug!(?period, "Token refresh timer started");
    }

    /// Stops the periodic refresh.
    pub fn stop_refresh_timer(&self) {
        if let Some(timer) = self.inner.timer.lock().take() {
            timer.abort();
            tracing::debug!("Token refresh timer stopped");
        }
    }

    /// Returns true while the periodic refresh runs.
    #[must_use]
    pub fn is_refresh_timer_running(&self) -> bool {
        self.inner
            .timer
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Returns the current access token.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.inner.session.borrow().access_token.clone()
    }

    /// Returns the logged-in user, once known.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.session.borrow().user.clone()
    }

    /// Returns true if a session token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.session.borrow().is_authenticated()
    }

    /// Returns true while a refresh call is outstanding.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_in_flight()
    }

    /// Subscribes to session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.session.subscribe()
    }

    /// Returns the runtime settings.
    #[must_use]
    pub fn settings(&self) -> AuthSettings {
        self.inner.settings
    }

    fn take_credential(&self) -> Option<LoginCredential> {
        let mut credential = self.inner.credential.lock();
        match credential.as_ref()? {
            LoginCredential::UrlToken(_) => credential.take(),
            LoginCredential::InitData(_) => credential.clone(),
        }
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    async fn perform_refresh(&self) -> RefreshOutcome {
        tracing::debug!("Refreshing access token");
        let generation = self.generation();
        let request = RequestSpec::post(REFRESH_PATH)
            .with_json(serde_json::json!({}))
            .with_credentials();

        let error = match self.send_auth_request(&request, AuthStep::Refresh).await {
            Ok(response) => {
                self.apply(generation, &response).await?;
                tracing::info!(token = %token_preview(&response.access_token), "Access token refreshed");
                return Ok(response);
            }
            Err(error) => error,
        };
        if self.generation() != generation {
            tracing::debug!(%error, "Refresh failed after logout");
            return Err(AuthError::SessionEnded);
        }

        tracing::warn!(%error, policy = ?self.inner.settings.refresh_failure, "Refresh token failed");
        if self.inner.settings.refresh_failure == RefreshFailurePolicy::Relogin {
            match self.relogin().await {
                Ok(response) => return Ok(response),
                Err(AuthError::SessionEnded) => return Err(AuthError::SessionEnded),
                Err(login_error) => tracing::error!(error = %login_error, "Re-login failed"),
            }
        }

        self.logout();
        self.inner.navigator.navigate(Route::Login);
        Err(error)
    }

    async fn relogin(&self) -> RefreshOutcome {
        let credential = self.take_credential().ok_or(AuthError::MissingCredential)?;
        tracing::info!(kind = credential.kind(), "Trying a fresh login");
        let generation = self.generation();
        let response = self.exchange(&credential).await?;
        self.apply(generation, &response).await?;
        Ok(response)
    }

    async fn exchange(&self, credential: &LoginCredential) -> Result<LoginResponse, AuthError> {
        let request = match credential {
            LoginCredential::InitData(init_data) => {
                let payload = serde_json::to_value(LoginPayload {
                    init_data: init_data.clone(),
                })
                .map_err(|e| AuthError::LoginFailed {
                    message: e.to_string(),
                })?;
                RequestSpec::post(LOGIN_PATH).with_json(payload)
            }
            LoginCredential::UrlToken(token) => RequestSpec::get(LOGIN_PATH).with_bearer(token),
        }
        .with_credentials();

        self.send_auth_request(&request, AuthStep::Login).await
    }

    async fn send_auth_request(
        &self,
        request: &RequestSpec,
        step: AuthStep,
    ) -> Result<LoginResponse, AuthError> {
        let response = self
            .inner
            .http
            .execute(request)
            .await
            .map_err(|e| AuthError::Network {
                message: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(step.rejected(&response));
        }

        response
            .json_body::<LoginResponse>()
            .map_err(|e| AuthError::InvalidResponse {
                message: e.to_string(),
            })
    }

    /// Installs `response` unless a logout happened since `generation`.
    ///
    /// The session and the local token change before the first await, so a
    /// logout either precedes both or follows both.
    async fn apply(&self, generation: u64, response: &LoginResponse) -> Result<(), AuthError> {
        if self.generation() != generation {
            tracing::info!("Logged out while authenticating, discarding token");
            return Err(AuthError::SessionEnded);
        }
        self.inner.session.send_modify(|state| {
            state.access_token = Some(response.access_token.clone());
            state.user = Some(response.user());
        });
        self.inner
            .tokens
            .set_access_token(Some(&response.access_token))
            .await;
        Ok(())
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("session", &*self.inner.session.borrow())
            .field("refresh", &self.inner.refresh)
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy)]
enum AuthStep {
    Login,
    Refresh,
}

impl AuthStep {
    fn rejected(self, response: &ResponseSpec) -> AuthError {
        let message = format!("status {}: {}", response.status, response.text());
        match self {
            Self::Login => AuthError::LoginFailed { message },
            Self::Refresh => AuthError::RefreshFailed { message },
        }
    }
}

async fn refresh_loop(inner: Weak<AuthInner>, period: std::time::Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let service = AuthService { inner };
        if !service.is_authenticated() {
            continue;
        }
        if let Err(error) = service.refresh_token().await {
            tracing::error!(%error, "Scheduled token refresh failed");
        }
    }
}
