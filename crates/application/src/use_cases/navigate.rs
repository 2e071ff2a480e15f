//! Guarded navigation use case.

use std::sync::Arc;

use tally_domain::Route;

use crate::auth::AuthService;
use crate::ports::Navigator;

/// Navigates to a route after applying its guard.
pub struct Navigate {
    auth: AuthService,
    navigator: Arc<dyn Navigator>,
}

impl Navigate {
    /// Creates a new `Navigate` use case.
    #[must_use]
    pub fn new(auth: AuthService, navigator: Arc<dyn Navigator>) -> Self {
        Self { auth, navigator }
    }

    /// Navigates to `requested`, or to the route its guard redirects to.
    ///
    /// Returns the route actually shown.
    pub fn execute(&self, requested: Route) -> Route {
        let decision = requested.guard(self.auth.is_authenticated());
        let target = decision.target(requested);
        if target != requested {
            tracing::debug!(%requested, %target, "Navigation redirected");
        }
        self.navigator.navigate(target);
        target
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::AuthSettings;
    use crate::test_support::{FakeBackend, RecordingNavigator, auth_service, logged_in_client};
    use pretty_assertions::assert_eq;

    #[test]
    fn anonymous_users_land_on_login() {
        let navigator = Arc::new(RecordingNavigator::default());
        let auth = auth_service(
            Arc::new(FakeBackend::default()),
            navigator.clone(),
            AuthSettings::default(),
        );
        let navigate = Navigate::new(auth, navigator.clone());

        assert_eq!(navigate.execute(Route::Budgeting), Route::Login);
        assert_eq!(navigate.execute(Route::Login), Route::Login);
        assert_eq!(*navigator.routes.lock(), vec![Route::Login, Route::Login]);
    }

    #[tokio::test]
    async fn authenticated_users_skip_login() {
        let navigator = Arc::new(RecordingNavigator::default());
        let api = logged_in_client(
            Arc::new(FakeBackend::default()),
            navigator.clone(),
            AuthSettings::default(),
        )
        .await;
        let navigate = Navigate::new(api.auth().clone(), navigator.clone());

        assert_eq!(navigate.execute(Route::Login), Route::Home);
        assert_eq!(navigate.execute(Route::Budgeting), Route::Budgeting);
        assert_eq!(navigator.last(), Some(Route::Budgeting));
    }
}
