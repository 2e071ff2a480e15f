//! Navigator that tracks the current route.

use tally_application::ports::Navigator;
use tally_domain::Route;
use tokio::sync::watch;

/// Keeps the current route and publishes every change.
///
/// Stands in for the router of a graphical shell: subscribers render
/// whatever route is current.
#[derive(Debug)]
pub struct RouteTracker {
    current: watch::Sender<Route>,
}

impl RouteTracker {
    /// Creates a tracker starting at `initial`.
    #[must_use]
    pub fn new(initial: Route) -> Self {
        let (current, _) = watch::channel(initial);
        Self { current }
    }

    /// Returns the current route.
    #[must_use]
    pub fn current(&self) -> Route {
        *self.current.borrow()
    }

    /// Subscribes to route changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }
}

impl Default for RouteTracker {
    fn default() -> Self {
        Self::new(Route::default())
    }
}

impl Navigator for RouteTracker {
    fn navigate(&self, route: Route) {
        let previous = self.current.send_replace(route);
        if previous != route {
            tracing::info!(from = %previous, to = %route, "Navigated");
        }
    }
}
