//! Navigation port

use tally_domain::Route;

/// Moves the user to another view.
pub trait Navigator: Send + Sync {
    /// Navigates to `route`.
    fn navigate(&self, route: Route);
}
