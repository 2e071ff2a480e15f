//! Authentication for the Tally client.
//!
//! This module provides:
//! - The observable session state
//! - Single-flight coordination of token refreshes
//! - The auth service driving login, refresh and logout

mod refresh;
mod service;
mod session;

pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use service::AuthService;
pub use session::SessionState;
