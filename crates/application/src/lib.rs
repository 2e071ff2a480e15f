//! Tally Application - Use cases and ports
//!
//! This crate holds the session logic of the Tally client: authentication,
//! the authenticated API client, persisted settings and the budgeting use
//! cases. External systems are reached through the traits in [`ports`].

pub mod api_client;
pub mod auth;
pub mod config;
pub mod error;
pub mod ports;
pub mod storage;
pub mod use_cases;

#[cfg(any(test, feature = "test-util"))]
pub mod test_support;

pub use api_client::ApiClient;
pub use auth::{AuthService, RefreshCoordinator, RefreshOutcome, SessionState};
pub use config::{
    AuthConfig, AuthSettings, ClientConfig, LogLevel, LoggerConfig, NetConfig,
    RefreshFailurePolicy,
};
pub use error::{ApplicationError, ApplicationResult};
pub use storage::{AppStorage, ThemeStorage, TokenStorage};
