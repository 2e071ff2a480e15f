//! Client configuration
//!
//! Defaults mirror the values the Mini App ships with; loaders in the
//! infrastructure layer merge files and environment variables over them.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ApplicationError, ApplicationResult};

/// What to do when the refresh call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RefreshFailurePolicy {
    /// Drop the session and send the user to the login view.
    Logout,
    /// Try a fresh login with the launch credential first.
    #[default]
    Relogin,
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Debug and above.
    #[default]
    Debug,
    /// Info and above.
    Info,
    /// Warnings and errors.
    Warn,
    /// Errors only.
    Error,
    /// Nothing.
    Silent,
}

impl LogLevel {
    /// Returns the level as an `EnvFilter` directive.
    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Silent => "off",
        }
    }
}

/// Logger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum level when `RUST_LOG` is not set.
    pub level: LogLevel,
    /// Whether to color the output.
    pub log_colors: bool,
    /// Tag added to every log line.
    pub prefix: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Debug,
            log_colors: true,
            prefix: "[tally]".to_string(),
        }
    }
}

/// Network settings, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Per-request timeout.
    pub request_timeout_ms: u64,
    /// Interval of the background token refresh.
    pub token_refresh_period_ms: u64,
}

impl NetConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Interval of the background token refresh.
    #[must_use]
    pub const fn token_refresh_period(&self) -> Duration {
        Duration::from_millis(self.token_refresh_period_ms)
    }
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 20 * 1000,
            token_refresh_period_ms: 60 * 1000,
        }
    }
}

/// Authentication settings from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Behavior when the refresh call fails.
    pub refresh_failure: RefreshFailurePolicy,
}

/// Full client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend origin; requests go to `{api_base_url}/api{path}`.
    pub api_base_url: String,
    /// Network settings.
    pub net: NetConfig,
    /// Authentication settings.
    pub auth: AuthConfig,
    /// Logger settings.
    pub logger: LoggerConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            net: NetConfig::default(),
            auth: AuthConfig::default(),
            logger: LoggerConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parses and validates the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or not HTTP(S).
    pub fn base_url(&self) -> ApplicationResult<Url> {
        let url = Url::parse(&self.api_base_url)
            .map_err(|e| ApplicationError::Config(format!("api_base_url: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ApplicationError::Config(format!(
                "api_base_url: unsupported scheme {other}"
            ))),
        }
    }

    /// Settings consumed by the auth service.
    #[must_use]
    pub const fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            token_refresh_period: self.net.token_refresh_period(),
            refresh_failure: self.auth.refresh_failure,
        }
    }
}

/// Runtime settings of the auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSettings {
    /// Interval of the background token refresh.
    pub token_refresh_period: Duration,
    /// Behavior when the refresh call fails.
    pub refresh_failure: RefreshFailurePolicy,
}

impl Default for AuthSettings {
    fn default() -> Self {
        ClientConfig::default().auth_settings()
    }
}
