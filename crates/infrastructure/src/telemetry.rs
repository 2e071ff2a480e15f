//! Tracing subscriber setup.

use tally_application::LoggerConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Builds the filter: `RUST_LOG` when set, the configured level otherwise.
#[must_use]
pub fn env_filter(config: &LoggerConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_filter()))
}

/// Installs the global tracing subscriber.
///
/// Returns a span tagged with the configured prefix; enter it so every
/// event carries the tag. Installing twice is a no-op.
pub fn init_tracing(config: &LoggerConfig) -> tracing::Span {
    let installed = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(config.log_colors)
                .with_target(false),
        )
        .try_init();

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }

    tracing::info_span!("app", prefix = %config.prefix)
}
