//! Configuration loading.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. An optional config file (TOML, JSON or YAML, by extension)
//! 3. `TALLY__`-prefixed environment variables, `__` separating sections,
//!    e.g. `TALLY__NET__REQUEST_TIMEOUT_MS=5000`

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use tally_application::{ApplicationError, ApplicationResult, ClientConfig};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "TALLY";

/// Separator between the prefix and nested keys.
pub const ENV_SEPARATOR: &str = "__";

/// File name looked up in the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Returns the default config file location.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    crate::storage::config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Loads the configuration from `file` (if it exists) and the process
/// environment.
///
/// # Errors
///
/// Returns [`ApplicationError::Config`] if a source cannot be parsed or a
/// value has the wrong type.
pub fn load_config(file: Option<&Path>) -> ApplicationResult<ClientConfig> {
    load_config_with(file, environment())
}

/// Loads the configuration with an explicit environment source.
///
/// # Errors
///
/// Returns [`ApplicationError::Config`] if a source cannot be parsed or a
/// value has the wrong type.
pub fn load_config_with(
    file: Option<&Path>,
    environment: Environment,
) -> ApplicationResult<ClientConfig> {
    let defaults = Config::try_from(&ClientConfig::default()).map_err(config_error)?;

    let mut builder = Config::builder().add_source(defaults);
    if let Some(path) = file {
        tracing::debug!(path = %path.display(), "Reading config file");
        builder = builder.add_source(File::from(path).required(false));
    }

    let config: ClientConfig = builder
        .add_source(environment)
        .build()
        .and_then(Config::try_deserialize)
        .map_err(config_error)?;

    config.base_url()?;
    Ok(config)
}

/// Returns the environment source reading `TALLY__*` variables.
#[must_use]
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

fn config_error(error: config::ConfigError) -> ApplicationError {
    ApplicationError::Config(error.to_string())
}
