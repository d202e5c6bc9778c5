//! Work-queue configuration sources: a TOML file layered under
//! `PRINTQUEUE_*` environment overrides.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "PRINTQUEUE_";

/// Separates nested keys, so `PRINTQUEUE_DATABASE__BUSY_TIMEOUT_MS` sets
/// `database.busy_timeout_ms`.
const ENV_NESTING: &str = "__";

/// Read the server, database and assignment sections from `path`, then apply
/// environment overrides. Missing sections take their defaults; the file
/// itself must exist.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split(ENV_NESTING))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse a config from TOML text alone, without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
