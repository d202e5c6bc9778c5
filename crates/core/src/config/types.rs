use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub assignment: AssignmentConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// How long a transaction waits on the SQLite write lock before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("printqueue.db")
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// Work-queue assignment tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssignmentConfig {
    /// Duration assumed for a job submitted without a positive estimate.
    #[serde(default = "default_estimate_hours")]
    pub default_estimate_hours: f64,
    /// Estimates above this are rejected as invalid.
    #[serde(default = "default_max_estimate_hours")]
    pub max_estimate_hours: f64,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            default_estimate_hours: default_estimate_hours(),
            max_estimate_hours: default_max_estimate_hours(),
        }
    }
}

fn default_estimate_hours() -> f64 {
    4.0
}

fn default_max_estimate_hours() -> f64 {
    720.0
}

/// Sanitized config for API responses.
///
/// Nothing here is secret today, but the database location is reduced to
/// its file name so the API never leaks host paths.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database_file: Option<String>,
    pub assignment: AssignmentConfig,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database_file: config
                .database
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            assignment: config.assignment.clone(),
        }
    }
}
