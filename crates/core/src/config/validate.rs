use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Busy timeout is positive
/// - Default estimate is a positive finite number no larger than the maximum
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.database.busy_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "database.busy_timeout_ms must be greater than 0".to_string(),
        ));
    }

    let assignment = &config.assignment;
    if !assignment.default_estimate_hours.is_finite() || assignment.default_estimate_hours <= 0.0
    {
        return Err(ConfigError::ValidationError(
            "assignment.default_estimate_hours must be a positive number".to_string(),
        ));
    }

    if !assignment.max_estimate_hours.is_finite()
        || assignment.max_estimate_hours < assignment.default_estimate_hours
    {
        return Err(ConfigError::ValidationError(
            "assignment.max_estimate_hours must be at least default_estimate_hours".to_string(),
        ));
    }

    Ok(())
}
