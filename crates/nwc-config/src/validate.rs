//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::ServiceConfig;

/// Upper bound for `limits.max_description_len`.
pub const MAX_DESCRIPTION_LEN_BOUND: usize = 4096;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &ServiceConfig) -> ConfigResult<()> {
    validate_storage(config)?;
    validate_logging(config)?;
    validate_provider(config)?;
    validate_limits(config)?;
    Ok(())
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message,
    }
}

fn validate_storage(config: &ServiceConfig) -> ConfigResult<()> {
    if config.storage.data_dir.trim().is_empty() {
        return Err(invalid(
            "storage.data_dir",
            "data directory must not be empty".to_owned(),
        ));
    }
    Ok(())
}

fn validate_logging(config: &ServiceConfig) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}

fn validate_provider(config: &ServiceConfig) -> ConfigResult<()> {
    if config.provider.relay.trim().is_empty() {
        return Err(invalid(
            "provider.relay",
            "relay must not be empty".to_owned(),
        ));
    }
    Ok(())
}

fn validate_limits(config: &ServiceConfig) -> ConfigResult<()> {
    let len = config.limits.max_description_len;
    if len == 0 || len > MAX_DESCRIPTION_LEN_BOUND {
        return Err(invalid(
            "limits.max_description_len",
            format!("{len} is out of range; must be between 1 and {MAX_DESCRIPTION_LEN_BOUND}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_data_dir_rejected() {
        let mut config = ServiceConfig::default();
        config.storage.data_dir = "  ".to_owned();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError { field, .. }) if field == "storage.data_dir"
        ));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = ServiceConfig::default();
        config.logging.format = "xml".to_owned();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::ValidationError { field, .. }) if field == "logging.format"
        ));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut config = ServiceConfig::default();
        config.logging.level = "loud".to_owned();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_description_limit_bounds() {
        let mut config = ServiceConfig::default();
        config.limits.max_description_len = 0;
        assert!(validate(&config).is_err());
        config.limits.max_description_len = 4097;
        assert!(validate(&config).is_err());
        config.limits.max_description_len = 4096;
        assert!(validate(&config).is_ok());
    }
}
