//! Bridge from `nwc_config::ServiceConfig` to engine and telemetry types.

use nwc_config::ServiceConfig;
use nwc_registry::RegistryLimits;
use nwc_telemetry::{LogConfig, LogFormat};

/// Logging settings for the telemetry crate.
///
/// The format was validated at load time; an unknown value falls back to
/// the telemetry default.
pub(crate) fn to_log_config(config: &ServiceConfig) -> LogConfig {
    let mut log = LogConfig::new(config.logging.level.clone())
        .with_format(config.logging.format.parse().unwrap_or(LogFormat::Compact));
    for directive in &config.logging.directives {
        log = log.with_directive(directive.clone());
    }
    log
}

/// Registry limits.
pub(crate) fn to_registry_limits(config: &ServiceConfig) -> RegistryLimits {
    RegistryLimits {
        max_description_len: config.limits.max_description_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_from_service_config() {
        let mut config = ServiceConfig::default();
        config.logging.level = "debug".to_owned();
        config.logging.format = "json".to_owned();
        config.logging.directives = vec!["nwc_registry=trace".to_owned()];

        let log = to_log_config(&config);
        assert_eq!(log.level, "debug");
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.directives, vec!["nwc_registry=trace"]);
    }

    #[test]
    fn test_registry_limits_from_service_config() {
        let mut config = ServiceConfig::default();
        config.limits.max_description_len = 64;
        assert_eq!(to_registry_limits(&config).max_description_len, 64);
    }
}
