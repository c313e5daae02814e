use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Transmission host is an http(s) URL
/// - Timeout is not 0
/// - Seed ratio and seed time are not below -1 (unlimited)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let host = &config.transmission.host;
    if !(host.starts_with("http://") || host.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "transmission.host must start with http:// or https://, got '{}'",
            host
        )));
    }

    if config.transmission.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transmission.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.torrent.seed_ratio.is_some_and(|r| r < -1.0) {
        return Err(ConfigError::ValidationError(
            "torrent.seed_ratio cannot be below -1".to_string(),
        ));
    }

    if config.torrent.seed_time_minutes.is_some_and(|t| t < -1.0) {
        return Err(ConfigError::ValidationError(
            "torrent.seed_time_minutes cannot be below -1".to_string(),
        ));
    }

    Ok(())
}
