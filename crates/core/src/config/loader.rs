use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, validate::validate_config, ConfigError};

/// Environment prefix; nested keys use `__`, e.g. `MEDIADL_TRANSMISSION__HOST`.
const ENV_PREFIX: &str = "MEDIADL_";

/// Load and validate configuration from a TOML file.
///
/// Environment variables override file values. A config that parses but
/// fails [`validate_config`] is rejected here, so a client is never built
/// from an unusable host or a zero timeout.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let figment = Figment::from(Toml::file(path)).merge(Env::prefixed(ENV_PREFIX).split("__"));
    let config = figment
        .extract::<Config>()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[transmission]
host = "http://localhost:9091"

[torrent]
paused = true
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.transmission.host, "http://localhost:9091");
        assert!(config.torrent.paused);
    }

    #[test]
    fn test_load_config_from_str_missing_host() {
        let toml = r#"
[transmission]
username = "admin"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_rejects_invalid_host() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[transmission]
host = "localhost:9091"
"#
        )
        .unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[transmission]
host = "http://127.0.0.1:9091"
rpc_path = "bt"

[torrent]
seed_time_minutes = 45
seed_location = "/seeding"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.transmission.host, "http://127.0.0.1:9091");
        assert_eq!(config.transmission.rpc_path, "bt");
        assert_eq!(config.torrent.seed_time_minutes, Some(45.0));
        assert!(config.torrent.seed_location.is_some());
    }
}
