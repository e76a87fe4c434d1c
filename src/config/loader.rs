//! Configuration loading from disk.

use std::path::Path;
use std::fs;
use thiserror::Error;
use crate::config::env::apply_env_overrides;
use crate::config::schema::{AppConfig, SyncConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Default bootstrap file name.
pub const DEFAULT_BOOTSTRAP_FILE: &str = "app.properties";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value '{value}' for environment variable {key}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load, override and validate configuration.
///
/// A `.toml` file holds a full [`SyncConfig`]; any other file is read as the
/// JSON bootstrap identity and combined with default settings.
pub fn load_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(path, &content)?;

    apply_env_overrides(&mut config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_config(path: &Path, content: &str) -> Result<SyncConfig, ConfigError> {
    let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        Ok(toml::from_str(content)?)
    } else {
        let app: AppConfig = serde_json::from_str(content)?;
        Ok(SyncConfig { app, ..SyncConfig::default() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use crate::config::env::{LEGACY_REFRESH_INTERVAL_ENV, REFRESH_INTERVAL_ENV};

    // Holds temp-env's lock so env tests running in parallel cannot leak in.
    fn load(path: &Path) -> Result<SyncConfig, ConfigError> {
        temp_env::with_vars_unset([REFRESH_INTERVAL_ENV, LEGACY_REFRESH_INTERVAL_ENV], || load_config(path))
    }

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_json_bootstrap() {
        let file = write_file(
            ".properties",
            r#"{"appId":"billing","cluster":"dev","namespaceName":"application","ip":"localhost:8080"}"#,
        );
        let config = load(file.path()).unwrap();
        assert_eq!(config.app.app_id, "billing");
        assert_eq!(config.app.cluster, "dev");
        assert_eq!(config.app.ip, "localhost:8080");
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_load_toml_config() {
        let file = write_file(
            ".toml",
            r#"
            [app]
            appId = "billing"
            namespaceName = "application,db"
            ip = "http://config.internal:8080"

            [retry]
            max_attempts = 3
            interval_ms = 250
            "#,
        );
        let config = load(file.path()).unwrap();
        assert_eq!(config.app.cluster, "default");
        assert_eq!(config.app.namespaces(), vec!["application", "db"]);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.interval_ms, 250);
        assert_eq!(config.timeouts.long_poll_secs, 90);
    }

    #[test]
    fn test_validation_failure_surfaces() {
        let file = write_file(".json", r#"{"appId":"","ip":""}"#);
        match load(file.path()) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_file() {
        let file = write_file(".json", "{ not json");
        assert!(matches!(load(file.path()), Err(ConfigError::Json(_))));

        let missing = load(Path::new("/definitely/not/here/app.properties"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
