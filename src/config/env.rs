//! Environment overrides.
//!
//! Only the periodic refresh interval can be overridden. A malformed value is
//! a startup error, never silently ignored.

use crate::config::loader::ConfigError;
use crate::config::schema::SyncConfig;

/// Environment variable holding the refresh interval in seconds.
pub const REFRESH_INTERVAL_ENV: &str = "CONFIG_SYNC_REFRESH_INTERVAL";

/// Key read by older Apollo clients. Same unit; consulted when the
/// primary variable is unset.
pub const LEGACY_REFRESH_INTERVAL_ENV: &str = "apollo.refreshInterval";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut SyncConfig) -> Result<(), ConfigError> {
    apply_overrides_with(config, |key| std::env::var(key).ok())
}

/// Apply overrides using the given variable lookup.
pub fn apply_overrides_with<F>(config: &mut SyncConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let found = [REFRESH_INTERVAL_ENV, LEGACY_REFRESH_INTERVAL_ENV]
        .into_iter()
        .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()).map(|v| (key, v)));
    let Some((key, raw)) = found else {
        return Ok(());
    };
    let value = raw.trim();

    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => {
            tracing::info!(key, refresh_interval_secs = secs, "Refresh interval overridden from environment");
            config.sync.refresh_interval_secs = secs;
            Ok(())
        }
        _ => {
            tracing::error!(key, value = %raw, "Invalid refresh interval override");
            Err(ConfigError::InvalidEnv {
                key,
                value: raw,
            })
        }
    }
}
