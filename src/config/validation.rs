//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts > 0)
//! - Check that the bootstrap identity is complete
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SyncConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use crate::config::schema::SyncConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field '{0}' must not be empty")]
    Empty(&'static str),

    #[error("field '{0}' must be greater than zero")]
    Zero(&'static str),

    #[error("long-poll timeout ({long_poll_secs}s) must exceed read timeout ({read_secs}s)")]
    LongPollTooShort { long_poll_secs: u64, read_secs: u64 },
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &SyncConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.app.app_id.trim().is_empty() {
        errors.push(ValidationError::Empty("app.appId"));
    }
    if config.app.cluster.trim().is_empty() {
        errors.push(ValidationError::Empty("app.cluster"));
    }
    if config.app.namespaces().is_empty() {
        errors.push(ValidationError::Empty("app.namespaceName"));
    }
    if config.app.ip.trim().is_empty() {
        errors.push(ValidationError::Empty("app.ip"));
    }

    let positive = [
        ("timeouts.connect_ms", config.timeouts.connect_ms),
        ("timeouts.read_secs", config.timeouts.read_secs),
        ("timeouts.long_poll_secs", config.timeouts.long_poll_secs),
        ("retry.max_attempts", u64::from(config.retry.max_attempts)),
        ("sync.refresh_interval_secs", config.sync.refresh_interval_secs),
        ("sync.server_refresh_interval_secs", config.sync.server_refresh_interval_secs),
        ("sync.error_retry_interval_ms", config.sync.error_retry_interval_ms),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if config.timeouts.long_poll_secs != 0 && config.timeouts.long_poll_secs <= config.timeouts.read_secs {
        errors.push(ValidationError::LongPollTooShort {
            long_poll_secs: config.timeouts.long_poll_secs,
            read_secs: config.timeouts.read_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
