//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics exporter when enabled
//! - Fetch the initial configuration before the process counts as ready
//! - Start background tasks (long-poll, discovery)
//!
//! Loading the config file happens first, in the caller, so logging can be
//! set up before anything here runs.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A process never proceeds with an empty configuration

use std::net::SocketAddr;
use thiserror::Error;

use crate::client::FetchError;
use crate::config::{ConfigError, SyncConfig};
use crate::observability::metrics;
use crate::resilience::RetryError;
use crate::sync::SyncEngine;

/// Errors that stop the process during startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot set up remote client: {0}")]
    Client(#[source] FetchError),

    #[error("initial fetch of namespace '{namespace}' failed: {source}")]
    InitialFetch {
        namespace: String,
        #[source]
        source: RetryError,
    },

    #[error("namespace '{0}' has no configuration on the server")]
    EmptyInitial(String),
}

impl StartupError {
    /// Number of attempts made when retries were exhausted.
    pub fn exhausted_attempts(&self) -> Option<u32> {
        match self {
            StartupError::InitialFetch { source, .. } => Some(source.attempts),
            _ => None,
        }
    }
}

/// Start observability exporters and the sync engine from a loaded config.
pub async fn bootstrap(config: SyncConfig) -> Result<SyncEngine, StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address, metrics disabled"
            ),
        }
    }

    SyncEngine::start(config).await
}
