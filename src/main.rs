//! Configuration sync daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   bootstrap file ──▶ config ──▶ lifecycle::bootstrap
//!                                     │
//!                                     ▼
//!   ┌────────────────────────────────────────────────────────────┐
//!   │  INIT: fetch every namespace (retry controller)            │
//!   │        └─ fails after max attempts → process exits         │
//!   │                                                            │
//!   │  STEADY: long-poll ──change──▶ re-fetch ──▶ ConfigCache    │
//!   │                                                ▲           │
//!   │  discovery timer ──▶ ServerAddressCache        │ readers   │
//!   └────────────────────────────────────────────────┴───────────┘
//! ```
//!
//! Usage: `config-sync [BOOTSTRAP_FILE]` (defaults to `app.properties`).

use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;

use config_sync::config::loader::{load_config, DEFAULT_BOOTSTRAP_FILE};
use config_sync::lifecycle::bootstrap;
use config_sync::lifecycle::signals::wait_for_signal;
use config_sync::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BOOTSTRAP_FILE));

    let config = load_config(&path)?;
    logging::init(&config.observability);

    tracing::info!(
        path = %path.display(),
        app_id = %config.app.app_id,
        refresh_interval_secs = config.sync.refresh_interval_secs,
        "Configuration loaded"
    );

    let engine = bootstrap(config).await?;
    if let Some(snapshot) = engine.snapshot() {
        tracing::info!(
            namespace = %snapshot.namespace,
            release_key = %snapshot.release_key,
            keys = snapshot.key_values.len(),
            "Initial configuration applied"
        );
    }

    let mut changes = engine.subscribe();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    for key_change in &change.changes {
                        tracing::info!(
                            namespace = %change.namespace,
                            key = %key_change.key,
                            kind = ?key_change.kind,
                            "Configuration key changed"
                        );
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let signal = wait_for_signal().await?;
    tracing::info!(signal, "Shutdown signal received");

    engine.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
