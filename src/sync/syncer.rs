//! Fetch-and-apply of a single namespace.
//!
//! Shared by startup, the long-poll loop and the periodic refresh. A fetched
//! snapshot is applied wholesale or not at all; a failed fetch never touches
//! the cache.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::cache::{ConfigCache, ConfigChange, ServerAddressCache};
use crate::client::{ConfigSnapshot, FetchClient, Fetched};
use crate::config::AppConfig;
use crate::observability::metrics;
use crate::resilience::{RetryError, Retrier};

/// What a sync did to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// A different snapshot is now current.
    Updated(ConfigChange),
    /// The server returned content identical to the cached snapshot.
    Unchanged,
    /// The server answered 304 for the release key sent.
    NotModified,
}

/// Everything needed to refresh a namespace. Cheap to clone.
#[derive(Clone)]
pub struct Syncer {
    app: Arc<AppConfig>,
    client: FetchClient,
    servers: ServerAddressCache,
    cache: ConfigCache,
    retrier: Retrier,
    read_timeout: Duration,
    backup: bool,
    changes: broadcast::Sender<ConfigChange>,
}

impl Syncer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        app: Arc<AppConfig>,
        client: FetchClient,
        servers: ServerAddressCache,
        cache: ConfigCache,
        retrier: Retrier,
        read_timeout: Duration,
        backup: bool,
        changes: broadcast::Sender<ConfigChange>,
    ) -> Self {
        Self {
            app,
            client,
            servers,
            cache,
            retrier,
            read_timeout,
            backup,
            changes,
        }
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    pub fn client(&self) -> &FetchClient {
        &self.client
    }

    pub fn servers(&self) -> &ServerAddressCache {
        &self.servers
    }

    pub fn cache(&self) -> &ConfigCache {
        &self.cache
    }

    /// Fetch `namespace` (conditional on the cached release) and apply it.
    ///
    /// Each attempt picks a server from the freshest address list.
    pub async fn sync_namespace(&self, namespace: &str) -> Result<SyncStatus, RetryError> {
        let release_key = self.cache.release_key(namespace);
        let release_key = release_key.as_deref();

        let fetched = self.retrier
            .run("config", || {
                let server = self.servers.pick();
                async move {
                    self.client
                        .fetch_config(&self.app, namespace, release_key, &server, self.read_timeout)
                        .await
                }
            })
            .await;

        match fetched {
            Ok(Fetched::Data(snapshot)) => {
                metrics::record_fetch("config", "ok");
                Ok(self.apply(snapshot))
            }
            Ok(Fetched::NotModified) => {
                metrics::record_fetch("config", "not_modified");
                tracing::debug!(namespace, release_key = ?release_key, "Config not modified");
                Ok(SyncStatus::NotModified)
            }
            Err(e) => {
                metrics::record_fetch("config", "error");
                Err(e)
            }
        }
    }

    fn apply(&self, snapshot: ConfigSnapshot) -> SyncStatus {
        let previous = self.cache.get(&snapshot.namespace);
        let Some(change) = ConfigChange::between(previous.as_deref(), &snapshot) else {
            return SyncStatus::Unchanged;
        };

        self.cache.apply(snapshot);
        metrics::record_release_change(&change.namespace);
        tracing::info!(
            namespace = %change.namespace,
            old_release = ?change.old_release,
            new_release = %change.new_release,
            changed_keys = change.changes.len(),
            "Applied new configuration"
        );

        if self.backup {
            if let Err(e) = self.cache.save_to_file() {
                tracing::warn!(error = %e, "Failed to write config backup");
            }
        }

        // No subscribers is fine.
        let _ = self.changes.send(change.clone());
        SyncStatus::Updated(change)
    }
}

impl std::fmt::Debug for Syncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Syncer")
            .field("app_id", &self.app.app_id)
            .field("cluster", &self.app.cluster)
            .field("retry", &self.retrier.policy())
            .finish()
    }
}
