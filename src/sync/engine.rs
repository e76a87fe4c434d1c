//! Supervisor of the synchronization tasks and public read API.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::cache::{ConfigCache, ConfigChange, ServerAddressCache};
use crate::client::{ConfigSnapshot, FetchClient, ServerAddress};
use crate::config::validation::validate_config;
use crate::config::{AppConfig, ConfigError, SyncConfig};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::startup::StartupError;
use crate::resilience::{RetryPolicy, Retrier};
use crate::sync::discovery::ServerListRefresher;
use crate::sync::long_poll::LongPoller;
use crate::sync::syncer::{SyncStatus, Syncer};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A running synchronization engine.
///
/// Owns the background tasks; reads go straight to the shared caches and
/// never block on the network. Dropping the engine stops the tasks.
pub struct SyncEngine {
    app: Arc<AppConfig>,
    primary_namespace: String,
    cache: ConfigCache,
    servers: ServerAddressCache,
    changes: broadcast::Sender<ConfigChange>,
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
}

impl SyncEngine {
    /// Fetch every namespace once, then start the background loops.
    ///
    /// Returns only after each namespace holds a snapshot. Exhausting the
    /// retries on any namespace is a startup fault.
    pub async fn start(config: SyncConfig) -> Result<Self, StartupError> {
        validate_config(&config).map_err(|errors| StartupError::Config(ConfigError::Validation(errors)))?;

        let app = Arc::new(config.app.clone());
        let namespaces = app.namespaces();
        let primary_namespace = app.primary_namespace().unwrap_or_default();

        let seed = ServerAddress::parse(&app.ip).map_err(StartupError::Client)?;
        let client = FetchClient::new(config.timeouts.connect(), app.client_ip.clone())
            .map_err(StartupError::Client)?;
        let retrier = Retrier::new(RetryPolicy::from(&config.retry));
        let backup_path = config.backup.enabled.then(|| PathBuf::from(&config.backup.path));
        let cache = ConfigCache::new(backup_path);
        let servers = ServerAddressCache::new(seed);
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let shutdown = Shutdown::new();

        tracing::info!(
            app_id = %app.app_id,
            cluster = %app.cluster,
            namespaces = ?namespaces,
            seed = %servers.seed(),
            "Sync engine starting"
        );

        // Discovery is best-effort: its first tick runs alongside the initial fetch.
        let refresher = ServerListRefresher::new(
            servers.clone(),
            client.clone(),
            retrier,
            app.clone(),
            config.sync.server_refresh(),
            config.timeouts.read(),
        );
        let mut tasks = vec![tokio::spawn(refresher.run(shutdown.subscribe()))];

        let syncer = Syncer::new(
            app.clone(),
            client,
            servers.clone(),
            cache.clone(),
            retrier,
            config.timeouts.read(),
            config.backup.enabled,
            changes.clone(),
        );

        if let Err(e) = initial_sync(&syncer, &namespaces).await {
            tracing::error!(error = %e, "Initial configuration fetch failed");
            shutdown.trigger();
            return Err(e);
        }

        let poller = LongPoller::new(syncer, &namespaces, &config.sync, config.timeouts.long_poll());
        tasks.push(tokio::spawn(poller.run(shutdown.subscribe())));

        tracing::info!(namespaces = cache.count(), "Sync engine ready");

        Ok(Self {
            app,
            primary_namespace,
            cache,
            servers,
            changes,
            shutdown,
            tasks,
        })
    }

    /// Bootstrap identity of this process.
    pub fn app_config(&self) -> &AppConfig {
        &self.app
    }

    /// Subscribed namespaces, in declaration order.
    pub fn namespaces(&self) -> Vec<String> {
        self.app.namespaces()
    }

    /// Current snapshot of the primary (first declared) namespace.
    pub fn snapshot(&self) -> Option<Arc<ConfigSnapshot>> {
        self.cache.get(&self.primary_namespace)
    }

    /// Current snapshot of `namespace`.
    pub fn snapshot_of(&self, namespace: &str) -> Option<Arc<ConfigSnapshot>> {
        self.cache.get(namespace)
    }

    /// A value from the primary namespace.
    pub fn get(&self, key: &str) -> Option<String> {
        self.cache.value(&self.primary_namespace, key)
    }

    /// A value from the primary namespace, or `default`.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Shared handle to the config cache.
    pub fn cache(&self) -> ConfigCache {
        self.cache.clone()
    }

    /// Shared handle to the server address pool.
    pub fn servers(&self) -> ServerAddressCache {
        self.servers.clone()
    }

    /// Receive every change applied from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
        self.changes.subscribe()
    }

    /// Stop the background loops and wait for them to exit.
    pub async fn shutdown(mut self) {
        self.shutdown.trigger();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Sync task ended abnormally");
            }
        }
        tracing::info!("Sync engine stopped");
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("app_id", &self.app.app_id)
            .field("cache", &self.cache)
            .field("servers", &self.servers.current().len())
            .finish()
    }
}

async fn initial_sync(syncer: &Syncer, namespaces: &[String]) -> Result<(), StartupError> {
    for namespace in namespaces {
        match syncer.sync_namespace(namespace).await {
            Ok(SyncStatus::Updated(_)) => {}
            Ok(_) if syncer.cache().get(namespace).is_some() => {}
            Ok(_) => return Err(StartupError::EmptyInitial(namespace.clone())),
            Err(source) => {
                return Err(StartupError::InitialFetch {
                    namespace: namespace.clone(),
                    source,
                })
            }
        }
    }
    Ok(())
}
