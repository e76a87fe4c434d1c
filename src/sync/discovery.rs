//! Periodic server list refresh.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::cache::ServerAddressCache;
use crate::client::FetchClient;
use crate::config::AppConfig;
use crate::resilience::Retrier;

/// Background task keeping the [`ServerAddressCache`] current.
pub struct ServerListRefresher {
    servers: ServerAddressCache,
    client: FetchClient,
    retrier: Retrier,
    app: Arc<AppConfig>,
    interval: Duration,
    timeout: Duration,
}

impl ServerListRefresher {
    pub fn new(
        servers: ServerAddressCache,
        client: FetchClient,
        retrier: Retrier,
        app: Arc<AppConfig>,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            servers,
            client,
            retrier,
            app,
            interval,
            timeout,
        }
    }

    /// Refresh immediately, then every interval, until shutdown.
    ///
    /// A failed refresh is logged by the cache and never stops the timer.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            seed = %self.servers.seed(),
            "Server list refresher starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = self.servers
                        .refresh(&self.client, &self.retrier, &self.app, self.timeout)
                        .await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Server list refresher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
