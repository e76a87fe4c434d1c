//! Pool of reachable configuration servers.
//!
//! # Responsibilities
//! - Hold the address list from the last successful discovery
//! - Pick an address for the next request
//! - Refresh the list from the seed address
//!
//! # Design Decisions
//! - A refresh replaces the whole list; it never merges
//! - A failed refresh leaves the previous list untouched
//! - Requests fall back to the seed address while the list is empty

use std::sync::Arc;
use std::time::Duration;
use arc_swap::ArcSwap;
use rand::seq::SliceRandom;

use crate::client::{FetchClient, Fetched, ServerAddress};
use crate::config::AppConfig;
use crate::observability::metrics;
use crate::resilience::{RetryError, Retrier};

/// Current set of backend addresses, shared between the refresher and readers.
#[derive(Debug, Clone)]
pub struct ServerAddressCache {
    seed: ServerAddress,
    addresses: Arc<ArcSwap<Vec<ServerAddress>>>,
}

impl ServerAddressCache {
    /// Create an empty pool that falls back to `seed`.
    pub fn new(seed: ServerAddress) -> Self {
        Self {
            seed,
            addresses: Arc::new(ArcSwap::from_pointee(Vec::new())),
        }
    }

    pub fn seed(&self) -> &ServerAddress {
        &self.seed
    }

    /// The current address list. Never blocks; empty before the first discovery.
    pub fn current(&self) -> Arc<Vec<ServerAddress>> {
        self.addresses.load_full()
    }

    /// Replace the whole list.
    pub fn replace(&self, addresses: Vec<ServerAddress>) {
        metrics::record_server_count(addresses.len());
        self.addresses.store(Arc::new(addresses));
    }

    /// Address for the next request: a random pool member, or the seed.
    pub fn pick(&self) -> ServerAddress {
        let current = self.addresses.load();
        current
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| self.seed.clone())
    }

    /// Run one discovery against the seed address.
    ///
    /// On success the list is replaced and its new length returned. On
    /// failure the previous list is kept and the error is returned for logging.
    pub async fn refresh(
        &self,
        client: &FetchClient,
        retrier: &Retrier,
        app: &AppConfig,
        timeout: Duration,
    ) -> Result<usize, RetryError> {
        let fetched = retrier
            .run("discovery", || client.fetch_discovery(app, &self.seed, timeout))
            .await;

        match fetched {
            Ok(Fetched::Data(addresses)) if addresses.is_empty() => {
                tracing::warn!(seed = %self.seed, "Discovery returned no servers, keeping previous list");
                metrics::record_fetch("discovery", "empty");
                Ok(self.current().len())
            }
            Ok(Fetched::Data(addresses)) => {
                let count = addresses.len();
                tracing::debug!(seed = %self.seed, servers = count, "Server list refreshed");
                metrics::record_fetch("discovery", "ok");
                self.replace(addresses);
                Ok(count)
            }
            Ok(Fetched::NotModified) => {
                metrics::record_fetch("discovery", "not_modified");
                Ok(self.current().len())
            }
            Err(e) => {
                tracing::error!(seed = %self.seed, error = %e, "Server list refresh failed, keeping previous list");
                metrics::record_fetch("discovery", "error");
                Err(e)
            }
        }
    }
}
