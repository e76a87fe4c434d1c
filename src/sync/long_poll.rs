//! The steady-state synchronization loop.
//!
//! # States
//! - Polling: a long-poll is outstanding
//! - Refreshing: a namespace is being re-fetched after a change signal
//!
//! # State Transitions
//! ```text
//! Polling → Refreshing: server reports changed namespaces
//! Polling → Polling:    304 (no change), after the poll pause
//! Polling → Polling:    network/timeout error, after the error interval
//! Refreshing → Polling: re-fetch applied, or failed and left for next cycle
//! ```
//!
//! The loop is the only writer of the config cache after startup. The
//! periodic full refresh runs inside it between two polls.

use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::client::{Fetched, Notification};
use crate::config::SyncIntervals;
use crate::observability::metrics;
use crate::sync::syncer::{SyncStatus, Syncer};

/// Background task polling for configuration changes.
pub struct LongPoller {
    syncer: Syncer,
    /// Last applied notification id per namespace.
    notifications: BTreeMap<String, i64>,
    long_poll_timeout: Duration,
    pause: Duration,
    error_interval: Duration,
    refresh_interval: Duration,
    last_refresh: Instant,
}

impl LongPoller {
    pub fn new(syncer: Syncer, namespaces: &[String], intervals: &SyncIntervals, long_poll_timeout: Duration) -> Self {
        let notifications = namespaces
            .iter()
            .map(|ns| (ns.clone(), Notification::INITIAL_ID))
            .collect();

        Self {
            syncer,
            notifications,
            long_poll_timeout,
            pause: intervals.long_poll_pause(),
            error_interval: intervals.error_retry(),
            refresh_interval: intervals.refresh(),
            last_refresh: Instant::now(),
        }
    }

    /// Run until the shutdown signal fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            namespaces = ?self.notifications.keys().collect::<Vec<_>>(),
            long_poll_timeout_secs = self.long_poll_timeout.as_secs(),
            refresh_interval_secs = self.refresh_interval.as_secs(),
            "Long-poll loop starting"
        );

        loop {
            let delay = tokio::select! {
                delay = self.poll_once() => delay,
                _ = shutdown.recv() => break,
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Long-poll loop received shutdown signal, exiting loop");
    }

    /// One iteration of the loop. Returns how long to wait before the next.
    pub async fn poll_once(&mut self) -> Duration {
        if self.last_refresh.elapsed() >= self.refresh_interval {
            self.refresh_all().await;
        }

        let server = self.syncer.servers().pick();
        let notifications = self.current_notifications();
        let result = self.syncer
            .client()
            .long_poll(self.syncer.app(), &notifications, &server, self.long_poll_timeout)
            .await;

        match result {
            Ok(Fetched::NotModified) => {
                metrics::record_fetch("long_poll", "not_modified");
                tracing::trace!(server = %server, "No change reported");
                self.pause
            }
            Ok(Fetched::Data(changed)) => {
                metrics::record_fetch("long_poll", "changed");
                self.refresh_changed(changed).await;
                self.pause
            }
            Err(e) => {
                metrics::record_fetch("long_poll", "error");
                tracing::warn!(server = %server, error = %e, "Long-poll failed, polling again after error interval");
                self.error_interval
            }
        }
    }

    /// Notification ids as sent with the next poll.
    pub fn current_notifications(&self) -> Vec<Notification> {
        self.notifications
            .iter()
            .map(|(ns, id)| Notification::new(ns.clone(), *id))
            .collect()
    }

    async fn refresh_changed(&mut self, changed: Vec<Notification>) {
        for notification in changed {
            let namespace = notification.namespace_name;
            if !self.notifications.contains_key(&namespace) {
                tracing::debug!(namespace = %namespace, "Ignoring notification for unsubscribed namespace");
                continue;
            }

            // The id only advances once the new release is in hand. A failed
            // re-fetch, or a 304 from a server still behind its own
            // notification, is signalled again on the next poll.
            match self.syncer.sync_namespace(&namespace).await {
                Ok(SyncStatus::NotModified) => {
                    tracing::debug!(
                        namespace = %namespace,
                        notification_id = notification.notification_id,
                        "Change signalled but server returned not modified, retrying next poll"
                    );
                }
                Ok(status) => {
                    if status == SyncStatus::Unchanged {
                        tracing::debug!(namespace = %namespace, "Change signalled but release unchanged");
                    }
                    self.notifications.insert(namespace, notification.notification_id);
                }
                Err(e) => {
                    tracing::error!(
                        namespace = %namespace,
                        error = %e,
                        "Re-fetch after change failed, keeping previous snapshot"
                    );
                }
            }
        }
    }

    async fn refresh_all(&mut self) {
        let namespaces: Vec<String> = self.notifications.keys().cloned().collect();
        for namespace in namespaces {
            if let Err(e) = self.syncer.sync_namespace(&namespace).await {
                tracing::warn!(namespace = %namespace, error = %e, "Periodic refresh failed, keeping previous snapshot");
            }
        }
        self.last_refresh = Instant::now();
    }
}
