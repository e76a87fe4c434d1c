//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sync client.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Root configuration for the synchronization engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Bootstrap identity (application, cluster, namespaces, seed server).
    pub app: AppConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry configuration.
    pub retry: RetryConfig,

    /// Background loop intervals.
    pub sync: SyncIntervals,

    /// Local mirror of the cache.
    pub backup: BackupConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Bootstrap identity of this process.
///
/// Field names follow the camelCase layout of the bootstrap file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Application id registered with the configuration service.
    pub app_id: String,

    /// Cluster name.
    pub cluster: String,

    /// Namespace name, or a comma-separated list of namespaces.
    pub namespace_name: String,

    /// Seed server address (e.g., "127.0.0.1:8080" or "http://config:8080").
    pub ip: String,

    /// Address reported to the server as the client ip.
    /// Detected from the local interfaces when absent.
    pub client_ip: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            cluster: "default".to_string(),
            namespace_name: "application".to_string(),
            ip: String::new(),
            client_ip: None,
        }
    }
}

impl AppConfig {
    /// Namespaces this process subscribes to, in declaration order.
    pub fn namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = Vec::new();
        for ns in self.namespace_name.split(',').map(str::trim) {
            if !ns.is_empty() && !namespaces.iter().any(|n| n == ns) {
                namespaces.push(ns.to_string());
            }
        }
        namespaces
    }

    /// The first declared namespace, used by single-namespace accessors.
    pub fn primary_namespace(&self) -> Option<String> {
        self.namespaces().into_iter().next()
    }
}

/// Timeout configuration for the remote calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Timeout for discovery and config fetches in seconds.
    pub read_secs: u64,

    /// Timeout for a single long-poll in seconds.
    /// Must exceed the server-side hold time.
    pub long_poll_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 1000,
            read_secs: 5,
            long_poll_secs: 90,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn long_poll(&self) -> Duration {
        Duration::from_secs(self.long_poll_secs)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per logical fetch.
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds.
    pub interval_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval_ms: 1000,
        }
    }
}

/// Intervals driving the background loops.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncIntervals {
    /// Full re-fetch of every namespace, in seconds.
    pub refresh_interval_secs: u64,

    /// Server address list refresh, in seconds.
    pub server_refresh_interval_secs: u64,

    /// Pause between two long-polls in milliseconds.
    pub long_poll_pause_ms: u64,

    /// Delay before polling again after a failed long-poll, in milliseconds.
    pub error_retry_interval_ms: u64,
}

impl Default for SyncIntervals {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 5 * 60,
            server_refresh_interval_secs: 20 * 60,
            long_poll_pause_ms: 5000,
            error_retry_interval_ms: 1000,
        }
    }
}

impl SyncIntervals {
    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn server_refresh(&self) -> Duration {
        Duration::from_secs(self.server_refresh_interval_secs)
    }

    pub fn long_poll_pause(&self) -> Duration {
        Duration::from_millis(self.long_poll_pause_ms)
    }

    pub fn error_retry(&self) -> Duration {
        Duration::from_millis(self.error_retry_interval_ms)
    }
}

/// Local mirror of the config cache.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Write the cache to disk after every applied change.
    pub enabled: bool,

    /// Path of the JSON backup file.
    pub path: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "config-backup.json".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9091".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol_constants() {
        let config = SyncConfig::default();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.interval_ms, 1000);
        assert_eq!(config.sync.server_refresh(), Duration::from_secs(1200));
        assert_eq!(config.sync.error_retry(), Duration::from_secs(1));
        assert_eq!(config.app.cluster, "default");
    }

    #[test]
    fn test_namespace_list() {
        let app = AppConfig {
            namespace_name: "application, db ,,application,redis".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(app.namespaces(), vec!["application", "db", "redis"]);
        assert_eq!(app.primary_namespace().as_deref(), Some("application"));

        let empty = AppConfig {
            namespace_name: " , ".to_string(),
            ..AppConfig::default()
        };
        assert!(empty.namespaces().is_empty());
        assert!(empty.primary_namespace().is_none());
    }
}
