//! Wire types exchanged with the configuration service.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::error::FetchError;

/// Result of a call that may legitimately report "nothing new".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    /// The server returned a payload.
    Data(T),
    /// The server answered 304: the caller's view is current.
    NotModified,
}

impl<T> Fetched<T> {
    pub fn into_data(self) -> Option<T> {
        match self {
            Fetched::Data(data) => Some(data),
            Fetched::NotModified => None,
        }
    }
}

/// One fully-resolved configuration of a namespace.
///
/// Immutable once built; a newer release replaces it as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub app_id: String,

    #[serde(default)]
    pub cluster: String,

    #[serde(rename = "namespaceName", default)]
    pub namespace: String,

    #[serde(rename = "configurations", default)]
    pub key_values: BTreeMap<String, String>,

    pub release_key: String,
}

impl ConfigSnapshot {
    /// Build a snapshot from parts.
    pub fn new(namespace: impl Into<String>, release_key: impl Into<String>, key_values: BTreeMap<String, String>) -> Self {
        Self {
            app_id: String::new(),
            cluster: String::new(),
            namespace: namespace.into(),
            key_values,
            release_key: release_key.into(),
        }
    }

    /// Look up one value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.key_values.get(key).map(String::as_str)
    }
}

/// A backend instance returned by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstance {
    #[serde(default)]
    pub app_name: String,

    #[serde(default)]
    pub instance_id: String,

    pub homepage_url: String,
}

/// Latest known notification id of a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub namespace_name: String,
    pub notification_id: i64,
}

impl Notification {
    /// Id sent before anything has been observed.
    pub const INITIAL_ID: i64 = -1;

    pub fn new(namespace_name: impl Into<String>, notification_id: i64) -> Self {
        Self {
            namespace_name: namespace_name.into(),
            notification_id,
        }
    }
}

/// Network endpoint of a configuration server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress(Url);

impl ServerAddress {
    /// Parse `host:port` or a full `http(s)://` URL.
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let trimmed = raw.trim();
        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };

        let url = Url::parse(&candidate)
            .map_err(|e| FetchError::InvalidUrl(format!("'{}': {}", raw, e)))?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(FetchError::InvalidUrl(format!("'{}' has no host", raw)));
        }
        Ok(Self(url))
    }

    /// Base URL that request paths are appended to.
    pub fn url(&self) -> &Url {
        &self.0
    }

    /// `host[:port]` of the address.
    pub fn authority(&self) -> String {
        match (self.0.host_str(), self.0.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => String::new(),
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.authority())
    }
}
