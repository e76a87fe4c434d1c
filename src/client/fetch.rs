//! HTTP client for the configuration service.
//!
//! # Responsibilities
//! - Discovery of backend addresses
//! - Config snapshot fetches (conditional on the current release key)
//! - Long-poll for change notifications
//! - Bound every call with a caller-supplied timeout
//!
//! Every call reads the response body to completion before returning, so the
//! connection is back in the pool (or closed) once the call returns.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::time::Duration;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::client::error::FetchError;
use crate::client::types::{ConfigSnapshot, Fetched, Notification, ServerAddress, ServiceInstance};
use crate::client::urls;
use crate::config::AppConfig;

/// Remote fetch client. Cheap to clone.
#[derive(Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    client_ip: String,
}

impl FetchClient {
    /// Create a client with the given connect timeout.
    ///
    /// `client_ip` is reported to the server; the local address is detected
    /// when it is `None`.
    pub fn new(connect_timeout: Duration, client_ip: Option<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http,
            client_ip: client_ip.unwrap_or_else(local_ip),
        })
    }

    /// Fetch the current backend address list from `seed`.
    pub async fn fetch_discovery(
        &self,
        app: &AppConfig,
        seed: &ServerAddress,
        timeout: Duration,
    ) -> Result<Fetched<Vec<ServerAddress>>, FetchError> {
        let url = urls::discovery_url(seed, app, &self.client_ip)?;
        let instances: Vec<ServiceInstance> = match self.get_json(url, timeout).await? {
            Fetched::Data(instances) => instances,
            Fetched::NotModified => return Ok(Fetched::NotModified),
        };

        let mut addresses: Vec<ServerAddress> = Vec::with_capacity(instances.len());
        for instance in instances {
            match ServerAddress::parse(&instance.homepage_url) {
                Ok(addr) if !addresses.contains(&addr) => addresses.push(addr),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(instance = %instance.instance_id, error = %e, "Ignoring invalid server address from discovery");
                }
            }
        }
        Ok(Fetched::Data(addresses))
    }

    /// Fetch the configuration of one namespace.
    ///
    /// With a `release_key` the server answers 304 when nothing changed.
    pub async fn fetch_config(
        &self,
        app: &AppConfig,
        namespace: &str,
        release_key: Option<&str>,
        server: &ServerAddress,
        timeout: Duration,
    ) -> Result<Fetched<ConfigSnapshot>, FetchError> {
        let url = urls::config_url(server, app, namespace, release_key, &self.client_ip)?;
        let fetched = self.get_json::<ConfigSnapshot>(url, timeout).await?;
        Ok(match fetched {
            Fetched::Data(mut snapshot) => {
                // The cache is keyed by the requested name.
                snapshot.namespace = namespace.to_string();
                Fetched::Data(snapshot)
            }
            Fetched::NotModified => Fetched::NotModified,
        })
    }

    /// Hold a request open until a namespace changes or the server times out.
    ///
    /// Returns the changed namespaces with their new notification ids.
    pub async fn long_poll(
        &self,
        app: &AppConfig,
        notifications: &[Notification],
        server: &ServerAddress,
        timeout: Duration,
    ) -> Result<Fetched<Vec<Notification>>, FetchError> {
        let url = urls::notifications_url(server, app, notifications)?;
        self.get_json(url, timeout).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, timeout: Duration) -> Result<Fetched<T>, FetchError> {
        let url_str = url.to_string();
        tracing::debug!(url = %url_str, "Sending request");

        let response = self.http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(&url_str, timeout, e))?;

        match response.status() {
            StatusCode::NOT_MODIFIED => Ok(Fetched::NotModified),
            status if status.is_success() => {
                let body = response.bytes().await.map_err(|e| classify(&url_str, timeout, e))?;
                // A 2xx without a payload carries nothing to apply.
                if body.iter().all(u8::is_ascii_whitespace) {
                    return Ok(Fetched::NotModified);
                }
                serde_json::from_slice(&body)
                    .map(Fetched::Data)
                    .map_err(|source| FetchError::Decode { url: url_str, source })
            }
            status => Err(FetchError::Status {
                url: url_str,
                status: status.as_u16(),
            }),
        }
    }
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("client_ip", &self.client_ip)
            .finish()
    }
}

fn classify(url: &str, timeout: Duration, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Best-effort outbound address of this host.
///
/// Connecting a UDP socket only selects a route; no packet is sent.
pub fn local_ip() -> String {
    let detected = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
    detected.to_string()
}
