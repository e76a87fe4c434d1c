//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use config_sync::client::Notification;
use config_sync::SyncConfig;

/// A running mock configuration server.
#[derive(Clone)]
pub struct MockServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockServer {
    /// Request targets (path and query) received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose path starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.requests().iter().filter(|r| r.starts_with(prefix)).count()
    }

    pub fn homepage_url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

/// Start a programmable mock server.
///
/// `f` receives the request target (`/path?query`) and returns status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockServer
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let server = MockServer { addr, requests: requests.clone() };
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        let Some(target) = read_request_target(&mut socket).await else {
                            return;
                        };
                        requests.lock().unwrap().push(target.clone());

                        let (status, body) = f(target).await;
                        let status_text = match status {
                            200 => "200 OK",
                            304 => "304 Not Modified",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    server
}

async fn read_request_target(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        head.extend_from_slice(&buf[..n]);
    }
    let head = String::from_utf8_lossy(&head);
    let request_line = head.lines().next()?;
    request_line.split_whitespace().nth(1).map(str::to_string)
}

/// Config payload as served by `/configs/...`.
#[allow(dead_code)]
pub fn config_body(namespace: &str, release_key: &str, pairs: &[(&str, &str)]) -> String {
    let configurations: serde_json::Map<String, serde_json::Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect();
    serde_json::json!({
        "appId": "billing",
        "cluster": "default",
        "namespaceName": namespace,
        "configurations": configurations,
        "releaseKey": release_key,
    })
    .to_string()
}

/// Decode one query parameter of a request target.
#[allow(dead_code)]
pub fn query_param(target: &str, key: &str) -> Option<String> {
    let url = Url::parse(&format!("http://mock{}", target)).ok()?;
    url.query_pairs().find(|(k, _)| k == key).map(|(_, v)| v.into_owned())
}

/// Notification ids carried by a long-poll request.
#[allow(dead_code)]
pub fn notifications_of(target: &str) -> Vec<Notification> {
    query_param(target, "notifications")
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

/// A config pointing at `addr` with intervals short enough for tests.
pub fn test_config(addr: SocketAddr) -> SyncConfig {
    let mut config = SyncConfig::default();
    config.app.app_id = "billing".to_string();
    config.app.ip = addr.to_string();
    config.app.client_ip = Some("10.0.0.9".to_string());
    config.timeouts.read_secs = 1;
    config.timeouts.long_poll_secs = 2;
    config.retry.interval_ms = 10;
    config.sync.long_poll_pause_ms = 20;
    config.sync.error_retry_interval_ms = 20;
    config
}

/// Poll `check` until it holds or `deadline` passes.
#[allow(dead_code)]
pub async fn wait_until<F: Fn() -> bool>(deadline: Duration, check: F) -> bool {
    let started = tokio::time::Instant::now();
    while started.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
