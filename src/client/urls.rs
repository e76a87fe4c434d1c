//! Request target construction.
//!
//! Identity fields are always percent-encoded: path parts go through
//! `path_segments_mut`, query values through `query_pairs_mut`.

use url::Url;

use crate::client::error::FetchError;
use crate::client::types::{Notification, ServerAddress};
use crate::config::AppConfig;

/// `/services/config?appId={appId}&ip={clientIp}`
pub fn discovery_url(server: &ServerAddress, app: &AppConfig, client_ip: &str) -> Result<Url, FetchError> {
    let mut url = with_segments(server, &["services", "config"])?;
    url.query_pairs_mut()
        .append_pair("appId", &app.app_id)
        .append_pair("ip", client_ip);
    Ok(url)
}

/// `/configs/{appId}/{cluster}/{namespace}?releaseKey={releaseKey}&ip={clientIp}`
pub fn config_url(
    server: &ServerAddress,
    app: &AppConfig,
    namespace: &str,
    release_key: Option<&str>,
    client_ip: &str,
) -> Result<Url, FetchError> {
    let mut url = with_segments(server, &["configs", &app.app_id, &app.cluster, namespace])?;
    // Sent empty before the first release is known.
    url.query_pairs_mut()
        .append_pair("releaseKey", release_key.unwrap_or_default())
        .append_pair("ip", client_ip);
    Ok(url)
}

/// `/notifications/v2?appId={appId}&cluster={cluster}&notifications={json}`
pub fn notifications_url(
    server: &ServerAddress,
    app: &AppConfig,
    notifications: &[Notification],
) -> Result<Url, FetchError> {
    let encoded = serde_json::to_string(notifications).map_err(FetchError::Encode)?;
    let mut url = with_segments(server, &["notifications", "v2"])?;
    url.query_pairs_mut()
        .append_pair("appId", &app.app_id)
        .append_pair("cluster", &app.cluster)
        .append_pair("notifications", &encoded);
    Ok(url)
}

fn with_segments(server: &ServerAddress, segments: &[&str]) -> Result<Url, FetchError> {
    let mut url = server.url().clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidUrl(server.url().to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> AppConfig {
        AppConfig {
            app_id: "my app".to_string(),
            cluster: "default".to_string(),
            namespace_name: "application".to_string(),
            ip: "localhost:8080".to_string(),
            client_ip: None,
        }
    }

    fn query_value(url: &Url, key: &str) -> Option<String> {
        url.query_pairs().find(|(k, _)| k == key).map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_config_url_escapes_identity() {
        let server = ServerAddress::parse("10.0.0.1:8080").unwrap();
        let url = config_url(&server, &app(), "team/db", Some("2024+r1&x=1"), "10.1.1.1").unwrap();

        assert_eq!(url.path(), "/configs/my%20app/default/team%2Fdb");
        assert_eq!(query_value(&url, "releaseKey").as_deref(), Some("2024+r1&x=1"));
        assert_eq!(query_value(&url, "ip").as_deref(), Some("10.1.1.1"));
        assert_eq!(url.query_pairs().count(), 2);
    }

    #[test]
    fn test_config_url_without_release_key() {
        let server = ServerAddress::parse("http://config.internal:8080/").unwrap();
        let url = config_url(&server, &app(), "application", None, "10.1.1.1").unwrap();
        assert_eq!(
            url.as_str(),
            "http://config.internal:8080/configs/my%20app/default/application?releaseKey=&ip=10.1.1.1"
        );
    }

    #[test]
    fn test_server_path_prefix_kept() {
        let server = ServerAddress::parse("http://gateway:80/config-service/").unwrap();
        let url = discovery_url(&server, &app(), "10.1.1.1").unwrap();
        assert_eq!(url.path(), "/config-service/services/config");
        assert_eq!(query_value(&url, "appId").as_deref(), Some("my app"));
    }

    #[test]
    fn test_notifications_url_encodes_json() {
        let server = ServerAddress::parse("10.0.0.1:8080").unwrap();
        let notifications = vec![Notification::new("application", Notification::INITIAL_ID)];
        let url = notifications_url(&server, &app(), &notifications).unwrap();

        assert_eq!(url.path(), "/notifications/v2");
        let raw_query = url.query().unwrap();
        assert!(!raw_query.contains('"'));
        assert!(!raw_query.contains('{'));

        let decoded: Vec<Notification> =
            serde_json::from_str(&query_value(&url, "notifications").unwrap()).unwrap();
        assert_eq!(decoded, notifications);
        assert_eq!(query_value(&url, "cluster").as_deref(), Some("default"));
    }
}
