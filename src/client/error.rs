//! Errors raised by a single remote call.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during one request to the configuration service.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection or protocol failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The call did not complete within its deadline.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// Any status other than 200 and 304.
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// The body could not be decoded.
    #[error("malformed payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A request parameter could not be encoded.
    #[error("failed to encode request parameter: {0}")]
    Encode(#[source] serde_json::Error),

    /// A server address that cannot serve as a request base.
    #[error("invalid server address: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Client(_) => "client",
            FetchError::Transport { .. } => "transport",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Status { .. } => "status",
            FetchError::Decode { .. } => "decode",
            FetchError::Encode(_) => "encode",
            FetchError::InvalidUrl(_) => "invalid_url",
        }
    }
}
