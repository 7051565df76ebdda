// ============================================
// File: crates/dhlink-transport/src/http.rs
// ============================================
//! # HTTP Peer Link
//!
//! ## Creation Reason
//! Production `PeerLink`: posts each request as JSON to the remote
//! peer's listener and parses the JSON reply.
//!
//! ## Main Functionality
//! - `HttpPeerLink`: reqwest client bound to one remote URL
//! - Per-request timeout from configuration
//! - Error mapping from reqwest to `TransportError`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Non-2xx status codes are treated as invalid replies; the listener
//!   only ever sends 200
//!
//! ## Last Modified
//! v0.1.0 - Initial HTTP link

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, trace};

use dhlink_core::protocol::{PeerRequest, PeerResponse};

use crate::error::{Result, TransportError};
use crate::traits::PeerLink;

/// `PeerLink` that POSTs JSON to `http://{host}:{port}/`.
#[derive(Clone)]
pub struct HttpPeerLink {
    http: Client,
    url: String,
}

impl HttpPeerLink {
    /// Creates a link to the listener at `host:port`.
    ///
    /// # Errors
    /// `InvalidConfig` if the HTTP client cannot be built.
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::invalid_config("http_client", e.to_string()))?;

        Ok(Self {
            http,
            url: format!("http://{host}:{port}/"),
        })
    }

    /// URL requests are posted to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_send_error(&self, err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::timeout(format!("POST {}", self.url))
        } else {
            TransportError::connection_failed(&self.url, err.to_string())
        }
    }
}

#[async_trait]
impl PeerLink for HttpPeerLink {
    async fn deliver(&self, request: &PeerRequest) -> Result<PeerResponse> {
        trace!(url = %self.url, kind = %request.kind(), "Posting request");

        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::invalid_response(format!("HTTP {status}")));
        }

        let reply: PeerResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::timeout(format!("reading reply from {}", self.url))
            } else {
                TransportError::invalid_response(e.to_string())
            }
        })?;

        debug!(
            url = %self.url,
            kind = %request.kind(),
            success = reply.success,
            "Peer replied"
        );
        Ok(reply)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

impl std::fmt::Debug for HttpPeerLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPeerLink")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use dhlink_common::Identity;
    use dhlink_core::protocol::PeerMessage;
    use dhlink_core::BigUint;

    #[test]
    fn test_url_format() {
        let link = HttpPeerLink::new("127.0.0.1", 8001, Duration::from_secs(1)).unwrap();
        assert_eq!(link.url(), "http://127.0.0.1:8001/");
        assert_eq!(link.describe(), "http://127.0.0.1:8001/");
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_error() {
        // Port 9 (discard) on loopback is normally closed
        let link = HttpPeerLink::new("127.0.0.1", 9, Duration::from_millis(500)).unwrap();
        let request = PeerRequest::new(
            Identity::Alice,
            PeerMessage::Public {
                public: BigUint::from(8u32),
            },
        );

        let err = link.deliver(&request).await.unwrap_err();
        assert!(err.is_unreachable());
    }
}
