// ============================================
// File: crates/dhlink-transport/src/listener.rs
// ============================================
//! # Peer Listener
//!
//! ## Creation Reason
//! Accepts requests from the remote peer. Every POST, whatever its path,
//! is passed to a `RequestHandler` and its `PeerResponse` is returned as
//! JSON with status 200. Bodies over the limit get a JSON failure too.
//!
//! ## Lifecycle
//! ```text
//!   new() ──► start() ──► [serving on background task] ──► stop()
//!               │  ▲                                          │
//!               └──┘ second start is a no-op                  │
//!                                                             ▼
//!                          shutdown signal, join (bounded) ──► idle
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `stop()` waits at most `STOP_TIMEOUT` for in-flight requests, then
//!   aborts the server task
//! - Binding port 0 picks a free port; `start()` returns the real address
//! - Body limit rejections go through `RequestHandler::reject`, never a 413
//!
//! ## Last Modified
//! v0.1.0 - Initial listener

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use dhlink_core::protocol::PeerResponse;

use crate::error::{Result, TransportError};
use crate::traits::RequestHandler;

// ============================================
// Constants
// ============================================

/// How long `stop()` waits for the server task to finish.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Largest request body read by default.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

// ============================================
// PeerListener
// ============================================

struct Running {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// HTTP listener feeding inbound requests to a handler.
pub struct PeerListener {
    bind_addr: SocketAddr,
    handler: Arc<dyn RequestHandler>,
    body_limit: usize,
    running: Mutex<Option<Running>>,
}

impl PeerListener {
    /// Creates a stopped listener for `bind_addr`.
    pub fn new(bind_addr: SocketAddr, handler: Arc<dyn RequestHandler>) -> Self {
        Self {
            bind_addr,
            handler,
            body_limit: DEFAULT_BODY_LIMIT,
            running: Mutex::new(None),
        }
    }

    /// Sets the largest request body the listener reads.
    #[must_use]
    pub const fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Binds and starts serving in the background.
    ///
    /// Calling `start` on a running listener logs and returns the address
    /// already in use.
    ///
    /// # Errors
    /// `BindFailed` if the address cannot be bound.
    pub async fn start(&self) -> Result<SocketAddr> {
        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            debug!(addr = %current.local_addr, "Listener already running");
            return Ok(current.local_addr);
        }

        let listener = TcpListener::bind(self.bind_addr)
            .await
            .map_err(|e| TransportError::bind_failed(self.bind_addr, e.to_string()))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::io("reading listener address", e))?;

        let app = Router::new()
            .route("/", post(handle_request))
            .route("/*path", post(handle_request))
            .layer(DefaultBodyLimit::max(self.body_limit))
            .with_state(Arc::clone(&self.handler));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                error!(addr = %local_addr, "Listener failed: {}", e);
            }
        });

        info!(addr = %local_addr, "Listener started");
        *running = Some(Running {
            local_addr,
            shutdown_tx,
            task,
        });
        Ok(local_addr)
    }

    /// Stops serving and waits briefly for the server task.
    ///
    /// Stopping a listener that isn't running is a no-op.
    pub async fn stop(&self) {
        let Some(current) = self.running.lock().await.take() else {
            debug!("Listener not running, nothing to stop");
            return;
        };

        let _ = current.shutdown_tx.send(());
        let mut task = current.task;
        match tokio::time::timeout(STOP_TIMEOUT, &mut task).await {
            Ok(_) => info!(addr = %current.local_addr, "Listener stopped"),
            Err(_) => {
                warn!(addr = %current.local_addr, "Listener did not stop in time, aborting");
                task.abort();
            }
        }
    }

    /// Address the listener is serving on, if running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.local_addr)
    }

    /// Returns `true` while the listener is serving.
    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}

impl std::fmt::Debug for PeerListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerListener")
            .field("bind_addr", &self.bind_addr)
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

async fn handle_request(
    State(handler): State<Arc<dyn RequestHandler>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Json<PeerResponse> {
    match body {
        Ok(body) => Json(handler.handle(&body)),
        Err(rejection) => {
            debug!("Request body rejected: {}", rejection.body_text());
            Json(handler.reject(&format!(
                "Request body rejected: {}",
                rejection.body_text()
            )))
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpPeerLink;
    use crate::traits::PeerLink;
    use dhlink_common::Identity;
    use dhlink_core::protocol::{decode_request, PeerMessage, PeerRequest};
    use dhlink_core::BigUint;
    use parking_lot::Mutex as SyncMutex;

    /// Accepts `public` from Alice and echoes the value back.
    #[derive(Default)]
    struct EchoHandler {
        seen: SyncMutex<Vec<PeerRequest>>,
    }

    impl RequestHandler for EchoHandler {
        fn handle(&self, body: &[u8]) -> PeerResponse {
            match decode_request(body, Identity::Bob) {
                Ok(request) => {
                    let reply = match &request.message {
                        PeerMessage::Public { public } => PeerResponse::with_status(
                            Identity::Bob,
                            dhlink_core::ExchangeStatus::Complete,
                            Some(public.clone()),
                        ),
                        _ => PeerResponse::ok(Identity::Bob),
                    };
                    self.seen.lock().push(request);
                    reply
                }
                Err(e) => PeerResponse::failure(Identity::Bob, e.to_string()),
            }
        }

        fn reject(&self, reason: &str) -> PeerResponse {
            PeerResponse::failure(Identity::Bob, reason)
        }
    }

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn test_serves_requests() {
        let handler = Arc::new(EchoHandler::default());
        let listener = PeerListener::new(loopback(), handler.clone());
        let addr = listener.start().await.unwrap();

        let link = HttpPeerLink::new("127.0.0.1", addr.port(), Duration::from_secs(2)).unwrap();
        let public = (BigUint::from(1u32) << 200u32) + BigUint::from(7u32);
        let reply = link
            .deliver(&PeerRequest::new(
                Identity::Alice,
                PeerMessage::Public {
                    public: public.clone(),
                },
            ))
            .await
            .unwrap();

        assert!(reply.success);
        assert_eq!(reply.completed_public(), Some(&public));
        assert_eq!(handler.seen.lock().len(), 1);

        listener.stop().await;
    }

    #[tokio::test]
    async fn test_rejection_is_still_http_ok() {
        let listener = PeerListener::new(loopback(), Arc::new(EchoHandler::default()));
        let addr = listener.start().await.unwrap();

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{addr}/"))
            .body("{\"type\":\"public\"}")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let reply: PeerResponse = response.json().await.unwrap();
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("Missing parameters"));

        listener.stop().await;
    }

    #[tokio::test]
    async fn test_any_path_is_served() {
        let handler = Arc::new(EchoHandler::default());
        let listener = PeerListener::new(loopback(), handler.clone());
        let addr = listener.start().await.unwrap();

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/dh/exchange"))
            .body(r#"{"name":"Alice","type":"public","public":8}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );

        let reply: PeerResponse = response.json().await.unwrap();
        assert!(reply.success);
        assert_eq!(handler.seen.lock().len(), 1);

        listener.stop().await;
    }

    #[tokio::test]
    async fn test_oversized_body_is_json_failure() {
        let handler = Arc::new(EchoHandler::default());
        let listener = PeerListener::new(loopback(), handler.clone()).with_body_limit(1024);
        let addr = listener.start().await.unwrap();

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/"))
            .body(vec![b' '; 4096])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let reply: PeerResponse = response.json().await.unwrap();
        assert!(!reply.success);
        assert_eq!(reply.name, "Bob");
        assert!(reply
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Request body rejected")));
        assert!(handler.seen.lock().is_empty());

        listener.stop().await;
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let listener = PeerListener::new(loopback(), Arc::new(EchoHandler::default()));

        listener.stop().await;
        assert!(!listener.is_running().await);

        let first = listener.start().await.unwrap();
        let second = listener.start().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(listener.local_addr().await, Some(first));

        listener.stop().await;
        listener.stop().await;
        assert!(!listener.is_running().await);
    }

    #[tokio::test]
    async fn test_bind_conflict() {
        let first = PeerListener::new(loopback(), Arc::new(EchoHandler::default()));
        let addr = first.start().await.unwrap();

        let second = PeerListener::new(addr, Arc::new(EchoHandler::default()));
        let err = second.start().await.unwrap_err();
        assert!(matches!(err, TransportError::BindFailed { .. }));

        first.stop().await;
    }
}
