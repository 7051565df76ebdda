// ============================================
// File: crates/dhlink-transport/src/mock.rs
// ============================================
//! # Test Links
//!
//! ## Creation Reason
//! Lets the exchange be tested without sockets.
//!
//! ## Main Functionality
//! - `MockPeerLink`: Records every request; replies from a script or
//!   fails on demand
//! - `LoopbackLink`: Serializes the request to JSON and hands it straight
//!   to a `RequestHandler`, the way the HTTP listener would
//!
//! ## Usage in Tests
//! ```
//! use std::sync::Arc;
//! use dhlink_common::Identity;
//! use dhlink_core::protocol::{PeerMessage, PeerRequest, PeerResponse};
//! use dhlink_core::BigUint;
//! use dhlink_transport::mock::MockPeerLink;
//! use dhlink_transport::PeerLink;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let link = MockPeerLink::new(Identity::Bob);
//! link.push_reply(PeerResponse::ok(Identity::Bob));
//!
//! let request = PeerRequest::new(Identity::Alice, PeerMessage::Public { public: BigUint::from(8u32) });
//! assert!(link.deliver(&request).await.unwrap().success);
//! assert_eq!(link.sent().len(), 1);
//! # }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This is for testing only - do not use in production
//!
//! ## Last Modified
//! v0.1.0 - Initial mock implementation

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use dhlink_common::Identity;
use dhlink_core::protocol::{PeerRequest, PeerResponse};

use crate::error::{Result, TransportError};
use crate::traits::{PeerLink, RequestHandler};

// ============================================
// MockPeerLink
// ============================================

/// Recording `PeerLink` with scripted replies.
///
/// With no scripted reply queued, every request is acknowledged with a
/// plain `success: true` from `remote`.
pub struct MockPeerLink {
    remote: Identity,
    sent: Mutex<Vec<PeerRequest>>,
    replies: Mutex<VecDeque<PeerResponse>>,
    unreachable: AtomicBool,
}

impl MockPeerLink {
    /// Creates a link that pretends to talk to `remote`.
    #[must_use]
    pub fn new(remote: Identity) -> Self {
        Self {
            remote,
            sent: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Queues the reply for the next request.
    pub fn push_reply(&self, reply: PeerResponse) {
        self.replies.lock().push_back(reply);
    }

    /// Makes every following delivery fail as if the peer were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Requests delivered so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<PeerRequest> {
        self.sent.lock().clone()
    }

    /// Clears recorded requests.
    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl PeerLink for MockPeerLink {
    async fn deliver(&self, request: &PeerRequest) -> Result<PeerResponse> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(TransportError::connection_failed(
                self.describe(),
                "peer marked unreachable",
            ));
        }

        self.sent.lock().push(request.clone());
        Ok(self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| PeerResponse::ok(self.remote)))
    }

    fn describe(&self) -> String {
        format!("mock://{}", self.remote)
    }
}

// ============================================
// LoopbackLink
// ============================================

/// In-process `PeerLink` that feeds a `RequestHandler` directly.
///
/// Requests and replies both go through JSON so the wire format is
/// exercised. Until [`connect`](Self::connect) is called, or after
/// [`disconnect`](Self::disconnect), deliveries fail as unreachable.
pub struct LoopbackLink {
    remote: Identity,
    handler: RwLock<Option<Arc<dyn RequestHandler>>>,
}

impl LoopbackLink {
    /// Creates an unconnected link to `remote`.
    #[must_use]
    pub fn new(remote: Identity) -> Self {
        Self {
            remote,
            handler: RwLock::new(None),
        }
    }

    /// Routes following deliveries to `handler`.
    pub fn connect(&self, handler: Arc<dyn RequestHandler>) {
        *self.handler.write() = Some(handler);
    }

    /// Simulates the remote going away.
    pub fn disconnect(&self) {
        *self.handler.write() = None;
    }
}

#[async_trait]
impl PeerLink for LoopbackLink {
    async fn deliver(&self, request: &PeerRequest) -> Result<PeerResponse> {
        let handler = self
            .handler
            .read()
            .clone()
            .ok_or_else(|| TransportError::connection_failed(self.describe(), "not connected"))?;

        let body = serde_json::to_vec(request)
            .map_err(|e| TransportError::invalid_config("request", e.to_string()))?;
        let reply = handler.handle(&body);

        let reply_body = serde_json::to_vec(&reply)
            .map_err(|e| TransportError::invalid_response(e.to_string()))?;
        serde_json::from_slice(&reply_body).map_err(|e| TransportError::invalid_response(e.to_string()))
    }

    fn describe(&self) -> String {
        format!("loopback://{}", self.remote)
    }
}

// ============================================
// Tests
// ============================================
