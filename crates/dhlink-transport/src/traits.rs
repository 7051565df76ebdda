// ============================================
// File: crates/dhlink-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! Defines the two seams between the exchange logic and the network, so
//! the peer can be driven over HTTP in production and in-process in tests.
//!
//! ## Main Functionality
//! - `PeerLink`: Outbound request/response to the remote peer
//! - `RequestHandler`: Turns an inbound body into a reply
//!
//! ## ⚠️ Important Note for Next Developer
//! - `RequestHandler::handle` is synchronous and must not block; it runs
//!   on the listener's async tasks
//! - Implementations must be Send + Sync for use in async contexts
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use async_trait::async_trait;

use dhlink_core::protocol::{PeerRequest, PeerResponse};

use crate::error::Result;

// ============================================
// PeerLink Trait
// ============================================

/// Outbound connection to the remote peer.
///
/// # Example
/// ```ignore
/// async fn announce<L: PeerLink>(link: &L, request: PeerRequest) -> bool {
///     match link.deliver(&request).await {
///         Ok(reply) => reply.success,
///         Err(_) => false,
///     }
/// }
/// ```
#[async_trait]
pub trait PeerLink: Send + Sync {
    /// Sends `request` and waits for the peer's reply.
    ///
    /// A reply with `success: false` is still `Ok`; only failing to get a
    /// well-formed reply at all is an error.
    ///
    /// # Errors
    /// - `ConnectionFailed`/`Timeout`: peer unreachable
    /// - `InvalidResponse`: reply was not a `PeerResponse`
    async fn deliver(&self, request: &PeerRequest) -> Result<PeerResponse>;

    /// Human-readable description of the remote end, for logs.
    fn describe(&self) -> String;
}

// ============================================
// RequestHandler Trait
// ============================================

/// Handles inbound request bodies for the listener.
pub trait RequestHandler: Send + Sync + 'static {
    /// Processes one raw request body and returns the reply to send.
    ///
    /// Never fails: every rejection is expressed as a `PeerResponse`
    /// with `success: false`.
    fn handle(&self, body: &[u8]) -> PeerResponse;

    /// Reply for a request whose body could not be read, e.g. because it
    /// exceeds the listener's body limit.
    fn reject(&self, reason: &str) -> PeerResponse;
}
