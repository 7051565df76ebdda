// ============================================
// File: crates/dhlink-transport/src/lib.rs
// ============================================
//! # dhlink Transport - Peer Link Layer
//!
//! ## Creation Reason
//! Carries protocol requests between the two peers: an outbound link that
//! posts a request and waits for the reply, and an inbound listener that
//! hands every body to a handler and returns its reply.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: `PeerLink` and `RequestHandler` seams
//! - [`http`]: `PeerLink` over HTTP POST (reqwest)
//! - [`listener`]: HTTP listener (axum) with start/stop lifecycle
//! - [`mock`]: Recording and in-process links for tests
//! - [`error`]: Transport-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                dhlink-peer                          │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │    dhlink-core         dhlink-transport            │
//! │                        You are here ◄──            │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │              dhlink-common                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//! ```text
//!  local peer                                   remote peer
//!  ──────────                                   ───────────
//!  HttpPeerLink ── POST http://host:port/ ──►  PeerListener
//!       ▲                                            │
//!       │                                     RequestHandler
//!       └──────────── 200 + PeerResponse ◄──────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The listener answers every request with HTTP 200; rejection lives
//!   in the JSON body
//! - A failed delivery is an error value, never a panic
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod http;
pub mod listener;
pub mod mock;
pub mod traits;

// Re-export commonly used items
pub use error::{Result, TransportError};
pub use http::HttpPeerLink;
pub use listener::PeerListener;
pub use traits::{PeerLink, RequestHandler};
