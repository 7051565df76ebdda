// ============================================
// File: crates/dhlink-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the JSON wire protocol spoken between the two peers: what a
//! request carries, what every reply looks like and how inbound bodies
//! are validated.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`messages`]: Request, response and status types
//! - [`codec`]: Validating decoder for inbound request bodies
//! - [`wire_int`]: Arbitrary-size integers as JSON numbers
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Alice :8000                                    Bob :8001   │
//! │                                                             │
//! │  POST / {"type":"shared",...} ──────────────────────►       │
//! │        ◄────────────────────────── {"success":true}         │
//! │  POST / {"type":"public",...} ──────────────────────►       │
//! │        ◄──────── {"success":true,"status":"complete",...}   │
//! │        ◄────────────────── POST / {"type":"message",...}    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every request is answered with HTTP 200; failure is signalled by
//!   `success: false` in the body
//! - There is no protocol version field; both peers must run the same build
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod codec;
pub mod messages;
pub mod wire_int;

// Re-export primary types
pub use codec::decode_request;
pub use messages::{ExchangeStatus, MessageKind, PeerMessage, PeerRequest, PeerResponse};
