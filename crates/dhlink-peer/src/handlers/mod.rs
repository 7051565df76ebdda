// ============================================
// File: crates/dhlink-peer/src/handlers/mod.rs
// ============================================
//! # Request Handlers
//!
//! ## Creation Reason
//! Processing for requests posted by the remote peer.
//!
//! ### Submodules
//! - [`inbound`]: Validation and dispatch of `shared`, `public`, `message`
//!   and `set_state`
//!
//! ## Data Flow
//! ```text
//! Remote → Listener:
//!   1. POST / with JSON body
//!   2. InboundHandler::handle(body)
//!   3. Session updated under lock
//!   4. PeerEvents sent to the UI
//!   5. JSON reply, always HTTP 200
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial handlers structure

pub mod inbound;

pub use inbound::InboundHandler;
