// ============================================
// File: crates/dhlink-peer/src/lib.rs
// ============================================
//! # dhlink Peer
//!
//! ## Creation Reason
//! Ties the exchange together: the per-peer session state machine, the
//! handler for requests arriving from the other peer, and the `Peer`
//! orchestrator a user interface drives.
//!
//! ## Main Functionality
//! - [`Peer`]: Owns the session, the link to the remote and the listener
//! - [`services::ExchangeSession`]: State machine of one participant
//! - [`handlers::InboundHandler`]: Dispatches inbound requests
//! - [`events::PeerEvent`]: Notifications for the interface
//! - [`config::PeerConfig`]: TOML configuration
//! - [`console`]: Line-oriented driver used by the binary
//!
//! ## Peer Architecture
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                          Peer                            │
//! │                                                          │
//! │  UI calls ──► select_user / submit_* / send_message      │
//! │                    │                                     │
//! │                    ▼                                     │
//! │        Arc<Mutex<ExchangeSession>> ◄──── InboundHandler  │
//! │                    │                          ▲   │      │
//! │                    ▼                          │   ▼      │
//! │               PeerLink (out)        PeerListener  events │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The session lock is never held across an `.await`
//! - The interface learns about inbound changes only through events
//!
//! ## Last Modified
//! v0.1.0 - Initial peer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod console;
pub mod error;
pub mod events;
pub mod handlers;
pub mod peer;
pub mod services;

// Re-exports
pub use config::PeerConfig;
pub use error::{PeerError, Result};
pub use events::{IncomingMessage, PeerEvent};
pub use peer::Peer;
pub use services::{ExchangeSession, SessionError, SessionSnapshot};
