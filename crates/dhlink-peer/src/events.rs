// ============================================
// File: crates/dhlink-peer/src/events.rs
// ============================================
//! # Peer Events
//!
//! Notifications from the inbound side to whatever interface drives the
//! peer. Delivered over an unbounded Tokio channel so the handler never
//! waits on the interface.

use tokio::sync::mpsc;

use dhlink_common::ExchangeState;
use dhlink_core::BigUint;

/// A chat message as it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingMessage {
    /// Decrypted and authenticated text.
    Text(String),
    /// The message failed authentication and was discarded.
    Unauthenticated,
}

/// Something the remote peer changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// Remote sent group parameters.
    SharedReceived {
        /// Modulus.
        p: BigUint,
        /// Generator.
        g: BigUint,
    },
    /// Remote public value arrived (by request or in a reply).
    PublicReceived {
        /// The remote public value.
        remote_public: BigUint,
    },
    /// Remote sent a chat message.
    MessageReceived(IncomingMessage),
    /// The local session moved to a new state because of the remote.
    StateChanged(ExchangeState),
}

/// Sending half of the event channel.
pub type EventSender = mpsc::UnboundedSender<PeerEvent>;

/// Receiving half of the event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<PeerEvent>;

/// Creates a new event channel.
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
