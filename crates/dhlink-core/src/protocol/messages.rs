// ============================================
// File: crates/dhlink-core/src/protocol/messages.rs
// ============================================
//! # Protocol Messages
//!
//! ## Creation Reason
//! Defines the request and response bodies exchanged between the two
//! peers over HTTP.
//!
//! ## Main Functionality
//! - `PeerRequest`: Sender name plus one `PeerMessage`
//! - `PeerMessage`: Closed set of request kinds, tagged by `type`
//! - `PeerResponse`: Acknowledgement, optionally carrying a public value
//! - `ExchangeStatus`: Progress hint attached to `public` replies
//!
//! ## Wire Examples
//! ```text
//! {"name":"Alice","type":"shared","p":23,"g":5}
//! {"name":"Alice","type":"public","public":8}
//! {"name":"Bob","type":"message","message":"9f..","tag":"a1..","nonce":"0c.."}
//! {"name":"Alice","type":"set_state","state":"messaging"}
//!
//! {"name":"Bob","success":true,"status":"complete","public":19}
//! {"name":"Bob","success":false,"error":"Missing parameters"}
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Integers are JSON numbers of arbitrary size (see `wire_int`)
//! - Adding a request kind means updating `MessageKind` and the codec
//!
//! ## Last Modified
//! v0.1.0 - Initial message definitions

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use dhlink_common::{ExchangeState, Identity};

use crate::crypto::{GroupParams, SealedMessage};
use crate::error::CoreError;
use crate::protocol::wire_int;

// ============================================
// MessageKind
// ============================================

/// Discriminant of a `PeerMessage`, as carried in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Group parameters.
    Shared,
    /// Public value.
    Public,
    /// Encrypted chat message.
    Message,
    /// Forced state change.
    SetState,
}

impl MessageKind {
    /// Value of the `type` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Public => "public",
            Self::Message => "message",
            Self::SetState => "set_state",
        }
    }

    /// Fields a request of this kind must carry besides `name` and `type`.
    #[must_use]
    pub const fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Shared => &["p", "g"],
            Self::Public => &["public"],
            Self::Message => &["message", "tag", "nonce"],
            Self::SetState => &["state"],
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared" => Ok(Self::Shared),
            "public" => Ok(Self::Public),
            "message" => Ok(Self::Message),
            "set_state" => Ok(Self::SetState),
            other => Err(CoreError::UnknownMessageType(other.to_string())),
        }
    }
}

// ============================================
// PeerMessage
// ============================================

/// Body of a request, one variant per `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerMessage {
    /// Group parameters chosen by the sender.
    Shared {
        /// Modulus.
        #[serde(with = "wire_int")]
        p: BigUint,
        /// Generator.
        #[serde(with = "wire_int")]
        g: BigUint,
    },
    /// Sender's public value.
    Public {
        /// `g^secret mod p` of the sender.
        #[serde(with = "wire_int")]
        public: BigUint,
    },
    /// Encrypted chat message.
    Message(SealedMessage),
    /// Asks the receiver to move to `state`.
    SetState {
        /// Target state.
        state: ExchangeState,
    },
}

impl PeerMessage {
    /// Builds a `Shared` message from validated parameters.
    #[must_use]
    pub fn shared(group: &GroupParams) -> Self {
        Self::Shared {
            p: group.p().clone(),
            g: group.g().clone(),
        }
    }

    /// Discriminant of this message.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Shared { .. } => MessageKind::Shared,
            Self::Public { .. } => MessageKind::Public,
            Self::Message(_) => MessageKind::Message,
            Self::SetState { .. } => MessageKind::SetState,
        }
    }
}

// ============================================
// PeerRequest
// ============================================

/// A request as posted to the remote listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRequest {
    /// Sender's identity name.
    pub name: String,
    /// The request itself, flattened next to `name`.
    #[serde(flatten)]
    pub message: PeerMessage,
}

impl PeerRequest {
    /// Creates a request sent by `sender`.
    #[must_use]
    pub fn new(sender: Identity, message: PeerMessage) -> Self {
        Self {
            name: sender.name().to_string(),
            message,
        }
    }

    /// Discriminant of the carried message.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.message.kind()
    }
}

// ============================================
// ExchangeStatus
// ============================================

/// How far the responder is with its public value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStatus {
    /// Group parameters not known yet.
    Pending,
    /// Parameters known, local secret not chosen yet.
    Awaiting,
    /// Public value attached.
    Complete,
}

// ============================================
// PeerResponse
// ============================================

/// Reply to every request, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerResponse {
    /// Responder's identity name.
    pub name: String,
    /// Whether the request was accepted.
    pub success: bool,
    /// Progress hint, only on replies to `public`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExchangeStatus>,
    /// Responder's public value, when `status` is `complete`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire_int::option"
    )]
    pub public: Option<BigUint>,
    /// Reason for rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PeerResponse {
    /// Plain acknowledgement.
    #[must_use]
    pub fn ok(responder: Identity) -> Self {
        Self {
            name: responder.name().to_string(),
            success: true,
            status: None,
            public: None,
            error: None,
        }
    }

    /// Rejection carrying `error` as the reason.
    #[must_use]
    pub fn failure(responder: Identity, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::ok(responder)
        }
    }

    /// Acknowledgement of a `public` request.
    ///
    /// `public` is only attached when `status` is `Complete`.
    #[must_use]
    pub fn with_status(responder: Identity, status: ExchangeStatus, public: Option<BigUint>) -> Self {
        let public = match status {
            ExchangeStatus::Complete => public,
            ExchangeStatus::Pending | ExchangeStatus::Awaiting => None,
        };
        Self {
            status: Some(status),
            public,
            ..Self::ok(responder)
        }
    }

    /// Public value carried by a `complete` reply, if any.
    #[must_use]
    pub fn completed_public(&self) -> Option<&BigUint> {
        match (self.success, self.status) {
            (true, Some(ExchangeStatus::Complete)) => self.public.as_ref(),
            _ => None,
        }
    }
}

// ============================================
// Tests
// ============================================
