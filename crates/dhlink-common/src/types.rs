// ============================================
// File: crates/dhlink-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Centralizes the two pieces of vocabulary both peers must agree on:
//! the fixed pair of identities and the names of the exchange states.
//!
//! ## Main Functionality
//! - `Identity`: Alice or Bob, with the derived remote identity and port
//! - `ExchangeState`: Steps of the key exchange flow with wire names
//!
//! ## Exchange Flow
//! ```text
//! SelectUser ──► PickShared ──► PickSecret ──► AwaitingPublic ──► ShowKeys ──► Messaging
//!                                   │                                 ▲           │  ▲
//!                                   └──── (remote public cached) ─────┘           └──┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Identity names are a display check only, never a security boundary
//! - Wire names are snake_case; `pick_private` is accepted for older peers
//!
//! ## Last Modified
//! v0.1.0 - Initial type definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Identity
// ============================================

/// One of the two well-known peer identities.
///
/// Choosing an identity fixes everything else about the local endpoint:
/// the expected remote name and which of the two ports to listen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identity {
    /// Listens on the base port.
    Alice,
    /// Listens on the base port + 1.
    Bob,
}

impl Identity {
    /// Both identities in port order.
    pub const ALL: [Self; 2] = [Self::Alice, Self::Bob];

    /// Display name used on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Alice => "Alice",
            Self::Bob => "Bob",
        }
    }

    /// The complementary identity.
    #[must_use]
    pub const fn remote(self) -> Self {
        match self {
            Self::Alice => Self::Bob,
            Self::Bob => Self::Alice,
        }
    }

    /// Offset of this identity's listen port from the base port.
    #[must_use]
    pub const fn port_offset(self) -> u16 {
        match self {
            Self::Alice => 0,
            Self::Bob => 1,
        }
    }

    /// Listen port for this identity given the shared base port.
    #[must_use]
    pub const fn listen_port(self, base_port: u16) -> u16 {
        base_port.saturating_add(self.port_offset())
    }

    /// Returns `true` if `name` refers to this identity, ignoring ASCII case.
    #[must_use]
    pub fn matches_name(self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name.trim())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Identity {
    type Err = CommonError;

    /// Parses a full name or an unambiguous prefix, ignoring case
    /// (`"bob"`, `"B"`, `"ali"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted.is_empty() {
            return Err(CommonError::unknown_identity(s));
        }

        let mut candidates = Self::ALL
            .into_iter()
            .filter(|id| id.name().to_ascii_lowercase().starts_with(&wanted));

        match (candidates.next(), candidates.next()) {
            (Some(id), None) => Ok(id),
            _ => Err(CommonError::unknown_identity(s)),
        }
    }
}

// ============================================
// ExchangeState
// ============================================

/// Step of the key exchange a peer is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    /// No identity chosen yet.
    SelectUser,
    /// Waiting for the group parameters `p` and `g`.
    PickShared,
    /// Group parameters known; waiting for the local secret.
    #[serde(alias = "pick_private")]
    PickSecret,
    /// Local public value sent; waiting for the remote one.
    AwaitingPublic,
    /// Shared secret computed.
    ShowKeys,
    /// Exchanging encrypted messages.
    Messaging,
}

impl ExchangeState {
    /// Every state in flow order.
    pub const ALL: [Self; 6] = [
        Self::SelectUser,
        Self::PickShared,
        Self::PickSecret,
        Self::AwaitingPublic,
        Self::ShowKeys,
        Self::Messaging,
    ];

    /// Name used for this state in `set_state` requests.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::SelectUser => "select_user",
            Self::PickShared => "pick_shared",
            Self::PickSecret => "pick_secret",
            Self::AwaitingPublic => "awaiting_public",
            Self::ShowKeys => "show_keys",
            Self::Messaging => "messaging",
        }
    }
}

impl Default for ExchangeState {
    fn default() -> Self {
        Self::SelectUser
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for ExchangeState {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "pick_private" {
            return Ok(Self::PickSecret);
        }
        Self::ALL
            .into_iter()
            .find(|state| state.wire_name() == wanted)
            .ok_or_else(|| CommonError::invalid_state(s))
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_remote_and_ports() {
        assert_eq!(Identity::Alice.remote(), Identity::Bob);
        assert_eq!(Identity::Bob.remote(), Identity::Alice);
        assert_eq!(Identity::Alice.listen_port(8000), 8000);
        assert_eq!(Identity::Bob.listen_port(8000), 8001);
        assert_eq!(Identity::Bob.listen_port(u16::MAX), u16::MAX);
    }

    #[test]
    fn test_identity_parse() {
        assert_eq!("Alice".parse::<Identity>().unwrap(), Identity::Alice);
        assert_eq!("bob".parse::<Identity>().unwrap(), Identity::Bob);
        assert_eq!(" B ".parse::<Identity>().unwrap(), Identity::Bob);
        assert_eq!("ali".parse::<Identity>().unwrap(), Identity::Alice);

        assert!("".parse::<Identity>().is_err());
        assert!("Carol".parse::<Identity>().is_err());
        assert!("alicex".parse::<Identity>().is_err());
    }

    #[test]
    fn test_identity_matches_name() {
        assert!(Identity::Bob.matches_name("BOB"));
        assert!(Identity::Bob.matches_name("bob"));
        assert!(!Identity::Bob.matches_name("Alice"));
        assert!(!Identity::Bob.matches_name("b"));
    }

    #[test]
    fn test_state_wire_names_roundtrip() {
        for state in ExchangeState::ALL {
            assert_eq!(state.wire_name().parse::<ExchangeState>().unwrap(), state);
        }
        assert_eq!(
            "pick_private".parse::<ExchangeState>().unwrap(),
            ExchangeState::PickSecret
        );
    }

    #[test]
    fn test_state_parse_rejects_unknown() {
        let err = "dancing".parse::<ExchangeState>().unwrap_err();
        assert_eq!(err, CommonError::invalid_state("dancing"));
    }

    #[test]
    fn test_state_serde_matches_wire_name() {
        let json = serde_json::to_string(&ExchangeState::AwaitingPublic).unwrap();
        assert_eq!(json, "\"awaiting_public\"");

        let state: ExchangeState = serde_json::from_str("\"pick_private\"").unwrap();
        assert_eq!(state, ExchangeState::PickSecret);
    }
}
