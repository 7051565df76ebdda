// ============================================
// File: crates/dhlink-core/src/lib.rs
// ============================================
//! # dhlink Core - Protocol & Cryptography Library
//!
//! ## Creation Reason
//! Provides the pieces of the key exchange that do not depend on the
//! network or on the session lifecycle: the modular arithmetic, the
//! message cipher and the JSON wire protocol spoken between the peers.
//!
//! ## Main Functionality
//!
//! ### Crypto Module ([`crypto`])
//! - Group parameters and modular exponentiation (`GroupParams`)
//! - Message key derived from the shared secret (`MessageKey`)
//! - AES-128-GCM sealing with a fresh nonce per message (`SealedMessage`)
//!
//! ### Protocol Module ([`protocol`])
//! - Closed request enum (`PeerMessage`) with its envelope (`PeerRequest`)
//! - Acknowledgement type (`PeerResponse`, `ExchangeStatus`)
//! - Strict inbound decoding with peer-facing error messages
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                dhlink-peer                          │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │    dhlink-core  ◄──    dhlink-transport            │
//! │    You are here               │                    │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │              dhlink-common                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Cipher code uses the audited RustCrypto `aes-gcm` implementation
//! - Message keys zeroize on drop; never log secrets or shared secrets
//! - The 16-byte key encoding truncates shared secrets above 128 bits;
//!   callers pick group parameters accordingly
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;

// Re-export commonly used items
pub use crypto::{GroupParams, MessageKey, SealedMessage};
pub use error::{CoreError, Result};
pub use protocol::{ExchangeStatus, MessageKind, PeerMessage, PeerRequest, PeerResponse};

/// Arbitrary precision integer used for every exchange value.
pub use num_bigint::BigUint;
