// ============================================
// File: crates/dhlink-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Centralizes the arithmetic of the exchange and the message cipher that
//! runs on top of it.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`dh`]: Group parameters, public values and the shared secret
//! - [`keys`]: Encoding the shared secret into a symmetric key
//! - [`aead`]: AES-128-GCM sealing and opening of chat messages
//!
//! ## Cryptographic Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Exchange Phase                           │
//! │  Alice                                          Bob         │
//! │    │  shared { p, g } ───────────────────────────► │        │
//! │    │  public { A = g^a mod p } ──────────────────► │        │
//! │    │ ◄─────────────────── public { B = g^b mod p } │        │
//! │    │                                               │        │
//! │    │   s = B^a mod p            s = A^b mod p      │        │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Messaging Phase                          │
//! │                                                             │
//! │  s ──► 16 bytes LE ──► AES-128-GCM(random nonce) ──► hex    │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The exchange itself is unauthenticated; anyone who can reach the
//!   listener can play the remote peer
//! - A fresh random nonce is drawn for every message
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod aead;
pub mod dh;
pub mod keys;

// Re-export primary types at module level
pub use aead::{AesGcmCipher, MessageCipher, SealedMessage};
pub use dh::GroupParams;
pub use keys::MessageKey;

// ============================================
// Constants
// ============================================

/// Size of the message key in bytes (AES-128).
pub const MESSAGE_KEY_SIZE: usize = 16;

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the detached AES-GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;
