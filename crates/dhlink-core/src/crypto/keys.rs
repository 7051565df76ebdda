// ============================================
// File: crates/dhlink-core/src/crypto/keys.rs
// ============================================
//! # Message Key
//!
//! ## Creation Reason
//! Turns the integer shared secret into the fixed-size symmetric key used
//! by the message cipher.
//!
//! ## Key Encoding
//! ```text
//! shared secret (BigUint) ──► little-endian bytes ──► first 16 bytes
//!                                                     (zero padded)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Secrets wider than 128 bits are truncated to their low 16 bytes;
//!   both peers must use the same encoding or messages won't open
//! - The key zeroizes on drop and never prints its bytes
//!
//! ## Last Modified
//! v0.1.0 - Initial key definition

use std::fmt;

use num_bigint::BigUint;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::MESSAGE_KEY_SIZE;

// ============================================
// MessageKey
// ============================================

/// Symmetric key for message encryption, derived from the shared secret.
///
/// # Example
/// ```
/// use dhlink_core::crypto::MessageKey;
/// use num_bigint::BigUint;
///
/// let key = MessageKey::derive(&BigUint::from(0x0102u32));
/// assert_eq!(&key.as_bytes()[..3], &[0x02, 0x01, 0x00]);
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MessageKey([u8; MESSAGE_KEY_SIZE]);

impl MessageKey {
    /// Encodes `shared_secret` as 16 little-endian bytes.
    #[must_use]
    pub fn derive(shared_secret: &BigUint) -> Self {
        let mut le = shared_secret.to_bytes_le();
        let mut key = [0u8; MESSAGE_KEY_SIZE];
        let len = le.len().min(MESSAGE_KEY_SIZE);
        key[..len].copy_from_slice(&le[..len]);
        le.zeroize();
        Self(key)
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; MESSAGE_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MessageKey([REDACTED])")
    }
}

impl PartialEq for MessageKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MessageKey {}

// ============================================
// Tests
// ============================================
