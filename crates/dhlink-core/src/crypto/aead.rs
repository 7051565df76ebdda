// ============================================
// File: crates/dhlink-core/src/crypto/aead.rs
// ============================================
//! # Message Encryption
//!
//! ## Creation Reason
//! Provides authenticated encryption for chat messages once both peers
//! hold the same shared secret.
//!
//! ## Main Functionality
//! - `MessageCipher`: Trait for sealing/opening messages
//! - `AesGcmCipher`: Production implementation (AES-128-GCM)
//! - `SealedMessage`: Ciphertext, detached tag and nonce as sent on the wire
//!
//! ## Message Format
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ message : hex(ciphertext)      │ same length as text │
//! │ tag     : hex(16-byte GCM tag) │ authenticates text  │
//! │ nonce   : hex(12 bytes)        │ random per message  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never reuse a (key, nonce) pair; nonces come from the OS RNG
//! - Opening checks the tag before releasing any plaintext
//! - Wrong nonce or tag lengths are reported as `Decryption`, same as a
//!   bad tag, so the caller has a single failure path
//!
//! ## Last Modified
//! v0.1.0 - Initial message cipher

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes128Gcm, Nonce, Tag,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::keys::MessageKey;
use crate::error::{CoreError, Result};

use super::{NONCE_SIZE, TAG_SIZE};

// ============================================
// SealedMessage
// ============================================

/// An encrypted message with its detached tag and nonce.
///
/// Serializes to the three hex fields of a `message` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedMessage {
    /// Ciphertext, same length as the plaintext.
    #[serde(rename = "message", with = "hex::serde")]
    pub ciphertext: Vec<u8>,
    /// GCM authentication tag.
    #[serde(with = "hex::serde")]
    pub tag: Vec<u8>,
    /// Nonce used for this message.
    #[serde(with = "hex::serde")]
    pub nonce: Vec<u8>,
}

impl SealedMessage {
    /// Builds a sealed message from its three hex-encoded fields.
    ///
    /// # Errors
    /// `InvalidParameter` naming the first field that is not valid hex.
    pub fn from_hex(ciphertext: &str, tag: &str, nonce: &str) -> Result<Self> {
        let decode = |field: &str, value: &str| {
            hex::decode(value.trim())
                .map_err(|e| CoreError::invalid_parameter(field, format!("{field} is not hex: {e}")))
        };
        Ok(Self {
            ciphertext: decode("message", ciphertext)?,
            tag: decode("tag", tag)?,
            nonce: decode("nonce", nonce)?,
        })
    }
}

// ============================================
// MessageCipher Trait
// ============================================

/// Trait for message encryption operations.
///
/// Lets the session swap the cipher in tests without touching the
/// exchange logic.
pub trait MessageCipher: Send + Sync {
    /// Encrypts `plaintext` under `key` with a fresh nonce.
    ///
    /// # Errors
    /// - `Encryption`: If the cipher rejects the input
    fn seal(&self, key: &MessageKey, plaintext: &str) -> Result<SealedMessage>;

    /// Authenticates and decrypts `sealed` under `key`.
    ///
    /// # Errors
    /// - `Decryption`: Tag mismatch, nonce/tag of the wrong length, or
    ///   plaintext that isn't UTF-8
    fn open(&self, key: &MessageKey, sealed: &SealedMessage) -> Result<String>;
}

// ============================================
// AesGcmCipher
// ============================================

/// Default implementation using AES-128-GCM with random nonces.
#[derive(Debug, Default, Clone)]
pub struct AesGcmCipher;

impl AesGcmCipher {
    /// Creates a new instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn cipher(key: &MessageKey) -> Result<Aes128Gcm> {
        Aes128Gcm::new_from_slice(key.as_bytes()).map_err(|_| CoreError::Encryption {
            context: "Failed to create cipher".into(),
        })
    }
}

impl MessageCipher for AesGcmCipher {
    fn seal(&self, key: &MessageKey, plaintext: &str) -> Result<SealedMessage> {
        let cipher = Self::cipher(key)?;

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer)
            .map_err(|_| CoreError::Encryption {
                context: "AES-GCM encryption failed".into(),
            })?;

        Ok(SealedMessage {
            ciphertext: buffer,
            tag: tag.to_vec(),
            nonce: nonce.to_vec(),
        })
    }

    fn open(&self, key: &MessageKey, sealed: &SealedMessage) -> Result<String> {
        if sealed.nonce.len() != NONCE_SIZE || sealed.tag.len() != TAG_SIZE {
            debug!(
                nonce_len = sealed.nonce.len(),
                tag_len = sealed.tag.len(),
                "Sealed message has wrong nonce or tag length"
            );
            return Err(CoreError::Decryption);
        }

        let cipher = Self::cipher(key).map_err(|_| CoreError::Decryption)?;
        let mut buffer = sealed.ciphertext.clone();
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&sealed.nonce),
                b"",
                &mut buffer,
                Tag::from_slice(&sealed.tag),
            )
            .map_err(|_| {
                debug!("AES-GCM tag mismatch");
                CoreError::Decryption
            })?;

        String::from_utf8(buffer).map_err(|_| CoreError::Decryption)
    }
}

// ============================================
// Tests
// ============================================
