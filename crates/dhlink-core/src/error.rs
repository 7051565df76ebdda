// ============================================
// File: crates/dhlink-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types for the cryptographic and protocol operations in
//! the dhlink core crate.
//!
//! ## Error Categories
//! 1. **Crypto Errors**: Invalid group, sealing and opening failures
//! 2. **Protocol Errors**: Malformed, incomplete or unexpected peer requests
//!
//! ## ⚠️ Important Note for Next Developer
//! - Protocol error `Display` strings are returned to the peer as the
//!   `error` field; keep them stable
//! - NEVER include key material or secrets in error messages
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use dhlink_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for protocol and cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    // ========================================
    // Cryptographic Errors
    // ========================================

    /// Group parameters cannot be used for exponentiation.
    #[error("Invalid group parameters: {reason}")]
    InvalidGroup {
        /// Why the parameters were rejected
        reason: String,
    },

    /// Encryption operation failed.
    #[error("Encryption failed: {context}")]
    Encryption {
        /// What was being encrypted
        context: String,
    },

    /// Message could not be authenticated.
    ///
    /// Covers tag mismatch as well as malformed nonce or tag lengths; a
    /// message that fails here is never partially released.
    #[error("Decryption failed: message could not be authenticated")]
    Decryption,

    // ========================================
    // Protocol Errors
    // ========================================

    /// Request body is not a JSON object.
    #[error("Malformed request: {reason}")]
    MalformedMessage {
        /// What's wrong with the body
        reason: String,
    },

    /// A required request field is absent.
    #[error("Missing parameters")]
    MissingParameters,

    /// Sender name does not match the expected remote identity.
    #[error("Wrong name, expected {expected}")]
    WrongSender {
        /// Name the receiver expected
        expected: String,
    },

    /// The `type` field names no known request.
    #[error("Invalid request type, expected 'shared', 'public', 'message' or 'set_state'")]
    UnknownMessageType(String),

    /// A field is present but its value is unusable.
    #[error("Invalid parameters: {reason}")]
    InvalidParameter {
        /// Field name
        field: String,
        /// What's wrong with the value, naming the field
        reason: String,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates an `InvalidGroup` error.
    pub fn invalid_group(reason: impl Into<String>) -> Self {
        Self::InvalidGroup {
            reason: reason.into(),
        }
    }

    /// Creates a `MalformedMessage` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidParameter` error.
    pub fn invalid_parameter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `WrongSender` error.
    pub fn wrong_sender(expected: impl Into<String>) -> Self {
        Self::WrongSender {
            expected: expected.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if this is a cryptographic error.
    #[must_use]
    pub const fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidGroup { .. } | Self::Encryption { .. } | Self::Decryption
        )
    }

    /// Returns `true` if this error describes a bad peer request.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedMessage { .. }
                | Self::MissingParameters
                | Self::WrongSender { .. }
                | Self::UnknownMessageType(_)
                | Self::InvalidParameter { .. }
                | Self::Common(CommonError::InvalidState { .. })
        )
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_facing_messages() {
        assert_eq!(CoreError::MissingParameters.to_string(), "Missing parameters");
        assert_eq!(
            CoreError::wrong_sender("Bob").to_string(),
            "Wrong name, expected Bob"
        );
        assert!(CoreError::UnknownMessageType("ping".into())
            .to_string()
            .starts_with("Invalid request type"));
    }

    #[test]
    fn test_error_classification() {
        assert!(CoreError::Decryption.is_crypto_error());
        assert!(!CoreError::Decryption.is_protocol_error());

        assert!(CoreError::MissingParameters.is_protocol_error());
        assert!(CoreError::invalid_parameter("p", "p must be > 1").is_protocol_error());

        let state: CoreError = CommonError::invalid_state("dancing").into();
        assert!(state.is_protocol_error());
        assert_eq!(state.to_string(), "Invalid state: dancing");
    }
}
