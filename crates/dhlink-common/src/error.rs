// ============================================
// File: crates/dhlink-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Provides the error type for parsing the shared vocabulary (identities
//! and state names) that every other crate wraps.
//!
//! ## Main Functionality
//! - `CommonError`: Base error enum for common operations
//! - `Result<T>`: Type alias using `CommonError`
//!
//! ## ⚠️ Important Note for Next Developer
//! - The `Display` text of `InvalidState` is sent back to peers verbatim
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Common result type for operations that may fail.
pub type Result<T> = std::result::Result<T, CommonError>;

// ============================================
// CommonError
// ============================================

/// Common error types shared across dhlink crates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Name is not one of the two well-known identities.
    #[error("Unknown identity '{name}', expected Alice or Bob")]
    UnknownIdentity {
        /// The name that failed to parse
        name: String,
    },

    /// State name is not part of the exchange flow.
    #[error("Invalid state: {name}")]
    InvalidState {
        /// The state name that failed to parse
        name: String,
    },
}

impl CommonError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates an `UnknownIdentity` error.
    pub fn unknown_identity(name: impl Into<String>) -> Self {
        Self::UnknownIdentity { name: name.into() }
    }

    /// Creates an `InvalidState` error.
    pub fn invalid_state(name: impl Into<String>) -> Self {
        Self::InvalidState { name: name.into() }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CommonError::unknown_identity("Carol");
        assert!(err.to_string().contains("Carol"));

        let err = CommonError::invalid_state("dancing");
        assert_eq!(err.to_string(), "Invalid state: dancing");
    }
}
