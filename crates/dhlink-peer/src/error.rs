// ============================================
// File: crates/dhlink-peer/src/error.rs
// ============================================
//! # Peer Error Types
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use dhlink_common::error::CommonError;
use dhlink_core::error::CoreError;
use dhlink_transport::error::TransportError;

use crate::services::SessionError;

/// Result type for peer operations.
pub type Result<T> = std::result::Result<T, PeerError>;

/// Peer error types.
#[derive(Error, Debug)]
pub enum PeerError {
    /// Configuration file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        /// Path that was loaded
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Configuration value out of range.
    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// Dotted field name
        field: String,
        /// What's wrong with it
        reason: String,
    },

    /// Operation rejected by the session state machine.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Error from core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error from transport crate.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PeerError {
    /// Creates a `ConfigLoad` error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigInvalid` error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for configuration problems.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }

    /// Returns `true` if the user called an operation at the wrong time.
    #[must_use]
    pub const fn is_session_error(&self) -> bool {
        matches!(self, Self::Session(_))
    }
}
