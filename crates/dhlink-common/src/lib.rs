// ============================================
// File: crates/dhlink-common/src/lib.rs
// ============================================
//! # dhlink Common - Shared Types Library
//!
//! ## Creation Reason
//! Provides the small set of types every dhlink crate agrees on: who the
//! two peers are and which step of the exchange a peer is in.
//!
//! ## Main Functionality
//! - [`types`]: `Identity` (Alice/Bob) and `ExchangeState`
//! - [`error`]: Common error types and result alias
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                dhlink-peer                          │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │    dhlink-core         dhlink-transport            │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │              dhlink-common  ◄── You are here       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the leaf - keep dependencies minimal
//! - Wire names of `ExchangeState` are part of the peer protocol
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{CommonError, Result};
pub use types::{ExchangeState, Identity};
