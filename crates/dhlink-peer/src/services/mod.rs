// ============================================
// File: crates/dhlink-peer/src/services/mod.rs
// ============================================
//! # Peer Services
//!
//! - [`session`]: The exchange state machine of one participant

pub mod session;

pub use session::{ExchangeSession, SecretOutcome, SessionError, SessionSnapshot, Transition};
