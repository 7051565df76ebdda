// ============================================
// File: crates/dhlink-peer/src/services/session.rs
// ============================================
//! # Exchange Session
//!
//! ## Creation Reason
//! Holds everything one participant knows about the exchange and enforces
//! the order in which it may learn it.
//!
//! ## Main Functionality
//! - `ExchangeSession`: Local state machine, mutated by local calls and by
//!   inbound requests
//! - `SessionSnapshot`: Copy of the session for rendering
//! - `SessionError`: Calls made out of order
//! - Rollback helpers for deliveries that didn't reach the peer
//!
//! ## State Machine
//! ```text
//!  local call            inbound request
//!  ──────────            ───────────────
//!  select_user           ─
//!   SelectUser ─► PickShared
//!  set_shared            apply_shared
//!   PickShared ─► PickSecret ◄────── (only from PickShared)
//!  set_secret
//!   PickSecret ─► AwaitingPublic     (remote public not cached)
//!   PickSecret ─► ShowKeys           (remote public cached)
//!                        apply_remote_public
//!   AwaitingPublic ─► ShowKeys
//!  start_messaging
//!   ShowKeys ─► Messaging
//!                        force_state
//!   any ─► any
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Values are `Option`s: unset values can't reach the arithmetic
//! - A remote public that arrives before the local secret is cached and
//!   merged by `set_secret`
//! - The session is plain data; locking is the owner's job
//!
//! ## Last Modified
//! v0.1.0 - Initial exchange session

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use dhlink_common::error::CommonError;
use dhlink_common::{ExchangeState, Identity};
use dhlink_core::crypto::{GroupParams, MessageCipher, MessageKey, SealedMessage};
use dhlink_core::error::CoreError;
use dhlink_core::protocol::ExchangeStatus;
use dhlink_core::BigUint;

use crate::events::IncomingMessage;

// ============================================
// SessionError
// ============================================

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// A local call that the session can't honor right now.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The current state doesn't own this operation.
    #[error("Cannot {operation} while in state {state}")]
    WrongState {
        /// What was attempted
        operation: &'static str,
        /// State the session is in
        state: ExchangeState,
    },

    /// A value the operation needs hasn't been set.
    #[error("Cannot {operation}: {missing} not set")]
    MissingPrerequisite {
        /// What was attempted
        operation: &'static str,
        /// Which value is missing
        missing: &'static str,
    },

    /// No identity has been chosen yet.
    #[error("No identity selected")]
    NoIdentity,

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Error from core crate.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SessionError {
    /// Creates a `WrongState` error.
    #[must_use]
    pub const fn wrong_state(operation: &'static str, state: ExchangeState) -> Self {
        Self::WrongState { operation, state }
    }

    /// Creates a `MissingPrerequisite` error.
    #[must_use]
    pub const fn missing(operation: &'static str, missing: &'static str) -> Self {
        Self::MissingPrerequisite { operation, missing }
    }
}

// ============================================
// Outcomes
// ============================================

/// State before and after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before.
    pub from: ExchangeState,
    /// State after.
    pub to: ExchangeState,
}

impl Transition {
    /// Returns `true` if the state moved.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Result of choosing the local secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretOutcome {
    /// Local public value to send to the remote.
    pub public: BigUint,
    /// State the session moved to.
    pub state: ExchangeState,
}

// ============================================
// SessionSnapshot
// ============================================

/// Point-in-time copy of a session, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Local identity, if chosen.
    pub identity: Option<Identity>,
    /// Local display name, empty before an identity is chosen.
    pub local_name: &'static str,
    /// Remote display name, empty before an identity is chosen.
    pub remote_name: &'static str,
    /// Modulus.
    pub p: Option<BigUint>,
    /// Generator.
    pub g: Option<BigUint>,
    /// Local secret exponent.
    pub secret: Option<BigUint>,
    /// Local public value.
    pub public: Option<BigUint>,
    /// Remote public value.
    pub remote_public: Option<BigUint>,
    /// Shared secret.
    pub shared_secret: Option<BigUint>,
    /// Current state.
    pub state: ExchangeState,
}

// ============================================
// ExchangeSession
// ============================================

/// One participant's view of the exchange.
#[derive(Clone, Default)]
pub struct ExchangeSession {
    identity: Option<Identity>,
    group: Option<GroupParams>,
    secret: Option<BigUint>,
    public: Option<BigUint>,
    remote_public: Option<BigUint>,
    shared_secret: Option<BigUint>,
    state: ExchangeState,
}

impl ExchangeSession {
    /// Creates a fresh session in `SelectUser`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================
    // Accessors
    // ========================================

    /// Local identity, if chosen.
    #[must_use]
    pub const fn identity(&self) -> Option<Identity> {
        self.identity
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ExchangeState {
        self.state
    }

    /// Agreed group parameters.
    #[must_use]
    pub const fn group(&self) -> Option<&GroupParams> {
        self.group.as_ref()
    }

    /// Local public value.
    #[must_use]
    pub const fn public(&self) -> Option<&BigUint> {
        self.public.as_ref()
    }

    /// Remote public value.
    #[must_use]
    pub const fn remote_public(&self) -> Option<&BigUint> {
        self.remote_public.as_ref()
    }

    /// Shared secret.
    #[must_use]
    pub const fn shared_secret(&self) -> Option<&BigUint> {
        self.shared_secret.as_ref()
    }

    /// Local display name, empty before an identity is chosen.
    #[must_use]
    pub fn local_name(&self) -> &'static str {
        self.identity.map_or("", Identity::name)
    }

    /// Remote display name, empty before an identity is chosen.
    #[must_use]
    pub fn remote_name(&self) -> &'static str {
        self.identity.map_or("", |id| id.remote().name())
    }

    /// Message key derived from the shared secret.
    #[must_use]
    pub fn message_key(&self) -> Option<MessageKey> {
        self.shared_secret.as_ref().map(MessageKey::derive)
    }

    // ========================================
    // Local Operations
    // ========================================

    /// Chooses the local identity.
    ///
    /// # Errors
    /// `WrongState` outside `SelectUser` or if an identity is already set.
    pub fn select_user(&mut self, identity: Identity) -> Result<Transition> {
        if self.state != ExchangeState::SelectUser || self.identity.is_some() {
            return Err(SessionError::wrong_state("select a user", self.state));
        }
        self.identity = Some(identity);
        info!(identity = %identity, "Identity selected");
        Ok(self.move_to(ExchangeState::PickShared))
    }

    /// Sets group parameters chosen locally.
    ///
    /// # Errors
    /// `WrongState` outside `PickShared`.
    pub fn set_shared(&mut self, group: GroupParams) -> Result<Transition> {
        if self.state != ExchangeState::PickShared {
            return Err(SessionError::wrong_state("submit shared parameters", self.state));
        }
        self.group = Some(group);
        Ok(self.move_to(ExchangeState::PickSecret))
    }

    /// Sets the local secret and computes the public value.
    ///
    /// If the remote public value is already cached the shared secret is
    /// computed too and the session goes straight to `ShowKeys`.
    ///
    /// # Errors
    /// - `MissingPrerequisite` if `p`/`g` are unset
    /// - `WrongState` outside `PickSecret`
    pub fn set_secret(&mut self, secret: BigUint) -> Result<SecretOutcome> {
        let Some(group) = self.group.as_ref() else {
            return Err(SessionError::missing("submit secret", "p and g"));
        };
        if self.state != ExchangeState::PickSecret {
            return Err(SessionError::wrong_state("submit secret", self.state));
        }

        let public = group.public_value(&secret);
        let next = match &self.remote_public {
            Some(remote) => {
                self.shared_secret = Some(group.shared_secret(remote, &secret));
                ExchangeState::ShowKeys
            }
            None => ExchangeState::AwaitingPublic,
        };
        self.secret = Some(secret);
        self.public = Some(public.clone());
        self.move_to(next);

        Ok(SecretOutcome {
            public,
            state: next,
        })
    }

    /// Moves from `ShowKeys` to `Messaging`.
    ///
    /// # Errors
    /// - `MissingPrerequisite` without a shared secret
    /// - `WrongState` outside `ShowKeys`
    pub fn start_messaging(&mut self) -> Result<Transition> {
        if self.shared_secret.is_none() {
            return Err(SessionError::missing("start messaging", "shared secret"));
        }
        if self.state != ExchangeState::ShowKeys {
            return Err(SessionError::wrong_state("start messaging", self.state));
        }
        Ok(self.move_to(ExchangeState::Messaging))
    }

    /// Encrypts `text` for the remote.
    ///
    /// # Errors
    /// - `WrongState` outside `Messaging`
    /// - `MissingPrerequisite` without a shared secret
    /// - `Core` if sealing fails
    pub fn seal_message(&self, cipher: &dyn MessageCipher, text: &str) -> Result<SealedMessage> {
        if self.state != ExchangeState::Messaging {
            return Err(SessionError::wrong_state("send a message", self.state));
        }
        let key = self
            .message_key()
            .ok_or(SessionError::missing("send a message", "shared secret"))?;
        Ok(cipher.seal(&key, text)?)
    }

    /// Sets the state without any guard.
    pub fn force_state(&mut self, state: ExchangeState) -> Transition {
        self.move_to(state)
    }

    // ========================================
    // Inbound Operations
    // ========================================

    /// Records group parameters sent by the remote.
    pub fn apply_shared(&mut self, group: GroupParams) -> Transition {
        self.group = Some(group);
        if self.state == ExchangeState::PickShared {
            self.move_to(ExchangeState::PickSecret)
        } else {
            self.stay()
        }
    }

    /// Records the remote public value, computing the shared secret if the
    /// local public value already exists.
    pub fn apply_remote_public(&mut self, remote: BigUint) -> Transition {
        if let (Some(group), Some(secret), Some(_)) = (&self.group, &self.secret, &self.public) {
            self.shared_secret = Some(group.shared_secret(&remote, secret));
        }
        self.remote_public = Some(remote);

        if self.state == ExchangeState::AwaitingPublic && self.shared_secret.is_some() {
            self.move_to(ExchangeState::ShowKeys)
        } else {
            self.stay()
        }
    }

    /// Status to report in a reply to `public`.
    #[must_use]
    pub fn public_status(&self) -> (ExchangeStatus, Option<BigUint>) {
        match (&self.group, &self.public) {
            (None, _) => (ExchangeStatus::Pending, None),
            (Some(_), None) => (ExchangeStatus::Awaiting, None),
            (Some(_), Some(public)) => (ExchangeStatus::Complete, Some(public.clone())),
        }
    }

    /// Decrypts a message from the remote.
    ///
    /// A message that fails authentication is not an error here; it is
    /// returned as `IncomingMessage::Unauthenticated`.
    ///
    /// # Errors
    /// - `MissingPrerequisite` without a shared secret
    pub fn open_message(
        &self,
        cipher: &dyn MessageCipher,
        sealed: &SealedMessage,
    ) -> Result<IncomingMessage> {
        let key = self
            .message_key()
            .ok_or(SessionError::missing("open a message", "shared secret"))?;
        match cipher.open(&key, sealed) {
            Ok(text) => Ok(IncomingMessage::Text(text)),
            Err(CoreError::Decryption) => Ok(IncomingMessage::Unauthenticated),
            Err(e) => Err(e.into()),
        }
    }

    // ========================================
    // Rollback
    // ========================================

    /// Undoes `set_shared(group)` if nothing moved the session since.
    pub fn rollback_shared(&mut self, group: &GroupParams) -> bool {
        let untouched = self.state == ExchangeState::PickSecret
            && self.group.as_ref() == Some(group)
            && self.secret.is_none();
        if untouched {
            self.group = None;
            self.move_to(ExchangeState::PickShared);
        }
        untouched
    }

    /// Undoes `set_secret` if nothing moved the session since.
    ///
    /// A remote public value merged while our own was in flight counts as
    /// untouched: the remote never got our public value, so `ShowKeys` is
    /// rolled back too. A cached remote public value is kept.
    pub fn rollback_secret(&mut self, outcome: &SecretOutcome) -> bool {
        let state_untouched =
            self.state == outcome.state || self.state == ExchangeState::ShowKeys;
        let untouched = state_untouched && self.public.as_ref() == Some(&outcome.public);
        if untouched {
            self.secret = None;
            self.public = None;
            self.shared_secret = None;
            self.move_to(ExchangeState::PickSecret);
        }
        untouched
    }

    /// Undoes `start_messaging` if nothing moved the session since.
    pub fn rollback_messaging(&mut self) -> bool {
        let untouched = self.state == ExchangeState::Messaging;
        if untouched {
            self.move_to(ExchangeState::ShowKeys);
        }
        untouched
    }

    // ========================================
    // Lifecycle
    // ========================================

    /// Forgets everything and returns to `SelectUser`.
    pub fn reset(&mut self) {
        *self = Self::new();
        info!("Session reset");
    }

    /// Copies the session for display.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            identity: self.identity,
            local_name: self.local_name(),
            remote_name: self.remote_name(),
            p: self.group.as_ref().map(|g| g.p().clone()),
            g: self.group.as_ref().map(|g| g.g().clone()),
            secret: self.secret.clone(),
            public: self.public.clone(),
            remote_public: self.remote_public.clone(),
            shared_secret: self.shared_secret.clone(),
            state: self.state,
        }
    }

    fn move_to(&mut self, to: ExchangeState) -> Transition {
        let from = self.state;
        self.state = to;
        if from != to {
            debug!(from = %from, to = %to, "Session state changed");
        }
        Transition { from, to }
    }

    fn stay(&self) -> Transition {
        Transition {
            from: self.state,
            to: self.state,
        }
    }
}

impl fmt::Debug for ExchangeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeSession")
            .field("identity", &self.identity)
            .field("state", &self.state)
            .field("group", &self.group)
            .field("public", &self.public)
            .field("remote_public", &self.remote_public)
            .field("has_secret", &self.secret.is_some())
            .field("has_shared_secret", &self.shared_secret.is_some())
            .finish()
    }
}

// ============================================
// Tests
// ============================================
