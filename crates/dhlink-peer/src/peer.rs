// ============================================
// File: crates/dhlink-peer/src/peer.rs
// ============================================
//! # Peer Orchestrator
//!
//! ## Creation Reason
//! Single owner of one participant: its session, the link to the remote,
//! the listener for inbound requests and the event channel to the UI.
//!
//! ## Main Functionality
//! - `Peer`: Lifecycle and every operation the UI can call
//! - Outbound delivery with rollback when the remote can't be reached
//! - Merge of a `complete` reply to `public`
//!
//! ## Operation Flow
//! ```text
//! UI call ──► lock session ──► validate + mutate ──► unlock
//!                                                      │
//!                                                      ▼
//!                                            PeerLink::deliver
//!                                             │             │
//!                                      success: true    lost / rejected
//!                                             │             │
//!                                        Ok(true)     rollback, Ok(false)
//! ```
//!
//! ## Lifecycle
//! 1. `Peer::new(config)` (HTTP) or `Peer::with_link(config, link)`
//! 2. `select_user` starts the listener and the outbound link
//! 3. `submit_shared`, `submit_secret`, `start_messaging`, `send_message`
//! 4. `reset` back to a fresh session, or `shutdown`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never hold the session lock across an `.await`
//! - `Ok(false)` means the remote didn't take the request; `Err` means
//!   the call itself was not allowed
//! - A custom link (tests) never starts a listener
//!
//! ## Last Modified
//! v0.1.0 - Initial peer implementation

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use dhlink_common::{ExchangeState, Identity};
use dhlink_core::crypto::{AesGcmCipher, GroupParams, MessageCipher, SealedMessage};
use dhlink_core::protocol::{PeerMessage, PeerRequest, PeerResponse};
use dhlink_core::BigUint;
use dhlink_transport::{HttpPeerLink, PeerLink, PeerListener};

use crate::config::PeerConfig;
use crate::error::Result;
use crate::events::{self, EventReceiver, EventSender, PeerEvent};
use crate::handlers::InboundHandler;
use crate::services::{ExchangeSession, SessionError, SessionSnapshot};

/// How the peer reaches the remote.
enum LinkMode {
    /// HTTP link and listener created by `select_user`.
    Http,
    /// Link supplied by the caller; no listener.
    Custom,
}

// ============================================
// Peer
// ============================================

/// One participant of the exchange.
pub struct Peer {
    /// Configuration.
    config: PeerConfig,
    /// Session shared with the inbound handler.
    session: Arc<Mutex<ExchangeSession>>,
    /// Message encryption.
    cipher: Arc<dyn MessageCipher>,
    /// Notifications for the UI.
    events: EventSender,
    /// Where the link comes from.
    mode: LinkMode,
    /// Outbound link, once known.
    link: RwLock<Option<Arc<dyn PeerLink>>>,
    /// Inbound listener, HTTP mode only.
    listener: tokio::sync::Mutex<Option<PeerListener>>,
}

impl Peer {
    /// Creates a peer that talks HTTP.
    ///
    /// Nothing is bound until [`select_user`](Self::select_user).
    #[must_use]
    pub fn new(config: PeerConfig) -> (Self, EventReceiver) {
        Self::build(config, LinkMode::Http, None)
    }

    /// Creates a peer that delivers through `link` and runs no listener.
    #[must_use]
    pub fn with_link(config: PeerConfig, link: Arc<dyn PeerLink>) -> (Self, EventReceiver) {
        Self::build(config, LinkMode::Custom, Some(link))
    }

    fn build(
        config: PeerConfig,
        mode: LinkMode,
        link: Option<Arc<dyn PeerLink>>,
    ) -> (Self, EventReceiver) {
        let (events, rx) = events::channel();
        let peer = Self {
            config,
            session: Arc::new(Mutex::new(ExchangeSession::new())),
            cipher: Arc::new(AesGcmCipher::new()),
            events,
            mode,
            link: RwLock::new(link),
            listener: tokio::sync::Mutex::new(None),
        };
        (peer, rx)
    }

    // ========================================
    // Accessors
    // ========================================

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &PeerConfig {
        &self.config
    }

    /// Local identity, if chosen.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.session.lock().identity()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ExchangeState {
        self.session.lock().state()
    }

    /// Copy of the session for display.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    /// Address the listener is bound to, if running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match self.listener.lock().await.as_ref() {
            Some(listener) => listener.local_addr().await,
            None => None,
        }
    }

    /// Handler answering inbound requests for the chosen identity.
    ///
    /// Used to wire an in-process link to this peer.
    ///
    /// # Errors
    /// `NoIdentity` before `select_user`.
    pub fn inbound_handler(&self) -> Result<Arc<InboundHandler>> {
        let identity = self.identity().ok_or(SessionError::NoIdentity)?;
        Ok(Arc::new(self.handler_for(identity)))
    }

    fn handler_for(&self, identity: Identity) -> InboundHandler {
        InboundHandler::new(
            identity,
            Arc::clone(&self.session),
            Arc::clone(&self.cipher),
            self.events.clone(),
        )
    }

    // ========================================
    // User Operations
    // ========================================

    /// Picks the identity named `name` (`"Alice"`/`"Bob"`, any case).
    ///
    /// In HTTP mode this binds the listener and prepares the link to the
    /// remote's port. If the bind fails the session stays in `SelectUser`.
    ///
    /// # Errors
    /// - `UnknownIdentity` for other names
    /// - `WrongState` outside `SelectUser`
    /// - `Transport` if the listener can't bind
    pub async fn select_user(&self, name: &str) -> Result<Identity> {
        let identity: Identity = name.parse()?;
        {
            let session = self.session.lock();
            if session.state() != ExchangeState::SelectUser || session.identity().is_some() {
                return Err(SessionError::wrong_state("select a user", session.state()).into());
            }
        }

        if matches!(self.mode, LinkMode::Http) {
            self.start_http(identity).await?;
        }

        let selected = self.session.lock().select_user(identity);
        if let Err(e) = selected {
            self.stop_http().await;
            return Err(e.into());
        }

        info!(
            identity = %identity,
            remote = %identity.remote(),
            "Playing {}",
            identity
        );
        Ok(identity)
    }

    /// Sets `p` and `g` and sends them to the remote.
    ///
    /// # Errors
    /// - `InvalidGroup` unless `p > 1` and `g > 0`
    /// - `NoIdentity` or `WrongState` if the session isn't at `PickShared`
    pub async fn submit_shared(&self, p: BigUint, g: BigUint) -> Result<bool> {
        let group = GroupParams::new(p, g)?;
        {
            let mut session = self.session.lock();
            session.identity().ok_or(SessionError::NoIdentity)?;
            session.set_shared(group.clone())?;
        }

        let delivered = self.send_shared(&group).await;
        if !delivered {
            let rolled_back = self.session.lock().rollback_shared(&group);
            if rolled_back {
                info!("Shared parameters not delivered, back to pick_shared");
            }
        }
        Ok(delivered)
    }

    /// Sets the local secret, computes the public value and sends it.
    ///
    /// # Errors
    /// - `NoIdentity`
    /// - `MissingPrerequisite` if `p`/`g` aren't set
    /// - `WrongState` outside `PickSecret`
    pub async fn submit_secret(&self, secret: BigUint) -> Result<bool> {
        let outcome = {
            let mut session = self.session.lock();
            session.identity().ok_or(SessionError::NoIdentity)?;
            session.set_secret(secret)?
        };
        info!(public = %outcome.public, state = %outcome.state, "Secret set");

        let delivered = self.send_public(&outcome.public).await;
        if !delivered {
            let rolled_back = self.session.lock().rollback_secret(&outcome);
            if rolled_back {
                info!("Public value not delivered, back to pick_secret");
            }
        }
        Ok(delivered)
    }

    /// Moves to `Messaging` and asks the remote to do the same.
    ///
    /// # Errors
    /// - `NoIdentity`
    /// - `MissingPrerequisite` without a shared secret
    /// - `WrongState` outside `ShowKeys`
    pub async fn start_messaging(&self) -> Result<bool> {
        {
            let mut session = self.session.lock();
            session.identity().ok_or(SessionError::NoIdentity)?;
            session.start_messaging()?;
        }

        let delivered = self.send_state(ExchangeState::Messaging).await;
        if !delivered {
            let rolled_back = self.session.lock().rollback_messaging();
            if rolled_back {
                info!("Remote not told about messaging, back to show_keys");
            }
        }
        Ok(delivered)
    }

    /// Encrypts `text` and sends it.
    ///
    /// # Errors
    /// - `WrongState` outside `Messaging`
    /// - `Core` if encryption fails
    pub async fn send_message(&self, text: &str) -> Result<bool> {
        let sealed = self.session.lock().seal_message(self.cipher.as_ref(), text)?;
        Ok(self.send_sealed(sealed).await)
    }

    /// Sets the state by wire name, without any guard.
    ///
    /// # Errors
    /// `InvalidState` for unknown names.
    pub fn force_state(&self, name: &str) -> Result<ExchangeState> {
        let state: ExchangeState = name.parse()?;
        let transition = self.session.lock().force_state(state);
        info!(from = %transition.from, to = %transition.to, "State forced");
        Ok(state)
    }

    // ========================================
    // Outbound Requests
    // ========================================

    /// Sends `shared` with `group`.
    pub async fn send_shared(&self, group: &GroupParams) -> bool {
        self.deliver(PeerMessage::shared(group)).await.is_some()
    }

    /// Sends `public`; a `complete` reply is merged like an inbound
    /// `public`.
    pub async fn send_public(&self, public: &BigUint) -> bool {
        let message = PeerMessage::Public {
            public: public.clone(),
        };
        let Some(reply) = self.deliver(message).await else {
            return false;
        };
        if let Some(remote) = reply.completed_public() {
            self.merge_remote_public(remote.clone());
        }
        true
    }

    /// Sends an already sealed message.
    pub async fn send_sealed(&self, sealed: SealedMessage) -> bool {
        self.deliver(PeerMessage::Message(sealed)).await.is_some()
    }

    /// Asks the remote to move to `state`.
    pub async fn send_state(&self, state: ExchangeState) -> bool {
        self.deliver(PeerMessage::SetState { state }).await.is_some()
    }

    /// Delivers one request. `None` if the remote wasn't reached or said
    /// no.
    async fn deliver(&self, message: PeerMessage) -> Option<PeerResponse> {
        let Some(identity) = self.identity() else {
            warn!("No identity selected, nothing sent");
            return None;
        };
        let link = self.link.read().clone();
        let Some(link) = link else {
            warn!("No link to the remote peer");
            return None;
        };

        let request = PeerRequest::new(identity, message);
        debug!("[OUTBOUND] {} request to {}", request.kind(), link.describe());

        match link.deliver(&request).await {
            Ok(reply) if reply.success => Some(reply),
            Ok(reply) => {
                warn!(
                    "[OUTBOUND] {} rejected by {}: {}",
                    request.kind(),
                    reply.name,
                    reply.error.as_deref().unwrap_or("no reason given")
                );
                None
            }
            Err(e) if e.is_unreachable() => {
                warn!("[OUTBOUND] Lost connection to {}: {}", link.describe(), e);
                None
            }
            Err(e) if e.is_retryable() => {
                warn!("[OUTBOUND] Transient error talking to {}, try again: {}", link.describe(), e);
                None
            }
            Err(e) => {
                warn!("[OUTBOUND] Bad exchange with {}: {}", link.describe(), e);
                None
            }
        }
    }

    fn merge_remote_public(&self, remote: BigUint) {
        let transition = self.session.lock().apply_remote_public(remote.clone());
        info!(remote_public = %remote, "Remote public value in reply");
        self.emit(PeerEvent::PublicReceived {
            remote_public: remote,
        });
        if transition.changed() {
            self.emit(PeerEvent::StateChanged(transition.to));
        }
    }

    fn emit(&self, event: PeerEvent) {
        let _ = self.events.send(event);
    }

    // ========================================
    // Lifecycle
    // ========================================

    /// Stops the listener and returns to a fresh `SelectUser` session.
    ///
    /// Configuration, and a custom link, are kept.
    pub async fn reset(&self) {
        self.stop_http().await;
        self.session.lock().reset();
    }

    /// Stops the listener.
    pub async fn shutdown(&self) {
        self.stop_http().await;
        info!("Peer shut down");
    }

    async fn start_http(&self, identity: Identity) -> Result<()> {
        let link = HttpPeerLink::new(
            self.config.remote_host(),
            self.config.remote_port(identity),
            self.config.request_timeout(),
        )?;

        let listener = PeerListener::new(
            self.config.listen_addr(identity),
            Arc::new(self.handler_for(identity)),
        );
        listener.start().await?;

        info!(remote = %link.url(), "Outbound link ready");
        *self.listener.lock().await = Some(listener);
        *self.link.write() = Some(Arc::new(link));
        Ok(())
    }

    async fn stop_http(&self) {
        if !matches!(self.mode, LinkMode::Http) {
            return;
        }
        let listener = self.listener.lock().await.take();
        if let Some(listener) = listener {
            listener.stop().await;
        }
        *self.link.write() = None;
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("identity", &self.identity())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
