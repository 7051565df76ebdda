// ============================================
// File: crates/dhlink-peer/src/handlers/inbound.rs
// ============================================
//! # Inbound Handler
//!
//! ## Creation Reason
//! Turns raw request bodies posted by the remote peer into session
//! mutations, a reply and UI events.
//!
//! ## Main Functionality
//! - `InboundHandler`: `RequestHandler` implementation used by the listener
//! - Validation through `decode_request`
//! - Per-type dispatch against the shared session
//!
//! ## Request Processing
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  1. decode_request(body, local)                             │
//! │     JSON? name? name == remote? type? fields? values?       │
//! │                                                             │
//! │  2. lock session                                            │
//! │     shared    → apply_shared        → ok                    │
//! │     public    → apply_remote_public → status (+ public)     │
//! │     message   → open_message        → ok / Decryption       │
//! │     set_state → force_state         → ok                    │
//! │  3. unlock                                                  │
//! │                                                             │
//! │  4. emit PeerEvents                                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every failure becomes `{success: false, error}`; nothing escapes
//! - Events are sent after the lock is released
//! - Never log plaintext or secrets here
//!
//! ## Last Modified
//! v0.1.0 - Initial inbound handler

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use dhlink_common::Identity;
use dhlink_core::crypto::{GroupParams, MessageCipher};
use dhlink_core::error::CoreError;
use dhlink_core::protocol::{decode_request, PeerMessage, PeerResponse};
use dhlink_transport::RequestHandler;

use crate::error::Result;
use crate::events::{EventSender, IncomingMessage, PeerEvent};
use crate::services::{ExchangeSession, Transition};

// ============================================
// InboundHandler
// ============================================

/// Handles requests from the remote peer.
///
/// # Thread Safety
/// The listener may call `handle` from several tasks at once; all session
/// access goes through the shared mutex.
pub struct InboundHandler {
    /// Identity this peer plays.
    local: Identity,
    /// Session shared with the `Peer`.
    session: Arc<Mutex<ExchangeSession>>,
    /// Message encryption.
    cipher: Arc<dyn MessageCipher>,
    /// Notifications for the UI.
    events: EventSender,
}

impl InboundHandler {
    /// Creates a handler answering as `local`.
    pub fn new(
        local: Identity,
        session: Arc<Mutex<ExchangeSession>>,
        cipher: Arc<dyn MessageCipher>,
        events: EventSender,
    ) -> Self {
        Self {
            local,
            session,
            cipher,
            events,
        }
    }

    fn process(&self, body: &[u8]) -> Result<PeerResponse> {
        let request = decode_request(body, self.local)?;
        debug!(
            "[INBOUND] {} request from {}",
            request.kind(),
            request.name
        );

        let (reply, events) = self.dispatch(request.message)?;
        for event in events {
            // Receiver gone means the UI shut down; the session is still updated
            let _ = self.events.send(event);
        }
        Ok(reply)
    }

    fn dispatch(&self, message: PeerMessage) -> Result<(PeerResponse, Vec<PeerEvent>)> {
        let mut events = Vec::new();
        let mut session = self.session.lock();

        let reply = match message {
            PeerMessage::Shared { p, g } => {
                let group = GroupParams::new(p.clone(), g.clone())?;
                let transition = session.apply_shared(group);
                info!(p = %p, g = %g, "Received shared parameters");
                events.push(PeerEvent::SharedReceived { p, g });
                push_transition(&mut events, transition);
                PeerResponse::ok(self.local)
            }
            PeerMessage::Public { public } => {
                let transition = session.apply_remote_public(public.clone());
                info!(remote_public = %public, "Received remote public value");
                events.push(PeerEvent::PublicReceived {
                    remote_public: public,
                });
                push_transition(&mut events, transition);

                let (status, own) = session.public_status();
                PeerResponse::with_status(self.local, status, own)
            }
            PeerMessage::Message(sealed) => {
                match session.open_message(self.cipher.as_ref(), &sealed)? {
                    IncomingMessage::Text(text) => {
                        debug!("[INBOUND] Message opened, {} bytes", text.len());
                        events.push(PeerEvent::MessageReceived(IncomingMessage::Text(text)));
                        PeerResponse::ok(self.local)
                    }
                    IncomingMessage::Unauthenticated => {
                        warn!("[INBOUND] Message failed authentication");
                        events.push(PeerEvent::MessageReceived(IncomingMessage::Unauthenticated));
                        PeerResponse::failure(self.local, CoreError::Decryption.to_string())
                    }
                }
            }
            PeerMessage::SetState { state } => {
                let transition = session.force_state(state);
                info!(state = %state, "Remote set state");
                push_transition(&mut events, transition);
                PeerResponse::ok(self.local)
            }
        };

        drop(session);
        Ok((reply, events))
    }
}

fn push_transition(events: &mut Vec<PeerEvent>, transition: Transition) {
    if transition.changed() {
        events.push(PeerEvent::StateChanged(transition.to));
    }
}

impl RequestHandler for InboundHandler {
    fn handle(&self, body: &[u8]) -> PeerResponse {
        self.process(body).unwrap_or_else(|e| {
            warn!("[INBOUND] Rejected request: {}", e);
            PeerResponse::failure(self.local, e.to_string())
        })
    }

    fn reject(&self, reason: &str) -> PeerResponse {
        warn!("[INBOUND] Unreadable request: {}", reason);
        PeerResponse::failure(self.local, reason)
    }
}

impl std::fmt::Debug for InboundHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundHandler")
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use dhlink_common::ExchangeState;
    use dhlink_core::crypto::{AesGcmCipher, MessageKey};
    use dhlink_core::protocol::{ExchangeStatus, PeerRequest};
    use dhlink_core::BigUint;

    use crate::events::{self, EventReceiver};

    fn n(v: u32) -> BigUint {
        BigUint::from(v)
    }

    /// Bob's handler with a fresh session that already picked Bob.
    fn bob() -> (InboundHandler, Arc<Mutex<ExchangeSession>>, EventReceiver) {
        let mut session = ExchangeSession::new();
        session.select_user(Identity::Bob).unwrap();
        let session = Arc::new(Mutex::new(session));
        let (tx, rx) = events::channel();
        let handler = InboundHandler::new(
            Identity::Bob,
            Arc::clone(&session),
            Arc::new(AesGcmCipher::new()),
            tx,
        );
        (handler, session, rx)
    }

    fn from_alice(message: PeerMessage) -> Vec<u8> {
        serde_json::to_vec(&PeerRequest::new(Identity::Alice, message)).unwrap()
    }

    fn drain(rx: &mut EventReceiver) -> Vec<PeerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    /// Moves Bob's session to `ShowKeys` with shared secret 2.
    fn complete_exchange(session: &Arc<Mutex<ExchangeSession>>) {
        let mut session = session.lock();
        session.set_shared(GroupParams::new(n(23), n(5)).unwrap()).unwrap();
        session.apply_remote_public(n(8));
        session.set_secret(n(15)).unwrap();
    }

    #[test]
    fn test_shared_request() {
        let (handler, session, mut rx) = bob();
        let reply = handler.handle(&from_alice(PeerMessage::Shared { p: n(23), g: n(5) }));

        assert!(reply.success);
        assert_eq!(reply.name, "Bob");
        assert_eq!(session.lock().state(), ExchangeState::PickSecret);
        assert_eq!(
            drain(&mut rx),
            vec![
                PeerEvent::SharedReceived { p: n(23), g: n(5) },
                PeerEvent::StateChanged(ExchangeState::PickSecret),
            ]
        );
    }

    #[test]
    fn test_rejections() {
        let (handler, session, mut rx) = bob();

        let reply = handler.handle(br#"{"name":"Alice","type":"shared"}"#);
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("Missing parameters"));

        let reply = handler.handle(br#"{"name":"Bob","type":"shared","p":23,"g":5}"#);
        assert_eq!(reply.error.as_deref(), Some("Wrong name, expected Alice"));

        let reply = handler.handle(b"not json");
        assert!(reply.error.unwrap().starts_with("Malformed request"));

        let reply = handler.handle(br#"{"name":"alice","type":"hello"}"#);
        assert!(reply.error.unwrap().starts_with("Invalid request type"));

        let reply = handler.handle(br#"{"name":"Alice","type":"set_state","state":"bogus"}"#);
        assert_eq!(reply.error.as_deref(), Some("Invalid state: bogus"));

        assert_eq!(session.lock().state(), ExchangeState::PickShared);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_unreadable_body_reply() {
        let (handler, session, mut rx) = bob();
        let reply = handler.reject("Request body rejected: length limit exceeded");
        assert!(!reply.success);
        assert_eq!(reply.name, "Bob");
        assert_eq!(
            reply.error.as_deref(),
            Some("Request body rejected: length limit exceeded")
        );
        assert_eq!(session.lock().state(), ExchangeState::PickShared);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_public_status_progression() {
        let (handler, session, mut rx) = bob();
        let public = || from_alice(PeerMessage::Public { public: n(8) });

        let reply = handler.handle(&public());
        assert_eq!(reply.status, Some(ExchangeStatus::Pending));
        assert!(reply.public.is_none());

        session
            .lock()
            .set_shared(GroupParams::new(n(23), n(5)).unwrap())
            .unwrap();
        let reply = handler.handle(&public());
        assert_eq!(reply.status, Some(ExchangeStatus::Awaiting));

        session.lock().set_secret(n(15)).unwrap();
        let reply = handler.handle(&public());
        assert_eq!(reply.status, Some(ExchangeStatus::Complete));
        assert_eq!(reply.completed_public(), Some(&n(19)));
        assert_eq!(session.lock().shared_secret(), Some(&n(2)));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        assert!(events
            .iter()
            .all(|e| *e == PeerEvent::PublicReceived { remote_public: n(8) }));
    }

    #[test]
    fn test_public_completes_awaiting_session() {
        let (handler, session, mut rx) = bob();
        {
            let mut s = session.lock();
            s.set_shared(GroupParams::new(n(23), n(5)).unwrap()).unwrap();
            s.set_secret(n(15)).unwrap();
        }

        handler.handle(&from_alice(PeerMessage::Public { public: n(8) }));
        assert_eq!(session.lock().state(), ExchangeState::ShowKeys);
        assert_eq!(
            drain(&mut rx).last(),
            Some(&PeerEvent::StateChanged(ExchangeState::ShowKeys))
        );
    }

    #[test]
    fn test_message_request() {
        let (handler, session, mut rx) = bob();
        complete_exchange(&session);
        drain(&mut rx);

        let cipher = AesGcmCipher::new();
        let key = MessageKey::derive(&n(2));
        let sealed = cipher.seal(&key, "hi").unwrap();

        let reply = handler.handle(&from_alice(PeerMessage::Message(sealed.clone())));
        assert!(reply.success);
        assert_eq!(
            drain(&mut rx),
            vec![PeerEvent::MessageReceived(IncomingMessage::Text("hi".into()))]
        );

        let mut tampered = sealed;
        tampered.ciphertext[0] ^= 0x80;
        let reply = handler.handle(&from_alice(PeerMessage::Message(tampered)));
        assert!(!reply.success);
        assert_eq!(reply.error, Some(CoreError::Decryption.to_string()));
        assert_eq!(
            drain(&mut rx),
            vec![PeerEvent::MessageReceived(IncomingMessage::Unauthenticated)]
        );
    }

    #[test]
    fn test_message_before_shared_secret() {
        let (handler, _session, mut rx) = bob();
        let sealed = AesGcmCipher::new()
            .seal(&MessageKey::derive(&n(2)), "early")
            .unwrap();

        let reply = handler.handle(&from_alice(PeerMessage::Message(sealed)));
        assert!(!reply.success);
        assert!(reply.error.unwrap().contains("shared secret not set"));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_set_state_request() {
        let (handler, session, mut rx) = bob();
        let reply = handler.handle(br#"{"name":"Alice","type":"set_state","state":"messaging"}"#);

        assert!(reply.success);
        assert_eq!(session.lock().state(), ExchangeState::Messaging);
        assert_eq!(
            drain(&mut rx),
            vec![PeerEvent::StateChanged(ExchangeState::Messaging)]
        );

        // Same state again: acknowledged, no event
        handler.handle(br#"{"name":"Alice","type":"set_state","state":"messaging"}"#);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_closed_event_channel() {
        let (handler, session, rx) = bob();
        drop(rx);
        let reply = handler.handle(&from_alice(PeerMessage::Shared { p: n(23), g: n(5) }));
        assert!(reply.success);
        assert_eq!(session.lock().state(), ExchangeState::PickSecret);
    }
}
