// ============================================
// File: crates/dhlink-peer/tests/loopback_exchange.rs
// ============================================
//! Alice and Bob in one process, wired through `LoopbackLink`.

use std::sync::Arc;

use dhlink_common::{ExchangeState, Identity};
use dhlink_core::crypto::{AesGcmCipher, MessageCipher, MessageKey};
use dhlink_core::protocol::{PeerMessage, PeerRequest};
use dhlink_core::BigUint;
use dhlink_peer::events::EventReceiver;
use dhlink_peer::{IncomingMessage, Peer, PeerConfig, PeerEvent};
use dhlink_transport::mock::LoopbackLink;
use dhlink_transport::RequestHandler;

fn n(v: u32) -> BigUint {
    BigUint::from(v)
}

struct Pair {
    alice: Peer,
    alice_rx: EventReceiver,
    bob: Peer,
    bob_rx: EventReceiver,
    to_bob: Arc<LoopbackLink>,
}

async fn pair() -> Pair {
    let to_bob = Arc::new(LoopbackLink::new(Identity::Bob));
    let to_alice = Arc::new(LoopbackLink::new(Identity::Alice));

    let (alice, alice_rx) = Peer::with_link(PeerConfig::default(), to_bob.clone());
    let (bob, bob_rx) = Peer::with_link(PeerConfig::default(), to_alice.clone());

    alice.select_user("Alice").await.unwrap();
    bob.select_user("bob").await.unwrap();
    to_bob.connect(bob.inbound_handler().unwrap());
    to_alice.connect(alice.inbound_handler().unwrap());

    Pair {
        alice,
        alice_rx,
        bob,
        bob_rx,
        to_bob,
    }
}

fn drain(rx: &mut EventReceiver) -> Vec<PeerEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn textbook_exchange_and_message() {
    let mut p = pair().await;

    assert!(p.alice.submit_shared(n(23), n(5)).await.unwrap());
    assert_eq!(p.bob.state(), ExchangeState::PickSecret);
    assert_eq!(p.bob.snapshot().p, Some(n(23)));

    assert!(p.alice.submit_secret(n(6)).await.unwrap());
    assert_eq!(p.alice.state(), ExchangeState::AwaitingPublic);
    assert_eq!(p.alice.snapshot().public, Some(n(8)));

    assert!(p.bob.submit_secret(n(15)).await.unwrap());
    let alice = p.alice.snapshot();
    let bob = p.bob.snapshot();
    assert_eq!(bob.public, Some(n(19)));
    assert_eq!(alice.shared_secret, Some(n(2)));
    assert_eq!(bob.shared_secret, Some(n(2)));
    assert_eq!(alice.state, ExchangeState::ShowKeys);
    assert_eq!(bob.state, ExchangeState::ShowKeys);

    assert!(p.alice.start_messaging().await.unwrap());
    assert_eq!(p.bob.state(), ExchangeState::Messaging);
    drain(&mut p.bob_rx);

    assert!(p.alice.send_message("hi").await.unwrap());
    assert_eq!(
        drain(&mut p.bob_rx),
        vec![PeerEvent::MessageReceived(IncomingMessage::Text("hi".into()))]
    );

    assert!(p.bob.send_message("hello back").await.unwrap());
    assert!(drain(&mut p.alice_rx).contains(&PeerEvent::MessageReceived(IncomingMessage::Text(
        "hello back".into()
    ))));
}

#[tokio::test]
async fn public_arriving_before_local_secret() {
    let mut p = pair().await;
    p.alice.submit_shared(n(23), n(5)).await.unwrap();

    // Bob is faster: Alice receives 19 while still picking her secret
    assert!(p.bob.submit_secret(n(15)).await.unwrap());
    assert_eq!(p.bob.state(), ExchangeState::AwaitingPublic);
    assert_eq!(p.alice.state(), ExchangeState::PickSecret);
    assert_eq!(p.alice.snapshot().remote_public, Some(n(19)));
    assert_eq!(p.alice.snapshot().shared_secret, None);

    assert!(p.alice.submit_secret(n(6)).await.unwrap());
    assert_eq!(p.alice.state(), ExchangeState::ShowKeys);
    assert_eq!(p.bob.state(), ExchangeState::ShowKeys);
    assert_eq!(p.alice.snapshot().shared_secret, Some(n(2)));
    assert_eq!(p.bob.snapshot().shared_secret, Some(n(2)));

    assert!(drain(&mut p.bob_rx).contains(&PeerEvent::StateChanged(ExchangeState::ShowKeys)));
}

#[tokio::test]
async fn secret_before_parameters_is_refused() {
    let p = pair().await;
    let err = p.bob.submit_secret(n(15)).await.unwrap_err();
    assert!(err.is_session_error());
    assert_eq!(p.bob.snapshot().public, None);
    assert_eq!(p.alice.snapshot().remote_public, None);
}

#[tokio::test]
async fn malformed_request_is_answered_not_applied() {
    let p = pair().await;
    let handler = p.bob.inbound_handler().unwrap();

    let reply = handler.handle(br#"{"name":"Alice","type":"shared"}"#);
    assert!(!reply.success);
    assert_eq!(reply.name, "Bob");
    assert_eq!(reply.error.as_deref(), Some("Missing parameters"));
    assert_eq!(p.bob.state(), ExchangeState::PickShared);
}

#[tokio::test]
async fn lost_connection_rolls_back_and_allows_retry() {
    let p = pair().await;
    let handler = p.bob.inbound_handler().unwrap();
    p.to_bob.disconnect();

    assert!(!p.alice.submit_shared(n(23), n(5)).await.unwrap());
    assert_eq!(p.alice.state(), ExchangeState::PickShared);
    assert_eq!(p.alice.snapshot().p, None);
    assert_eq!(p.bob.state(), ExchangeState::PickShared);

    p.to_bob.connect(handler);
    assert!(p.alice.submit_shared(n(23), n(5)).await.unwrap());
    assert_eq!(p.bob.state(), ExchangeState::PickSecret);
}

#[tokio::test]
async fn unauthenticated_message_is_surfaced() {
    let mut p = pair().await;
    p.alice.submit_shared(n(23), n(5)).await.unwrap();
    p.alice.submit_secret(n(6)).await.unwrap();
    p.bob.submit_secret(n(15)).await.unwrap();
    drain(&mut p.bob_rx);

    // Sealed under the wrong key
    let sealed = AesGcmCipher::new()
        .seal(&MessageKey::derive(&n(3)), "forged")
        .unwrap();
    let body =
        serde_json::to_vec(&PeerRequest::new(Identity::Alice, PeerMessage::Message(sealed)))
            .unwrap();

    let reply = p.bob.inbound_handler().unwrap().handle(&body);
    assert!(!reply.success);
    assert_eq!(
        drain(&mut p.bob_rx),
        vec![PeerEvent::MessageReceived(IncomingMessage::Unauthenticated)]
    );
    assert_eq!(p.bob.state(), ExchangeState::ShowKeys);
}

#[tokio::test]
async fn remote_set_state_and_reset() {
    let p = pair().await;
    assert!(p.alice.send_state(ExchangeState::ShowKeys).await);
    assert_eq!(p.bob.state(), ExchangeState::ShowKeys);

    p.bob.reset().await;
    assert_eq!(p.bob.state(), ExchangeState::SelectUser);
    assert_eq!(p.bob.identity(), None);
}
