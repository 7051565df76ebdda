// ============================================
// File: crates/dhlink-peer/tests/http_exchange.rs
// ============================================
//! Alice and Bob over real HTTP on localhost.
//!
//! Each test uses its own `base_port` so they can run in parallel.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use dhlink_common::ExchangeState;
use dhlink_core::BigUint;
use dhlink_peer::events::EventReceiver;
use dhlink_peer::{IncomingMessage, Peer, PeerConfig, PeerEvent};

fn n(v: u32) -> BigUint {
    BigUint::from(v)
}

fn config(base_port: u16) -> PeerConfig {
    let mut config = PeerConfig::default();
    config.network.bind_host = IpAddr::V4(Ipv4Addr::LOCALHOST);
    config.network.remote_host = "127.0.0.1".into();
    config.network.base_port = base_port;
    config.network.request_timeout_secs = 2;
    config
}

async fn next_event(rx: &mut EventReceiver) -> PeerEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event in time")
        .expect("channel open")
}

#[tokio::test]
async fn exchange_over_http() {
    let (alice, _alice_rx) = Peer::new(config(47310));
    let (bob, mut bob_rx) = Peer::new(config(47310));

    alice.select_user("alice").await.unwrap();
    bob.select_user("bob").await.unwrap();
    assert_eq!(alice.local_addr().await.map(|a| a.port()), Some(47310));
    assert_eq!(bob.local_addr().await.map(|a| a.port()), Some(47311));

    assert!(alice.submit_shared(n(23), n(5)).await.unwrap());
    assert_eq!(
        next_event(&mut bob_rx).await,
        PeerEvent::SharedReceived { p: n(23), g: n(5) }
    );

    assert!(alice.submit_secret(n(6)).await.unwrap());
    assert!(bob.submit_secret(n(15)).await.unwrap());
    assert_eq!(alice.snapshot().shared_secret, Some(n(2)));
    assert_eq!(bob.snapshot().shared_secret, Some(n(2)));

    assert!(alice.start_messaging().await.unwrap());
    assert_eq!(bob.state(), ExchangeState::Messaging);

    while bob_rx.try_recv().is_ok() {}
    assert!(alice.send_message("hi").await.unwrap());
    assert_eq!(
        next_event(&mut bob_rx).await,
        PeerEvent::MessageReceived(IncomingMessage::Text("hi".into()))
    );

    alice.shutdown().await;
    bob.shutdown().await;
}

#[tokio::test]
async fn malformed_posts_get_json_errors() {
    let (bob, _rx) = Peer::new(config(47320));
    bob.select_user("bob").await.unwrap();

    let client = reqwest::Client::new();
    let url = "http://127.0.0.1:47321/";

    let reply: serde_json::Value = client
        .post(url)
        .body(r#"{"name":"Alice","type":"shared"}"#)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["success"], false);
    assert_eq!(reply["name"], "Bob");
    assert_eq!(reply["error"], "Missing parameters");

    let reply: serde_json::Value = client
        .post(url)
        .body(r#"{"name":"Carol","type":"shared","p":23,"g":5}"#)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["error"], "Wrong name, expected Alice");

    let response = client
        .post("http://127.0.0.1:47321/exchange")
        .body(r#"{"name":"Alice","type":"shared","p":23,"g":5}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let reply: serde_json::Value = response.json().await.unwrap();
    assert_eq!(reply["success"], true);
    assert_eq!(bob.state(), ExchangeState::PickSecret);
    bob.shutdown().await;
}

#[tokio::test]
async fn rejected_posts_leave_state_alone() {
    let (bob, _rx) = Peer::new(config(47350));
    bob.select_user("bob").await.unwrap();

    let reply: serde_json::Value = reqwest::Client::new()
        .post("http://127.0.0.1:47351/")
        .body("not json")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["success"], false);

    assert_eq!(bob.state(), ExchangeState::PickShared);
    bob.shutdown().await;
}

#[tokio::test]
async fn unreachable_remote_rolls_back() {
    let (alice, _rx) = Peer::new(config(47330));
    alice.select_user("alice").await.unwrap();

    // Nobody listens on 47331
    assert!(!alice.submit_shared(n(23), n(5)).await.unwrap());
    assert_eq!(alice.state(), ExchangeState::PickShared);

    let (bob, _bob_rx) = Peer::new(config(47330));
    bob.select_user("bob").await.unwrap();
    assert!(alice.submit_shared(n(23), n(5)).await.unwrap());

    alice.shutdown().await;
    bob.shutdown().await;
}

#[tokio::test]
async fn reset_frees_the_port() {
    let (alice, _rx) = Peer::new(config(47340));
    alice.select_user("alice").await.unwrap();

    let (other, _other_rx) = Peer::new(config(47340));
    assert!(other.select_user("alice").await.is_err());
    assert_eq!(other.state(), ExchangeState::SelectUser);

    alice.reset().await;
    assert_eq!(alice.local_addr().await, None);
    other.select_user("alice").await.unwrap();
    other.shutdown().await;
}
