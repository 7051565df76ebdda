// ============================================
// File: crates/dhlink-peer/src/console.rs
// ============================================
//! # Console Driver
//!
//! ## Creation Reason
//! Line-oriented interface for the binary: reads commands from stdin,
//! calls the `Peer`, and prints inbound events as they arrive.
//!
//! ## Commands
//! ```text
//! user <name>       play Alice or Bob (prefix, any case)
//! shared [p] [g]    choose group parameters (defaults from config)
//! secret <n>        choose the local secret
//! chat              start messaging
//! say <text>        send an encrypted message
//! state <name>      force the local state
//! status            show the session
//! reset             start over
//! help              list commands
//! quit              leave
//! ```
//!
//! Numbers are read as decimal, then as hex (with or without `0x`).
//!
//! ## Last Modified
//! v0.1.0 - Initial console driver

use std::fmt::Write as _;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use dhlink_common::ExchangeState;
use dhlink_core::protocol::wire_int;
use dhlink_core::BigUint;

use crate::error::Result;
use crate::events::{EventReceiver, IncomingMessage, PeerEvent};
use crate::peer::Peer;
use crate::services::SessionSnapshot;

const HELP: &str = "\
Commands:
  user <name>      play Alice or Bob
  shared [p] [g]   choose p and g (empty uses the defaults)
  secret <n>       choose your secret
  chat             start messaging
  say <text>       send an encrypted message
  state <name>     force the local state
  status           show the session
  reset            start over
  help             show this list
  quit             leave";

// ============================================
// Command
// ============================================

/// One console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `user <name>`
    User(String),
    /// `shared [p] [g]`
    Shared {
        /// Modulus as typed.
        p: Option<String>,
        /// Generator as typed.
        g: Option<String>,
    },
    /// `secret <n>`
    Secret(String),
    /// `chat`
    Chat,
    /// `say <text>`
    Say(String),
    /// `state <name>`
    State(String),
    /// `status`
    Status,
    /// `reset`
    Reset,
    /// `help`
    Help,
    /// `quit`
    Quit,
}

/// A line that isn't a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Blank line.
    #[error("empty command")]
    Empty,

    /// First word isn't a command.
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),

    /// A required argument is missing.
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Parses one input line.
///
/// # Errors
/// `CommandError` for blank lines, unknown commands and missing arguments.
pub fn parse_command(line: &str) -> std::result::Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));
    let mut args = rest.split_whitespace().map(str::to_string);

    match word.to_ascii_lowercase().as_str() {
        "" => Err(CommandError::Empty),
        "user" => args.next().map(Command::User).ok_or(CommandError::Usage("user <name>")),
        "shared" => Ok(Command::Shared {
            p: args.next(),
            g: args.next(),
        }),
        "secret" => args
            .next()
            .map(Command::Secret)
            .ok_or(CommandError::Usage("secret <n>")),
        "chat" => Ok(Command::Chat),
        "say" if rest.is_empty() => Err(CommandError::Usage("say <text>")),
        "say" => Ok(Command::Say(rest.to_string())),
        "state" => args
            .next()
            .map(Command::State)
            .ok_or(CommandError::Usage("state <name>")),
        "status" => Ok(Command::Status),
        "reset" => Ok(Command::Reset),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

/// Reads a number typed by the user: decimal first, then hex.
#[must_use]
pub fn parse_number(text: &str) -> Option<BigUint> {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    wire_int::parse_str(&text).or_else(|| BigUint::parse_bytes(text.as_bytes(), 16))
}

/// Like [`parse_number`], falling back to `default` for missing, zero or
/// unreadable input.
fn number_or_default(text: Option<&str>, default: &BigUint) -> BigUint {
    text.and_then(parse_number)
        .filter(|v| *v != BigUint::default())
        .unwrap_or_else(|| default.clone())
}

// ============================================
// Execution
// ============================================

/// Whether the console keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Leave the loop.
    Quit,
}

/// Runs one command against `peer` and returns the text to print.
///
/// Errors are rendered into the text; the console never stops on them.
pub async fn execute(peer: &Peer, command: Command) -> (Flow, String) {
    match run_command(peer, command).await {
        Ok(result) => result,
        Err(e) => (Flow::Continue, format!("error: {e}")),
    }
}

async fn run_command(peer: &Peer, command: Command) -> Result<(Flow, String)> {
    let text = match command {
        Command::User(name) => {
            let identity = peer.select_user(&name).await?;
            format!("You are {identity}, talking to {}", identity.remote())
        }
        Command::Shared { p, g } => {
            let defaults = peer.config().default_group()?;
            let p = number_or_default(p.as_deref(), defaults.p());
            let g = number_or_default(g.as_deref(), defaults.g());
            let summary = format!("p = {p}, g = {g}");
            if peer.submit_shared(p, g).await? {
                format!("Sent {summary}")
            } else {
                format!("Remote did not take {summary}; submit again")
            }
        }
        Command::Secret(text) => {
            let Some(secret) = parse_number(&text) else {
                return Ok((Flow::Continue, format!("'{text}' is not a number")));
            };
            if peer.submit_secret(secret).await? {
                render_keys(&peer.snapshot())
            } else {
                "Remote did not take the public value; submit again".to_string()
            }
        }
        Command::Chat => {
            if peer.start_messaging().await? {
                "Messaging started".to_string()
            } else {
                "Remote did not take the state change; try again".to_string()
            }
        }
        Command::Say(text) => {
            if peer.send_message(&text).await? {
                format!("you: {text}")
            } else {
                "Message not accepted by the remote".to_string()
            }
        }
        Command::State(name) => {
            let state = peer.force_state(&name)?;
            format!("State: {state}")
        }
        Command::Status => render_snapshot(&peer.snapshot()),
        Command::Reset => {
            peer.reset().await;
            "Session reset".to_string()
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok((Flow::Quit, "Bye".to_string())),
    };
    Ok((Flow::Continue, text))
}

// ============================================
// Rendering
// ============================================

/// Text for an inbound event.
#[must_use]
pub fn render_event(event: &PeerEvent) -> String {
    match event {
        PeerEvent::SharedReceived { p, g } => format!("Remote chose p = {p}, g = {g}"),
        PeerEvent::PublicReceived { remote_public } => {
            format!("Remote public value: {remote_public}")
        }
        PeerEvent::MessageReceived(IncomingMessage::Text(text)) => format!("them: {text}"),
        PeerEvent::MessageReceived(IncomingMessage::Unauthenticated) => {
            "message could not be authenticated".to_string()
        }
        PeerEvent::StateChanged(state) => format!("State: {state}"),
    }
}

fn render_keys(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    if let Some(public) = &snapshot.public {
        let _ = write!(out, "Your public value: {public}");
    }
    match (&snapshot.shared_secret, snapshot.state) {
        (Some(shared), _) => {
            let _ = write!(out, "\nShared secret: {shared}");
        }
        (None, ExchangeState::AwaitingPublic) => out.push_str("\nWaiting for the remote public value"),
        (None, _) => {}
    }
    out
}

/// Multi-line view of a session.
#[must_use]
pub fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    fn value(v: Option<&BigUint>) -> String {
        v.map_or_else(|| "-".to_string(), ToString::to_string)
    }

    let mut out = String::new();
    let name = |n: &str| if n.is_empty() { "-".to_string() } else { n.to_string() };
    let _ = writeln!(out, "You:            {}", name(snapshot.local_name));
    let _ = writeln!(out, "Remote:         {}", name(snapshot.remote_name));
    let _ = writeln!(out, "State:          {}", snapshot.state);
    let _ = writeln!(out, "p:              {}", value(snapshot.p.as_ref()));
    let _ = writeln!(out, "g:              {}", value(snapshot.g.as_ref()));
    let _ = writeln!(out, "Secret:         {}", value(snapshot.secret.as_ref()));
    let _ = writeln!(out, "Public:         {}", value(snapshot.public.as_ref()));
    let _ = writeln!(out, "Remote public:  {}", value(snapshot.remote_public.as_ref()));
    let _ = write!(out, "Shared secret:  {}", value(snapshot.shared_secret.as_ref()));
    out
}

// ============================================
// Loop
// ============================================

/// Reads commands from stdin until `quit` or end of input, printing
/// inbound events in between. Shuts the peer down on exit.
///
/// # Errors
/// I/O errors reading stdin.
pub async fn run(peer: &Peer, mut events: EventReceiver) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(command) => {
                        let (flow, text) = execute(peer, command).await;
                        println!("{text}");
                        if flow == Flow::Quit {
                            break;
                        }
                    }
                    Err(CommandError::Empty) => {}
                    Err(e) => println!("{e}"),
                }
            }
            Some(event) = events.recv() => println!("{}", render_event(&event)),
        }
    }

    peer.shutdown().await;
    Ok(())
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dhlink_common::Identity;
    use dhlink_core::protocol::{ExchangeStatus, PeerMessage, PeerResponse};
    use dhlink_transport::mock::MockPeerLink;

    use crate::config::PeerConfig;

    fn n(v: u32) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("user alice"), Ok(Command::User("alice".into())));
        assert_eq!(
            parse_command("  SHARED 23 "),
            Ok(Command::Shared {
                p: Some("23".into()),
                g: None
            })
        );
        assert_eq!(parse_command("say  hello there "), Ok(Command::Say("hello there".into())));
        assert_eq!(parse_command("chat"), Ok(Command::Chat));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
        assert_eq!(parse_command("   "), Err(CommandError::Empty));
        assert_eq!(parse_command("secret"), Err(CommandError::Usage("secret <n>")));
        assert_eq!(parse_command("say"), Err(CommandError::Usage("say <text>")));
        assert_eq!(parse_command("dance"), Err(CommandError::Unknown("dance".into())));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("23"), Some(n(23)));
        assert_eq!(parse_number("0x17"), Some(n(23)));
        assert_eq!(parse_number("ff"), Some(n(255)));
        assert_eq!(parse_number(" 1 000 "), Some(n(1000)));
        assert_eq!(parse_number("xyz"), None);
    }

    #[test]
    fn test_number_or_default() {
        let default = n(23);
        assert_eq!(number_or_default(None, &default), n(23));
        assert_eq!(number_or_default(Some("0"), &default), n(23));
        assert_eq!(number_or_default(Some("nope"), &default), n(23));
        assert_eq!(number_or_default(Some("29"), &default), n(29));
    }

    #[test]
    fn test_render_event() {
        assert_eq!(
            render_event(&PeerEvent::MessageReceived(IncomingMessage::Unauthenticated)),
            "message could not be authenticated"
        );
        assert_eq!(
            render_event(&PeerEvent::MessageReceived(IncomingMessage::Text("hi".into()))),
            "them: hi"
        );
        assert_eq!(
            render_event(&PeerEvent::StateChanged(ExchangeState::ShowKeys)),
            "State: show_keys"
        );
    }

    #[tokio::test]
    async fn test_execute_walkthrough() {
        let link = Arc::new(MockPeerLink::new(Identity::Bob));
        let (peer, _rx) = Peer::with_link(PeerConfig::default(), link.clone());

        let (_, text) = execute(&peer, Command::User("a".into())).await;
        assert_eq!(text, "You are Alice, talking to Bob");

        let (_, text) = execute(&peer, Command::Shared { p: None, g: None }).await;
        assert_eq!(text, "Sent p = 23, g = 5");
        assert_eq!(link.sent()[0].message, PeerMessage::Shared { p: n(23), g: n(5) });

        link.push_reply(PeerResponse::with_status(
            Identity::Bob,
            ExchangeStatus::Complete,
            Some(n(19)),
        ));
        let (_, text) = execute(&peer, Command::Secret("6".into())).await;
        assert_eq!(text, "Your public value: 8\nShared secret: 2");

        let (_, text) = execute(&peer, Command::Chat).await;
        assert_eq!(text, "Messaging started");

        let (_, text) = execute(&peer, Command::Say("hi".into())).await;
        assert_eq!(text, "you: hi");

        link.push_reply(PeerResponse::failure(Identity::Bob, "Decryption failed"));
        let (_, text) = execute(&peer, Command::Say("again".into())).await;
        assert_eq!(text, "Message not accepted by the remote");

        let (flow, _) = execute(&peer, Command::Quit).await;
        assert_eq!(flow, Flow::Quit);
    }

    #[tokio::test]
    async fn test_execute_reports_errors() {
        let link = Arc::new(MockPeerLink::new(Identity::Bob));
        let (peer, _rx) = Peer::with_link(PeerConfig::default(), link.clone());

        let (flow, text) = execute(&peer, Command::User("carol".into())).await;
        assert_eq!(flow, Flow::Continue);
        assert!(text.starts_with("error:"));

        execute(&peer, Command::User("bob".into())).await;
        let (_, text) = execute(&peer, Command::Secret("15".into())).await;
        assert!(text.starts_with("error: Cannot submit secret"));

        let (_, text) = execute(&peer, Command::Secret("zz!".into())).await;
        assert_eq!(text, "'zz!' is not a number");

        link.set_unreachable(true);
        let (_, text) = execute(&peer, Command::Shared { p: None, g: None }).await;
        assert!(text.starts_with("Remote did not take p = 23"));
    }

    #[test]
    fn test_render_snapshot() {
        let text = render_snapshot(&crate::services::ExchangeSession::new().snapshot());
        assert!(text.contains("You:            -"));
        assert!(text.contains("State:          select_user"));
        assert!(text.ends_with("Shared secret:  -"));
    }
}
