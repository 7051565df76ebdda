// ============================================
// File: crates/dhlink-peer/src/main.rs
// ============================================
//! # dhlink Peer Entry Point
//!
//! ## Creation Reason
//! Binary that runs one side of the exchange from a terminal.
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Logging initialization with tracing
//! - Configuration loading
//! - Console driver
//!
//! ## Usage
//! ```bash
//! # Terminal 1
//! dhlink-peer run --name alice
//!
//! # Terminal 2, possibly on another machine
//! dhlink-peer run --name bob --remote 192.168.1.20
//!
//! # Check a config file
//! dhlink-peer validate --config peer.toml
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Logs go to stderr; stdout belongs to the console
//! - `RUST_LOG` overrides `logging.level`
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dhlink_peer::{console, Peer, PeerConfig};

/// Default configuration path.
const DEFAULT_CONFIG: &str = "dhlink.toml";

// ============================================
// CLI Definition
// ============================================

/// Diffie-Hellman key exchange between Alice and Bob, then encrypted chat.
#[derive(Parser, Debug)]
#[command(name = "dhlink-peer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the interactive console
    Run {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Host of the remote peer (overrides network.remote_host)
        #[arg(short, long)]
        remote: Option<String>,

        /// Identity to play right away (alice or bob)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            remote,
            name,
        } => cmd_run(config, remote, name).await,
        Commands::Validate { config } => cmd_validate(config).await,
    };

    if let Err(e) = result {
        // No-op if a command already installed the subscriber
        init_logging("info");
        error!("{}", e);
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Runs the console.
async fn cmd_run(
    config_path: PathBuf,
    remote: Option<String>,
    name: Option<String>,
) -> anyhow::Result<()> {
    let mut config = load_or_default_config(&config_path).await?;
    init_logging(&config.logging.level);

    if let Some(remote) = remote {
        config.network.remote_host = remote;
        config.validate()?;
    }
    info!(
        "Starting dhlink peer v{}, remote host {}",
        env!("CARGO_PKG_VERSION"),
        config.remote_host()
    );

    let (peer, events) = Peer::new(config);
    if let Some(name) = name {
        let (_, text) = console::execute(&peer, console::Command::User(name)).await;
        println!("{text}");
    }

    console::run(&peer, events).await?;
    Ok(())
}

/// Validates configuration file.
async fn cmd_validate(config_path: PathBuf) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!("⚠️  Config file not found: {}", config_path.display());
        println!("   Peer will use default values.");
        return Ok(());
    }

    let loaded = PeerConfig::load(&config_path)
        .await
        .and_then(|config| config.default_group().map(|group| (config, group)));
    let (config, group) = match loaded {
        Ok(loaded) => loaded,
        Err(e) if e.is_config_error() => {
            println!("❌ Configuration is invalid");
            println!("   {e}");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    println!("✅ Configuration is valid");
    println!();
    println!("Network:");
    println!("   Bind host:   {}", config.network.bind_host);
    println!("   Remote host: {}", config.remote_host());
    println!("   Alice port:  {}", config.network.base_port);
    println!("   Bob port:    {}", config.network.base_port + 1);
    println!("   Timeout:     {}s", config.network.request_timeout_secs);
    println!();
    println!("Exchange:");
    println!("   Default p:   {}", group.p());
    println!("   Default g:   {}", group.g());
    println!();
    println!("Logging:");
    println!("   Level:       {}", config.logging.level);
    println!();

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads configuration, or defaults if the file doesn't exist.
async fn load_or_default_config(path: &Path) -> anyhow::Result<PeerConfig> {
    if path.exists() {
        Ok(PeerConfig::load(path).await?)
    } else {
        Ok(PeerConfig::default())
    }
}
