// ============================================
// File: crates/dhlink-peer/src/config.rs
// ============================================
//! # Peer Configuration
//!
//! ## Creation Reason
//! Keeps addresses, timeouts and default group parameters out of the code
//! so two peers can run on one machine or on two.
//!
//! ## Main Functionality
//! - `PeerConfig`: Main configuration structure
//! - TOML file loading and parsing
//! - Configuration validation
//! - Per-identity listen and remote ports
//!
//! ## Configuration Sections
//! - `network`: Bind host, remote host, base port, request timeout
//! - `exchange`: Default `p` and `g` offered by the console
//! - `logging`: Log level
//!
//! ## Example Configuration
//! ```toml
//! [network]
//! bind_host = "0.0.0.0"
//! remote_host = "127.0.0.1"
//! base_port = 8000
//! request_timeout_secs = 5
//!
//! [exchange]
//! default_p = "23"
//! default_g = "5"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Alice listens on `base_port`, Bob on `base_port + 1`; both peers
//!   must use the same `base_port`
//! - Every section is optional
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use dhlink_common::Identity;
use dhlink_core::crypto::GroupParams;
use dhlink_core::protocol::wire_int;
use dhlink_core::BigUint;

use crate::error::{PeerError, Result};

/// Log levels accepted by `logging.level`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ============================================
// PeerConfig
// ============================================

/// Main peer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Network configuration.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Exchange defaults.
    #[serde(default)]
    pub exchange: ExchangeConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PeerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PeerError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| PeerError::config_load(&path_str, e.to_string()))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    ///
    /// # Errors
    /// Returns error if the string cannot be parsed or validated.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PeerError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// `ConfigInvalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.exchange.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    // ========================================
    // Helper methods
    // ========================================

    /// Address the listener binds when playing `identity`.
    #[must_use]
    pub fn listen_addr(&self, identity: Identity) -> SocketAddr {
        SocketAddr::new(
            self.network.bind_host,
            identity.listen_port(self.network.base_port),
        )
    }

    /// Port the remote listens on when we play `identity`.
    #[must_use]
    pub fn remote_port(&self, identity: Identity) -> u16 {
        identity.remote().listen_port(self.network.base_port)
    }

    /// Host the remote peer runs on.
    #[must_use]
    pub fn remote_host(&self) -> &str {
        &self.network.remote_host
    }

    /// Per-request timeout for outbound deliveries.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.network.request_timeout_secs)
    }

    /// Default group parameters.
    ///
    /// # Errors
    /// `ConfigInvalid` if the defaults don't form a valid group.
    pub fn default_group(&self) -> Result<GroupParams> {
        self.exchange.group()
    }
}

// ============================================
// NetworkConfig
// ============================================

/// Network configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Address the listener binds.
    #[serde(default = "default_bind_host")]
    pub bind_host: IpAddr,

    /// Host or IP of the remote peer.
    #[serde(default = "default_remote_host")]
    pub remote_host: String,

    /// Alice's port; Bob uses the next one.
    #[serde(default = "default_base_port")]
    pub base_port: u16,

    /// Timeout for one outbound request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_bind_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_remote_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_base_port() -> u16 {
    8000
}

const fn default_request_timeout() -> u64 {
    5
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        if self.remote_host.trim().is_empty() {
            return Err(PeerError::config_invalid(
                "network.remote_host",
                "cannot be empty",
            ));
        }
        if self.base_port == 0 || self.base_port == u16::MAX {
            return Err(PeerError::config_invalid(
                "network.base_port",
                "must be between 1 and 65534",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(PeerError::config_invalid(
                "network.request_timeout_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            remote_host: default_remote_host(),
            base_port: default_base_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// ============================================
// ExchangeConfig
// ============================================

/// Defaults for the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Default modulus, decimal or `0x` hex.
    #[serde(default = "default_p")]
    pub default_p: String,

    /// Default generator, decimal or `0x` hex.
    #[serde(default = "default_g")]
    pub default_g: String,
}

fn default_p() -> String {
    "23".to_string()
}

fn default_g() -> String {
    "5".to_string()
}

impl ExchangeConfig {
    fn validate(&self) -> Result<()> {
        self.group().map(|_| ())
    }

    fn group(&self) -> Result<GroupParams> {
        let p = parse_value("exchange.default_p", &self.default_p)?;
        let g = parse_value("exchange.default_g", &self.default_g)?;
        GroupParams::new(p, g).map_err(|e| PeerError::config_invalid("exchange", e.to_string()))
    }
}

fn parse_value(field: &str, text: &str) -> Result<BigUint> {
    wire_int::parse_str(text)
        .ok_or_else(|| PeerError::config_invalid(field, format!("'{text}' is not an integer")))
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            default_p: default_p(),
            default_g: default_g(),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        if LOG_LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            Ok(())
        } else {
            Err(PeerError::config_invalid(
                "logging.level",
                format!("'{}' is not one of {}", self.level, LOG_LEVELS.join(", ")),
            ))
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================
