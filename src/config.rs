//! Bridge configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use bitwig_osc_bridge::BridgeConfig;
//!
//! let config = BridgeConfig::new()
//!     .with_send_port(8000)
//!     .with_receive_port(9000)
//!     .with_response_timeout(Duration::from_millis(1500));
//! config.validate()?;
//! ```
//!
//! # Environment
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `BITWIG_MCP_BITWIG_HOST` | `host` | `127.0.0.1` |
//! | `BITWIG_MCP_BITWIG_SEND_PORT` | `send_port` | `8000` |
//! | `BITWIG_MCP_BITWIG_RECEIVE_PORT` | `receive_port` | `9000` |
//! | `BITWIG_MCP_TIMEOUT_MS` | `response_timeout` | `2000` |

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default DAW host.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Default port the DAW listens on.
pub const DEFAULT_SEND_PORT: u16 = 8000;

/// Default port the DAW sends to.
pub const DEFAULT_RECEIVE_PORT: u16 = 9000;

/// Default wait for a reply.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Prefix of every environment variable read by [`BridgeConfig::from_env`].
pub const ENV_PREFIX: &str = "BITWIG_MCP_";

// ============================================================================
// ConflictPolicy
// ============================================================================

/// What `send_and_wait` does when a waiter for the same pattern exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Fail immediately with `ConcurrentRequestConflict`.
    #[default]
    Reject,
    /// Wait for the in-flight request to finish, within the caller's deadline.
    Queue,
}

impl FromStr for ConflictPolicy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "queue" => Ok(Self::Queue),
            other => Err(Error::config(format!(
                "unknown conflict policy {other:?}, expected reject or queue"
            ))),
        }
    }
}

// ============================================================================
// BridgeConfig
// ============================================================================

/// Network and timing configuration of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Host the DAW runs on.
    pub host: IpAddr,
    /// Local interface the listener binds to.
    pub listen_host: IpAddr,
    /// Port the DAW receives on.
    pub send_port: u16,
    /// Port the bridge receives on; 0 picks an ephemeral port.
    pub receive_port: u16,
    /// Default reply deadline for `send_and_wait`.
    pub response_timeout: Duration,
    /// Behavior on concurrent requests for the same pattern.
    pub conflict_policy: ConflictPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl BridgeConfig {
    /// Creates a configuration with Bitwig's default ports.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            host: DEFAULT_HOST,
            listen_host: DEFAULT_HOST,
            send_port: DEFAULT_SEND_PORT,
            receive_port: DEFAULT_RECEIVE_PORT,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            conflict_policy: ConflictPolicy::Reject,
        }
    }

    /// Reads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but unparsable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which receives full variable names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a value is present but unparsable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut config = Self::new();

        if let Some(host) = get("BITWIG_HOST") {
            config.host = parse_value("BITWIG_HOST", &host)?;
        }
        if let Some(port) = get("BITWIG_SEND_PORT") {
            config.send_port = parse_value("BITWIG_SEND_PORT", &port)?;
        }
        if let Some(port) = get("BITWIG_RECEIVE_PORT") {
            config.receive_port = parse_value("BITWIG_RECEIVE_PORT", &port)?;
        }
        if let Some(millis) = get("TIMEOUT_MS") {
            config.response_timeout =
                Duration::from_millis(parse_value("TIMEOUT_MS", &millis)?);
        }
        if let Some(policy) = get("CONFLICT_POLICY") {
            config.conflict_policy = policy.parse()?;
        }

        Ok(config)
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::config(format!("{ENV_PREFIX}{name}={raw:?}: {e}")))
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BridgeConfig {
    /// Sets the DAW host.
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Sets the local interface to listen on.
    #[inline]
    #[must_use]
    pub fn with_listen_host(mut self, host: IpAddr) -> Self {
        self.listen_host = host;
        self
    }

    /// Sets the DAW's receive port.
    #[inline]
    #[must_use]
    pub fn with_send_port(mut self, port: u16) -> Self {
        self.send_port = port;
        self
    }

    /// Sets the bridge's receive port.
    #[inline]
    #[must_use]
    pub fn with_receive_port(mut self, port: u16) -> Self {
        self.receive_port = port;
        self
    }

    /// Sets the default reply deadline.
    #[inline]
    #[must_use]
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Sets the conflict policy.
    #[inline]
    #[must_use]
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl BridgeConfig {
    /// Address outbound datagrams go to.
    #[inline]
    #[must_use]
    pub const fn send_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.send_port)
    }

    /// Address the listener binds to.
    #[inline]
    #[must_use]
    pub const fn receive_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_host, self.receive_port)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero send port, a zero timeout, or a
    /// listener that would bind the DAW's own receive address.
    pub fn validate(&self) -> Result<()> {
        if self.send_port == 0 {
            return Err(Error::config("send port must not be 0"));
        }
        if self.response_timeout.is_zero() {
            return Err(Error::config("response timeout must be greater than zero"));
        }
        if self.send_addr() == self.receive_addr() {
            return Err(Error::config(format!(
                "send and receive address are both {}",
                self.send_addr()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
