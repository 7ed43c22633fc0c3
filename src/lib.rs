//! Bitwig OSC Bridge - drive Bitwig Studio over Open Sound Control.
//!
//! This library talks to the DAW's OSC controller extension over UDP and
//! turns its fire-and-forget message stream into a request/response API.
//!
//! # Architecture
//!
//! The DAW and the bridge exchange plain OSC datagrams:
//!
//! - **Outbound**: commands are sent to the DAW's receive port
//! - **Inbound**: the DAW pushes every state change to the bridge's port
//!
//! Replies carry no correlation id. The [`Controller`] keeps a live cache of
//! the last value seen per address and completes waiters whose
//! [`AddressPattern`] matches an inbound message.
//!
//! Key design principles:
//!
//! - Each [`Controller`] owns its socket pair, cache and waiter table
//! - At most one waiter per pattern; a conflicting request is rejected or
//!   queued per [`ConflictPolicy`]
//! - The DAW only reports changes, so a missing reply means "unknown",
//!   not "failed"
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use bitwig_osc_bridge::{BridgeConfig, Controller, Message, Result, address};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let controller = Controller::connect(BridgeConfig::from_env()?).await?;
//!
//!     controller.fire_and_forget(Message::trigger(address::PLAY)).await?;
//!     let tempo = controller.refresh(address::TEMPO, Duration::from_secs(1)).await?;
//!     println!("Tempo: {tempo}");
//!
//!     controller.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | Device browser navigation |
//! | [`config`] | [`BridgeConfig`] and environment loading |
//! | [`controller`] | [`Controller`], live cache, waiters, status |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | OSC messages, codec, address patterns |
//! | [`tools`] | Named tools, `bitwig://` resources, prompts |
//! | [`transport`] | UDP client and listener |

// ============================================================================
// Modules
// ============================================================================

/// Device browser navigation.
///
/// - [`BrowserNavigator`] - open, tab, filter, collect, commit, cancel
/// - [`BrowserSession`] - state of the current session
pub mod browser;

/// Bridge configuration.
pub mod config;

/// Request correlation and the live cache.
///
/// Use [`Controller::connect()`] to bind sockets and start listening.
pub mod controller;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// OSC message model and wire codec.
pub mod protocol;

/// Tool and resource facade.
pub mod tools;

/// UDP transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{
    BrowseContext, BrowserNavigator, BrowserSession, BrowserState, CollectedResult, FilterColumn,
    FilterItem, NavigatorOptions, ResultItem,
};

// Configuration
pub use config::{BridgeConfig, ConflictPolicy};

// Controller types
pub use controller::{Controller, ControllerStatus, LiveCache, OscEndpoint};

// Error types
pub use error::{Error, ErrorKind, Result};

// Identifier types
pub use identifiers::{HandlerId, WaiterId};

// Protocol types
pub use protocol::{AddressPattern, Message, OscType, address};

// Tool facade
pub use tools::{Prompt, Resource, ToolCall, ToolError, Tools};

// Transport types
pub use transport::{OscClient, OscListener};
