//! Error types for the Bitwig OSC bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use bitwig_osc_bridge::{AddressPattern, Message, Result};
//!
//! async fn tempo(controller: &Controller) -> Result<f64> {
//!     let reply = controller.refresh("/tempo/raw", Duration::from_secs(2)).await?;
//!     Ok(reply.first_f64().unwrap_or_default())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Input | [`Error::Config`], [`Error::InvalidArgument`] |
//! | Wire | [`Error::MalformedMessage`], [`Error::HandlerPanicked`] |
//! | Transport | [`Error::Transport`], [`Error::ListenerStopped`], [`Error::Io`] |
//! | Correlation | [`Error::ResponseTimeout`], [`Error::ConcurrentRequestConflict`] |
//! | Browser | [`Error::BrowserOpenTimeout`], [`Error::BrowserNotOpen`], [`Error::TabNotFound`], [`Error::FilterItemNotFound`] |
//! | Lookup | [`Error::ResourceNotFound`] |
//! | External | [`Error::Json`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

use crate::identifiers::HandlerId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when bridge configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument supplied by the caller.
    ///
    /// Returned when a tool argument is missing, mistyped or out of range.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Wire Errors
    // ========================================================================
    /// Datagram does not follow OSC framing.
    ///
    /// Inbound datagrams failing to decode are dropped by the listener.
    #[error("Malformed OSC message: {message}")]
    MalformedMessage {
        /// Description of the framing violation.
        message: String,
    },

    /// A registered message handler panicked during dispatch.
    ///
    /// Reported to the listener's error observer; never returned to callers.
    #[error("Handler {handler_id} panicked on {address}: {message}")]
    HandlerPanicked {
        /// The handler that panicked.
        handler_id: HandlerId,
        /// Address of the message being dispatched.
        address: String,
        /// Panic payload, if it was a string.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Local send or bind failure.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The listener is not running, so no reply can ever arrive.
    #[error("Listener stopped")]
    ListenerStopped,

    // ========================================================================
    // Correlation Errors
    // ========================================================================
    /// No matching reply within the deadline.
    ///
    /// The outcome of the command is unknown: it may have been applied by
    /// the DAW without producing an observable reply.
    #[error("No reply matching {pattern} within {timeout_ms}ms")]
    ResponseTimeout {
        /// Pattern the waiter was registered for.
        pattern: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// A waiter is already registered for this pattern.
    #[error("Request already in flight for {pattern}")]
    ConcurrentRequestConflict {
        /// Pattern with the in-flight waiter.
        pattern: String,
    },

    // ========================================================================
    // Browser Errors
    // ========================================================================
    /// The DAW never confirmed that the browser became active.
    #[error("Browser did not open after {attempts} attempts ({timeout_ms}ms each)")]
    BrowserOpenTimeout {
        /// Number of open commands sent.
        attempts: u32,
        /// Milliseconds waited per attempt.
        timeout_ms: u64,
    },

    /// A navigation step was requested without an open browser session.
    #[error("Browser is not open")]
    BrowserNotOpen,

    /// Tab stepping never reached the requested tab.
    #[error("Browser tab not found: {tab} (after {steps} steps)")]
    TabNotFound {
        /// Requested tab name.
        tab: String,
        /// Steps taken before giving up.
        steps: usize,
    },

    /// Filter item is not among the visible items of the column.
    #[error("Filter item not found: {item} in column {column}")]
    FilterItemNotFound {
        /// 1-based filter column index.
        column: usize,
        /// Requested item name.
        item: String,
    },

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// A track, device or resource does not exist.
    #[error("{resource} not found: {identifier}")]
    ResourceNotFound {
        /// Kind of resource ("Track", "Device", ...).
        resource: String,
        /// Identifier that was looked up.
        identifier: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// ErrorKind
// ============================================================================

/// Coarse error classification exposed to tool callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller supplied bad input.
    BadInput,
    /// Talking to the DAW failed or gave no answer.
    Communication,
    /// The addressed target does not exist.
    NotFound,
    /// The operation is not valid in the current session state.
    State,
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a malformed message error.
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage {
            message: message.into(),
        }
    }

    /// Creates a handler panicked error.
    #[inline]
    pub fn handler_panicked(
        handler_id: HandlerId,
        address: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::HandlerPanicked {
            handler_id,
            address: address.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a response timeout error.
    #[inline]
    pub fn response_timeout(pattern: impl Into<String>, timeout_ms: u64) -> Self {
        Self::ResponseTimeout {
            pattern: pattern.into(),
            timeout_ms,
        }
    }

    /// Creates a concurrent request conflict error.
    #[inline]
    pub fn concurrent_request_conflict(pattern: impl Into<String>) -> Self {
        Self::ConcurrentRequestConflict {
            pattern: pattern.into(),
        }
    }

    /// Creates a browser open timeout error.
    #[inline]
    pub fn browser_open_timeout(attempts: u32, timeout_ms: u64) -> Self {
        Self::BrowserOpenTimeout {
            attempts,
            timeout_ms,
        }
    }

    /// Creates a tab not found error.
    #[inline]
    pub fn tab_not_found(tab: impl Into<String>, steps: usize) -> Self {
        Self::TabNotFound {
            tab: tab.into(),
            steps,
        }
    }

    /// Creates a filter item not found error.
    #[inline]
    pub fn filter_item_not_found(column: usize, item: impl Into<String>) -> Self {
        Self::FilterItemNotFound {
            column,
            item: item.into(),
        }
    }

    /// Creates a resource not found error.
    #[inline]
    pub fn resource_not_found(resource: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource: resource.into(),
            identifier: identifier.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ResponseTimeout { .. } | Self::BrowserOpenTimeout { .. }
        )
    }

    /// Returns `true` if the command may or may not have been applied.
    ///
    /// A response timeout means the DAW stayed silent, not that it refused.
    #[inline]
    #[must_use]
    pub fn is_unknown_outcome(&self) -> bool {
        matches!(self, Self::ResponseTimeout { .. })
    }

    /// Returns `true` if this is a transport-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::ListenerStopped | Self::Io(_) | Self::ChannelClosed(_)
        )
    }

    /// Returns `true` if this is a browser navigation error.
    #[inline]
    #[must_use]
    pub fn is_browser_error(&self) -> bool {
        matches!(
            self,
            Self::BrowserOpenTimeout { .. }
                | Self::BrowserNotOpen
                | Self::TabNotFound { .. }
                | Self::FilterItemNotFound { .. }
        )
    }

    /// Classifies the error for tool callers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } | Self::InvalidArgument { .. } => ErrorKind::BadInput,
            Self::ResourceNotFound { .. }
            | Self::TabNotFound { .. }
            | Self::FilterItemNotFound { .. } => ErrorKind::NotFound,
            Self::BrowserNotOpen | Self::ConcurrentRequestConflict { .. } => ErrorKind::State,
            Self::MalformedMessage { .. }
            | Self::HandlerPanicked { .. }
            | Self::Transport { .. }
            | Self::ListenerStopped
            | Self::ResponseTimeout { .. }
            | Self::BrowserOpenTimeout { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::ChannelClosed(_) => ErrorKind::Communication,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
