//! UDP transport layer.
//!
//! This module handles the two directions of traffic between the bridge and
//! the DAW's OSC controller script.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐        UDP :8000         ┌─────────────────┐
//! │  OscClient      │─────────────────────────►│                 │
//! │                 │                          │  Bitwig Studio  │
//! │  OscListener    │◄─────────────────────────│  (OSC script)   │
//! │  → handlers     │        UDP :9000         │                 │
//! └─────────────────┘                          └─────────────────┘
//! ```
//!
//! The two directions are independent: a reply is not tied to the datagram
//! that caused it.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `client` | Outbound datagrams |
//! | `listener` | Receive loop and handler dispatch |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound OSC over UDP.
pub mod client;

/// Inbound OSC over UDP.
pub mod listener;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::OscClient;
pub use listener::{ErrorObserver, MessageHandler, OscListener};
