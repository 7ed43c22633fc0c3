//! OSC protocol types.
//!
//! This module defines the wire format spoken with the DAW's controller
//! script and the address vocabulary used on top of it.
//!
//! # Protocol Overview
//!
//! | Direction | Transport | Content |
//! |-----------|-----------|---------|
//! | Bridge → DAW | UDP datagram | one encoded [`Message`] |
//! | DAW → Bridge | UDP datagram | one [`Message`] or a bundle of them |
//!
//! Replies carry no correlation token; they are matched back to requests by
//! address only, using [`AddressPattern`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `address` | Bitwig address families |
//! | `codec` | OSC 1.0 binary encode/decode |
//! | `message` | `Message` and `OscType` |
//! | `pattern` | Address matching |

// ============================================================================
// Submodules
// ============================================================================

/// Bitwig address families.
pub mod address;

/// OSC 1.0 binary codec.
pub mod codec;

/// Message and argument types.
pub mod message;

/// Address matching.
pub mod pattern;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::{MAX_DATAGRAM_SIZE, decode, decode_packet, encode, encode_bundle};
pub use message::{Message, OscType};
pub use pattern::AddressPattern;
