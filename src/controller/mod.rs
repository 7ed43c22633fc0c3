//! Request/reply correlation over the OSC transport.
//!
//! The DAW's replies carry no request token; they are matched back to the
//! caller by address pattern only. This module rebuilds "query and await an
//! answer" on top of that, and keeps a live cache of every value the DAW
//! reports.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `cache` | Latest message per address |
//! | `core` | `Controller` |
//! | `endpoint` | `OscEndpoint` trait |
//! | `status` | Health and error tallies |
//! | `waiter` | Pending reply waiters |

// ============================================================================
// Submodules
// ============================================================================

/// Latest message per address.
pub mod cache;

/// The controller.
pub mod core;

/// Request surface shared by controller and test doubles.
pub mod endpoint;

/// Connection health and error tallies.
pub mod status;

/// Pending reply waiters.
pub mod waiter;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::Controller;
pub use cache::{CacheEntry, LiveCache};
pub use endpoint::OscEndpoint;
pub use status::{ControllerStatus, Diagnostics, ErrorCounts};
pub use waiter::{PendingWaiter, WaiterTable};
