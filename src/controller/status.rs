//! Connection health and error tallies.
//!
//! The controller feeds every inbound message, reply and failure into a
//! [`Diagnostics`] value; [`Controller::status`](super::Controller::status)
//! snapshots it as a [`ControllerStatus`].
//!
//! # Health
//!
//! The connection is considered unhealthy when the listener is stopped,
//! after more than [`MAX_CONSECUTIVE_TIMEOUTS`] timeouts in a row, or when
//! the last answered request is older than [`STALE_AFTER`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::Error;

// ============================================================================
// Constants
// ============================================================================

/// Timeouts in a row tolerated before the connection counts as unhealthy.
pub const MAX_CONSECUTIVE_TIMEOUTS: u64 = 3;

/// Age of the last answered request after which the connection counts as
/// unhealthy.
pub const STALE_AFTER: Duration = Duration::from_secs(10);

// ============================================================================
// ErrorCounts
// ============================================================================

/// Failures seen since the controller started, by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ErrorCounts {
    /// Datagrams dropped by the decoder.
    pub malformed: u64,
    /// Listener handlers that panicked.
    pub handler_panics: u64,
    /// Socket receive failures.
    pub receive: u64,
    /// Requests that got no reply in time.
    pub timeouts: u64,
    /// Requests rejected because the same pattern was in flight.
    pub conflicts: u64,
    /// Failed sends.
    pub send: u64,
    /// Anything else.
    pub other: u64,
}

impl ErrorCounts {
    /// Sum over all categories.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.malformed
            + self.handler_panics
            + self.receive
            + self.timeouts
            + self.conflicts
            + self.send
            + self.other
    }
}

// ============================================================================
// ControllerStatus
// ============================================================================

/// Point-in-time view of a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerStatus {
    /// Listener running.
    pub running: bool,
    /// See the module docs.
    pub healthy: bool,
    /// DAW address.
    pub target_addr: String,
    /// Local listen address.
    pub listen_addr: String,
    /// Requests awaiting a reply.
    pub pending: usize,
    /// Addresses in the live cache.
    pub cached: usize,
    /// Inbound messages since start.
    pub received: u64,
    /// Timeouts since the last answered request.
    pub consecutive_timeouts: u64,
    /// Milliseconds since the last answered request.
    pub last_success_ms: Option<u64>,
    /// Milliseconds since the last inbound message.
    pub last_inbound_ms: Option<u64>,
    /// Most recent failure.
    pub last_error: Option<String>,
    /// Failure tallies.
    pub errors: ErrorCounts,
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Counters shared between the controller and its listener handlers.
#[derive(Debug, Default)]
pub struct Diagnostics {
    malformed: AtomicU64,
    handler_panics: AtomicU64,
    receive: AtomicU64,
    timeouts: AtomicU64,
    conflicts: AtomicU64,
    send: AtomicU64,
    other: AtomicU64,
    consecutive_timeouts: AtomicU64,
    received: AtomicU64,
    last_success: Mutex<Option<Instant>>,
    last_inbound: Mutex<Option<Instant>>,
    last_error: Mutex<Option<String>>,
}

impl Diagnostics {
    /// Creates zeroed diagnostics.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one inbound message.
    pub fn record_inbound(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
        *self.last_inbound.lock() = Some(Instant::now());
    }

    /// Notes an answered request; clears the timeout streak.
    pub fn record_success(&self) {
        self.consecutive_timeouts.store(0, Ordering::Relaxed);
        *self.last_success.lock() = Some(Instant::now());
    }

    /// Tallies `error` under its category.
    pub fn record_error(&self, error: &Error) {
        let counter = match error {
            Error::MalformedMessage { .. } => &self.malformed,
            Error::HandlerPanicked { .. } => &self.handler_panics,
            Error::Io(_) => &self.receive,
            Error::ResponseTimeout { .. } => &self.timeouts,
            Error::ConcurrentRequestConflict { .. } => &self.conflicts,
            Error::Transport { .. } => &self.send,
            _ => &self.other,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if error.is_timeout() {
            self.consecutive_timeouts.fetch_add(1, Ordering::Relaxed);
        }
        *self.last_error.lock() = Some(error.to_string());
    }

    /// Snapshot of the tallies.
    #[must_use]
    pub fn counts(&self) -> ErrorCounts {
        ErrorCounts {
            malformed: self.malformed.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
            receive: self.receive.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            send: self.send.load(Ordering::Relaxed),
            other: self.other.load(Ordering::Relaxed),
        }
    }

    /// Timeouts since the last answered request.
    #[inline]
    #[must_use]
    pub fn consecutive_timeouts(&self) -> u64 {
        self.consecutive_timeouts.load(Ordering::Relaxed)
    }

    /// Inbound messages since start.
    #[inline]
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Time since the last answered request.
    #[must_use]
    pub fn since_last_success(&self) -> Option<Duration> {
        self.last_success.lock().map(|at| at.elapsed())
    }

    /// Time since the last inbound message.
    #[must_use]
    pub fn since_last_inbound(&self) -> Option<Duration> {
        self.last_inbound.lock().map(|at| at.elapsed())
    }

    /// Most recent failure, rendered.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Health ignoring listener state.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        if self.consecutive_timeouts() > MAX_CONSECUTIVE_TIMEOUTS {
            return false;
        }
        !self
            .since_last_success()
            .is_some_and(|age| age > STALE_AFTER)
    }

    /// Clears the tallies and the last error; timestamps are kept.
    pub fn clear_errors(&self) {
        for counter in [
            &self.malformed,
            &self.handler_panics,
            &self.receive,
            &self.timeouts,
            &self.conflicts,
            &self.send,
            &self.other,
            &self.consecutive_timeouts,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        *self.last_error.lock() = None;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_tallied_by_category() {
        let diagnostics = Diagnostics::new();
        diagnostics.record_error(&Error::malformed("bad tag"));
        diagnostics.record_error(&Error::malformed("short"));
        diagnostics.record_error(&Error::response_timeout("/tempo/raw", 100));
        diagnostics.record_error(&Error::BrowserNotOpen);

        let counts = diagnostics.counts();
        assert_eq!(counts.malformed, 2);
        assert_eq!(counts.timeouts, 1);
        assert_eq!(counts.other, 1);
        assert_eq!(counts.total(), 4);
        assert!(diagnostics.last_error().is_some());
    }

    #[test]
    fn test_timeout_streak_breaks_health() {
        let diagnostics = Diagnostics::new();
        assert!(diagnostics.is_healthy());

        for _ in 0..=MAX_CONSECUTIVE_TIMEOUTS {
            diagnostics.record_error(&Error::response_timeout("/browser/tab", 50));
        }
        assert!(!diagnostics.is_healthy());

        diagnostics.record_success();
        assert_eq!(diagnostics.consecutive_timeouts(), 0);
        assert!(diagnostics.is_healthy());
    }

    #[test]
    fn test_clear_errors() {
        let diagnostics = Diagnostics::new();
        diagnostics.record_inbound();
        diagnostics.record_error(&Error::transport("unreachable"));
        diagnostics.clear_errors();

        assert_eq!(diagnostics.counts(), ErrorCounts::default());
        assert_eq!(diagnostics.last_error(), None);
        assert_eq!(diagnostics.received(), 1);
    }
}
