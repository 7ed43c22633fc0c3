//! Live cache of the most recent message per address.
//!
//! The DAW pushes state changes unprompted, so the cache fills up without
//! any request being made. Entries are overwritten, never invalidated: a
//! value can be stale if the DAW stopped reporting it.

// ============================================================================
// Imports
// ============================================================================

use std::time::Instant;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::protocol::Message;

// ============================================================================
// CacheEntry
// ============================================================================

/// Last message seen for one address.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The message as received.
    pub message: Message,
    /// When it was received.
    pub received_at: Instant,
}

impl CacheEntry {
    /// Returns how long ago the message arrived.
    #[inline]
    #[must_use]
    pub fn age(&self) -> std::time::Duration {
        self.received_at.elapsed()
    }
}

// ============================================================================
// LiveCache
// ============================================================================

/// Address-keyed map of the latest inbound messages.
#[derive(Debug, Default)]
pub struct LiveCache {
    entries: RwLock<FxHashMap<String, CacheEntry>>,
}

impl LiveCache {
    /// Creates an empty cache.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `message` as the latest value for its address.
    pub fn record(&self, message: &Message) {
        let entry = CacheEntry {
            message: message.clone(),
            received_at: Instant::now(),
        };
        self.entries
            .write()
            .insert(message.address().to_string(), entry);
    }

    /// Returns the latest message for `address`.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<Message> {
        self.entries
            .read()
            .get(address)
            .map(|entry| entry.message.clone())
    }

    /// Returns the latest entry, including its arrival time.
    #[must_use]
    pub fn entry(&self, address: &str) -> Option<CacheEntry> {
        self.entries.read().get(address).cloned()
    }

    /// Snapshots all messages whose address starts with `prefix`, sorted by
    /// address.
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .entries
            .read()
            .iter()
            .filter(|(address, _)| address.starts_with(prefix))
            .map(|(_, entry)| entry.message.clone())
            .collect();
        messages.sort_by(|a, b| a.address().cmp(b.address()));
        messages
    }

    /// Returns the number of cached addresses.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing has been received yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
