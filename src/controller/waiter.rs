//! Pending reply waiters.
//!
//! At most one waiter exists per [`AddressPattern`]. A waiter is consumed
//! exactly once: by the first matching inbound message, by its owner timing
//! out or being dropped, or by shutdown. Once [`WaiterTable::fail_all`] has
//! run the table stays closed and refuses new waiters.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::{Notify, oneshot};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::WaiterId;
use crate::protocol::{AddressPattern, Message};

// ============================================================================
// Types
// ============================================================================

/// Channel a waiter is completed through.
pub type ReplySender = oneshot::Sender<Result<Message>>;

/// Receiving side handed to the caller.
pub type ReplyReceiver = oneshot::Receiver<Result<Message>>;

// ============================================================================
// PendingWaiter
// ============================================================================

/// One outstanding expectation of a reply.
#[derive(Debug)]
pub struct PendingWaiter {
    /// Sequential identity within the owning table.
    pub id: WaiterId,
    /// When the waiter was registered.
    pub created_at: Instant,
    /// Completion channel.
    reply_tx: ReplySender,
}

// ============================================================================
// WaiterTable
// ============================================================================

/// All pending waiters of one controller.
#[derive(Debug, Default)]
pub struct WaiterTable {
    next_id: AtomicU64,
    /// Set by `fail_all` while the waiter lock is held.
    closed: AtomicBool,
    waiters: Mutex<FxHashMap<AddressPattern, PendingWaiter>>,
    released: Notify,
}

impl WaiterTable {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter for `pattern`.
    ///
    /// Returns `Ok(None)` if a waiter for the same pattern is already pending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ListenerStopped`] once the table has been closed by
    /// [`WaiterTable::fail_all`].
    pub fn try_register(
        &self,
        pattern: &AddressPattern,
    ) -> Result<Option<(WaiterId, ReplyReceiver)>> {
        let mut waiters = self.waiters.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::ListenerStopped);
        }
        if waiters.contains_key(pattern) {
            return Ok(None);
        }

        let id = WaiterId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (reply_tx, reply_rx) = oneshot::channel();
        waiters.insert(
            pattern.clone(),
            PendingWaiter {
                id,
                created_at: Instant::now(),
                reply_tx,
            },
        );

        trace!(%id, %pattern, "Waiter registered");
        Ok(Some((id, reply_rx)))
    }

    /// Completes every waiter whose pattern matches `message`.
    ///
    /// Returns the number of waiters completed.
    pub fn fulfill(&self, message: &Message) -> usize {
        let matched: Vec<(AddressPattern, PendingWaiter)> = {
            let mut waiters = self.waiters.lock();
            if waiters.is_empty() {
                return 0;
            }
            let keys: Vec<AddressPattern> = waiters
                .keys()
                .filter(|pattern| pattern.matches(message.address()))
                .cloned()
                .collect();
            keys.into_iter()
                .filter_map(|key| waiters.remove_entry(&key))
                .collect()
        };

        let count = matched.len();
        for (pattern, waiter) in matched {
            debug!(
                id = %waiter.id,
                %pattern,
                address = %message.address(),
                elapsed_ms = waiter.created_at.elapsed().as_millis() as u64,
                "Waiter fulfilled"
            );
            let _ = waiter.reply_tx.send(Ok(message.clone()));
        }

        if count > 0 {
            self.released.notify_waiters();
        }
        count
    }

    /// Removes the waiter for `pattern` if it is still the one with `id`.
    pub fn remove(&self, pattern: &AddressPattern, id: WaiterId) -> bool {
        let removed = {
            let mut waiters = self.waiters.lock();
            match waiters.get(pattern) {
                Some(waiter) if waiter.id == id => waiters.remove(pattern).is_some(),
                _ => false,
            }
        };

        if removed {
            trace!(%id, %pattern, "Waiter removed");
            self.released.notify_waiters();
        }
        removed
    }

    /// Fails every pending waiter with [`Error::ListenerStopped`] and closes
    /// the table.
    pub fn fail_all(&self) -> usize {
        let drained: Vec<PendingWaiter> = {
            let mut waiters = self.waiters.lock();
            self.closed.store(true, Ordering::Release);
            waiters.drain().map(|(_, w)| w).collect()
        };
        let count = drained.len();

        for waiter in drained {
            let _ = waiter.reply_tx.send(Err(Error::ListenerStopped));
        }

        if count > 0 {
            debug!(count, "Failed pending waiters");
        }
        self.released.notify_waiters();
        count
    }

    /// Returns `true` once [`WaiterTable::fail_all`] has run.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns `true` if a waiter for `pattern` is pending.
    #[must_use]
    pub fn is_pending(&self, pattern: &AddressPattern) -> bool {
        self.waiters.lock().contains_key(pattern)
    }

    /// Returns the number of pending waiters.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    /// Returns `true` if no waiter is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiters.lock().is_empty()
    }

    /// Notification fired whenever a waiter leaves the table.
    #[inline]
    pub(crate) fn released(&self) -> &Notify {
        &self.released
    }
}

// ============================================================================
// WaiterGuard
// ============================================================================

/// Removes a waiter when the owning request ends, however it ends.
pub(crate) struct WaiterGuard<'a> {
    table: &'a WaiterTable,
    pattern: &'a AddressPattern,
    id: WaiterId,
}

impl<'a> WaiterGuard<'a> {
    pub(crate) fn new(table: &'a WaiterTable, pattern: &'a AddressPattern, id: WaiterId) -> Self {
        Self { table, pattern, id }
    }
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.table.remove(self.pattern, self.id);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn register(table: &WaiterTable, pattern: &AddressPattern) -> (WaiterId, ReplyReceiver) {
        table
            .try_register(pattern)
            .expect("table open")
            .expect("slot free")
    }

    #[test]
    fn test_one_waiter_per_pattern() {
        let table = WaiterTable::new();
        let pattern = AddressPattern::exact("/browser/isActive");

        let first = table.try_register(&pattern).expect("open");
        assert!(first.is_some());
        assert!(table.try_register(&pattern).expect("open").is_none());
        assert!(
            table
                .try_register(&AddressPattern::exact("/browser/tab"))
                .expect("open")
                .is_some()
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_fulfill_only_matching() {
        let table = WaiterTable::new();
        let (_, mut tab_rx) = register(&table, &AddressPattern::exact("/browser/tab"));
        let (_, mut result_rx) = register(&table, &AddressPattern::prefix("/browser/result/"));

        let completed = table.fulfill(&Message::with_value("/browser/result/1/name", "EQ+"));
        assert_eq!(completed, 1);

        let reply = result_rx.try_recv().expect("completed").expect("ok");
        assert_eq!(reply.first_str(), Some("EQ+"));
        assert!(tab_rx.try_recv().is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_waiter_consumed_once() {
        let table = WaiterTable::new();
        let pattern = AddressPattern::exact("/tempo/raw");
        let (_, _rx) = register(&table, &pattern);

        assert_eq!(table.fulfill(&Message::with_value("/tempo/raw", 120_i32)), 1);
        assert_eq!(table.fulfill(&Message::with_value("/tempo/raw", 121_i32)), 0);
    }

    #[test]
    fn test_stale_remove_keeps_newer_waiter() {
        let table = WaiterTable::new();
        let pattern = AddressPattern::exact("/play");
        let (old_id, _old_rx) = register(&table, &pattern);
        assert!(table.remove(&pattern, old_id));

        let (new_id, _new_rx) = register(&table, &pattern);
        assert_ne!(old_id, new_id);
        assert!(!table.remove(&pattern, old_id));
        assert!(table.is_pending(&pattern));
    }

    #[test]
    fn test_guard_removes_on_drop() {
        let table = WaiterTable::new();
        let pattern = AddressPattern::Any;
        let (id, _rx) = register(&table, &pattern);
        {
            let _guard = WaiterGuard::new(&table, &pattern, id);
        }
        assert!(table.is_empty());
    }

    #[test]
    fn test_fail_all_reports_listener_stopped() {
        let table = WaiterTable::new();
        let (_, mut rx) = register(&table, &AddressPattern::Any);

        assert_eq!(table.fail_all(), 1);
        let result = rx.try_recv().expect("completed");
        assert!(matches!(result, Err(Error::ListenerStopped)));
    }

    #[test]
    fn test_closed_table_refuses_new_waiters() {
        let table = WaiterTable::new();
        table.fail_all();

        assert!(table.is_closed());
        let err = table.try_register(&AddressPattern::exact("/tempo/raw")).unwrap_err();
        assert!(matches!(err, Error::ListenerStopped));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_table_closes_reply_channel() {
        let table = WaiterTable::new();
        let (_, rx) = register(&table, &AddressPattern::Any);
        drop(table);

        let err = Error::from(rx.await.unwrap_err());
        assert!(matches!(err, Error::ChannelClosed(_)));
        assert!(err.is_connection_error());
    }
}
