//! Controller: correlates outbound commands with uncorrelated replies.
//!
//! # Request Lifecycle
//!
//! ```text
//! send_and_wait(msg, expect, timeout)
//!   1. register waiter for `expect` (before sending, so a fast reply is seen)
//!   2. send msg
//!   3. await reply or deadline
//!   4. waiter removed on every exit path
//! ```
//!
//! Every inbound message updates the live cache first, then completes the
//! waiters it matches. A caller that gets a reply therefore also sees it in
//! [`Controller::get_cached`].

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info};

use crate::config::{BridgeConfig, ConflictPolicy};
use crate::error::{Error, Result};
use crate::identifiers::{HandlerId, WaiterId};
use crate::protocol::{AddressPattern, Message, address};
use crate::transport::{OscClient, OscListener};

use super::cache::{CacheEntry, LiveCache};
use super::endpoint::OscEndpoint;
use super::status::{ControllerStatus, Diagnostics};
use super::waiter::{ReplyReceiver, WaiterGuard, WaiterTable};

// ============================================================================
// ControllerInner
// ============================================================================

struct ControllerInner {
    client: OscClient,
    listener: OscListener,
    cache: Arc<LiveCache>,
    waiters: Arc<WaiterTable>,
    diagnostics: Arc<Diagnostics>,
    config: BridgeConfig,
    handler_id: HandlerId,
}

// ============================================================================
// Controller
// ============================================================================

/// Owns one client, one listener, the live cache and the waiter table.
///
/// Cloning is cheap; clones share everything.
///
/// # Example
///
/// ```ignore
/// let controller = Controller::connect(BridgeConfig::from_env()?).await?;
/// let tempo = controller.refresh("/tempo/raw", Duration::from_secs(1)).await?;
/// controller.fire_and_forget(Message::trigger("/play")).await?;
/// ```
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("target", &self.inner.client.target())
            .field("listen", &self.inner.listener.local_addr())
            .field("pending", &self.inner.waiters.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl Controller {
    /// Binds client and listener from `config` and starts listening.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the configuration is invalid
    /// - [`Error::Transport`] if a socket cannot be bound
    pub async fn connect(config: BridgeConfig) -> Result<Self> {
        config.validate()?;

        let client = OscClient::bind(config.send_addr()).await?;
        let listener = OscListener::bind(config.receive_addr()).await?;

        Ok(Self::from_parts(client, listener, config))
    }

    /// Assembles a controller from already bound parts and starts the
    /// listener.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn from_parts(client: OscClient, listener: OscListener, config: BridgeConfig) -> Self {
        let cache = Arc::new(LiveCache::new());
        let waiters = Arc::new(WaiterTable::new());
        let diagnostics = Arc::new(Diagnostics::new());

        let handler_id = {
            let cache = Arc::clone(&cache);
            let waiters = Arc::clone(&waiters);
            let diagnostics = Arc::clone(&diagnostics);
            listener.register_handler(AddressPattern::Any, move |message| {
                diagnostics.record_inbound();
                cache.record(message);
                waiters.fulfill(message);
            })
        };
        {
            let diagnostics = Arc::clone(&diagnostics);
            listener.set_error_observer(move |error| diagnostics.record_error(error));
        }
        listener.start();

        info!(
            target_addr = %client.target(),
            listen_addr = %listener.local_addr(),
            "Controller started"
        );

        Self {
            inner: Arc::new(ControllerInner {
                client,
                listener,
                cache,
                waiters,
                diagnostics,
                config,
                handler_id,
            }),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

impl Controller {
    /// Sends `message` and waits for the first inbound message matching
    /// `expect`.
    ///
    /// # Errors
    ///
    /// - [`Error::ListenerStopped`] if the listener is not running, or stops
    ///   while waiting; a request racing [`Controller::shutdown`] gets this
    ///   too rather than waiting out its timeout
    /// - [`Error::ChannelClosed`] if the reply channel is dropped unanswered
    /// - [`Error::ConcurrentRequestConflict`] if a waiter for `expect` is
    ///   pending and the policy is [`ConflictPolicy::Reject`]
    /// - [`Error::Transport`] if the send fails
    /// - [`Error::ResponseTimeout`] if nothing matched before the deadline;
    ///   the command may still have been applied
    pub async fn send_and_wait(
        &self,
        message: Message,
        expect: AddressPattern,
        timeout: Duration,
    ) -> Result<Message> {
        let result = self.exchange(message, expect, timeout).await;
        match &result {
            Ok(_) => self.inner.diagnostics.record_success(),
            Err(e) => self.inner.diagnostics.record_error(e),
        }
        result
    }

    async fn exchange(
        &self,
        message: Message,
        expect: AddressPattern,
        timeout: Duration,
    ) -> Result<Message> {
        if !self.inner.listener.is_running() {
            return Err(Error::ListenerStopped);
        }

        let deadline = Instant::now() + timeout;
        let timeout_ms = timeout.as_millis() as u64;

        let (id, reply_rx) = self.register_waiter(&expect, deadline, timeout_ms).await?;
        let _guard = WaiterGuard::new(&self.inner.waiters, &expect, id);

        self.inner.client.send(&message).await?;
        debug!(%id, address = %message.address(), %expect, timeout_ms, "Awaiting reply");

        match timeout_at(deadline, reply_rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(closed)) => Err(closed.into()),
            Err(_) => {
                debug!(%id, %expect, timeout_ms, "Reply timed out");
                Err(Error::response_timeout(expect.to_string(), timeout_ms))
            }
        }
    }

    /// Sends `message` without waiting for a reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the send fails.
    pub async fn fire_and_forget(&self, message: Message) -> Result<()> {
        debug!(address = %message.address(), "Fire and forget");
        let result = self.inner.client.send(&message).await;
        if let Err(e) = &result {
            self.inner.diagnostics.record_error(e);
        }
        result
    }

    /// Queries `address` with a no-argument message and waits for the DAW to
    /// report it.
    ///
    /// # Errors
    ///
    /// Same as [`Controller::send_and_wait`].
    pub async fn refresh(&self, address: &str, timeout: Duration) -> Result<Message> {
        self.send_and_wait(
            Message::bare(address),
            AddressPattern::exact(address),
            timeout,
        )
        .await
    }

    /// Asks the DAW to re-send its whole state and waits for the first
    /// message to arrive.
    ///
    /// # Errors
    ///
    /// Same as [`Controller::send_and_wait`].
    pub async fn refresh_all(&self, timeout: Duration) -> Result<Message> {
        self.send_and_wait(
            Message::trigger(address::REFRESH),
            AddressPattern::Any,
            timeout,
        )
        .await
    }

    /// Returns `true` if the DAW answers a refresh within `timeout`.
    pub async fn ping(&self, timeout: Duration) -> bool {
        self.refresh_all(timeout).await.is_ok()
    }

    async fn register_waiter(
        &self,
        expect: &AddressPattern,
        deadline: Instant,
        timeout_ms: u64,
    ) -> Result<(WaiterId, ReplyReceiver)> {
        let waiters = &self.inner.waiters;

        match self.inner.config.conflict_policy {
            ConflictPolicy::Reject => waiters
                .try_register(expect)?
                .ok_or_else(|| Error::concurrent_request_conflict(expect.to_string())),

            ConflictPolicy::Queue => loop {
                let released = waiters.released().notified();
                if let Some(registered) = waiters.try_register(expect)? {
                    return Ok(registered);
                }
                debug!(%expect, "Queued behind in-flight request");
                if timeout_at(deadline, released).await.is_err() {
                    return Err(Error::response_timeout(expect.to_string(), timeout_ms));
                }
            },
        }
    }
}

// ============================================================================
// Cache Access
// ============================================================================

impl Controller {
    /// Returns the latest message received for `address`.
    #[must_use]
    pub fn get_cached(&self, address: &str) -> Option<Message> {
        self.inner.cache.get(address)
    }

    /// Returns the latest entry for `address`, with its arrival time.
    #[must_use]
    pub fn cached_entry(&self, address: &str) -> Option<CacheEntry> {
        self.inner.cache.entry(address)
    }

    /// Snapshots every cached message under `prefix`, sorted by address.
    #[must_use]
    pub fn cached_with_prefix(&self, prefix: &str) -> Vec<Message> {
        self.inner.cache.with_prefix(prefix)
    }

    /// Returns the number of cached addresses.
    #[inline]
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.inner.cache.len()
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

impl Controller {
    /// Returns the number of pending waiters.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.waiters.len()
    }

    /// Returns the configuration the controller was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Returns the address the listener is bound to.
    #[inline]
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        self.inner.listener.local_addr()
    }

    /// Returns the DAW address.
    #[inline]
    #[must_use]
    pub fn target_addr(&self) -> SocketAddr {
        self.inner.client.target()
    }

    /// Returns `true` while the listener is running.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.listener.is_running()
    }

    /// Snapshots connection health and error tallies.
    #[must_use]
    pub fn status(&self) -> ControllerStatus {
        let diagnostics = &self.inner.diagnostics;
        let running = self.is_running();
        ControllerStatus {
            running,
            healthy: running && diagnostics.is_healthy(),
            target_addr: self.target_addr().to_string(),
            listen_addr: self.listen_addr().to_string(),
            pending: self.pending_count(),
            cached: self.cache_len(),
            received: diagnostics.received(),
            consecutive_timeouts: diagnostics.consecutive_timeouts(),
            last_success_ms: diagnostics
                .since_last_success()
                .map(|age| age.as_millis() as u64),
            last_inbound_ms: diagnostics
                .since_last_inbound()
                .map(|age| age.as_millis() as u64),
            last_error: diagnostics.last_error(),
            errors: diagnostics.counts(),
        }
    }

    /// Returns `true` while running with no sign of a lost connection.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.is_running() && self.inner.diagnostics.is_healthy()
    }

    /// Resets the error tallies reported by [`Controller::status`].
    pub fn clear_errors(&self) {
        self.inner.diagnostics.clear_errors();
    }

    /// Stops the listener and fails every pending waiter with
    /// [`Error::ListenerStopped`].
    ///
    /// Affects all clones.
    pub async fn shutdown(&self) {
        self.inner.listener.stop().await;
        self.inner.waiters.fail_all();
        info!(handler_id = %self.inner.handler_id, "Controller shut down");
    }
}

// ============================================================================
// OscEndpoint
// ============================================================================

#[async_trait]
impl OscEndpoint for Controller {
    async fn fire_and_forget(&self, message: Message) -> Result<()> {
        Controller::fire_and_forget(self, message).await
    }

    async fn send_and_wait(
        &self,
        message: Message,
        expect: AddressPattern,
        timeout: Duration,
    ) -> Result<Message> {
        Controller::send_and_wait(self, message, expect, timeout).await
    }

    fn get_cached(&self, address: &str) -> Option<Message> {
        Controller::get_cached(self, address)
    }

    fn default_timeout(&self) -> Duration {
        self.inner.config.response_timeout
    }

    fn status(&self) -> Option<ControllerStatus> {
        Some(Controller::status(self))
    }
}

// ============================================================================
// Tests
// ============================================================================
