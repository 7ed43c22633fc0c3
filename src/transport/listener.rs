//! Inbound OSC over UDP and handler dispatch.
//!
//! # Receive Loop
//!
//! [`OscListener::start`] spawns one tokio task that:
//!
//! - Receives datagrams on the bound socket
//! - Decodes them (bundles are flattened)
//! - Invokes every handler whose pattern matches, in registration order
//!
//! Malformed datagrams and panicking handlers are logged and reported to the
//! error observer; neither stops the loop.
//!
//! # Shutdown
//!
//! [`OscListener::stop`] signals the task and awaits its `JoinHandle`. Once
//! it returns, no handler is running or will run until the next `start`.
//! Concurrent callers are serialized: each one returns only after the task
//! has exited.

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::net::SocketAddr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::net::UdpSocket;
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::HandlerId;
use crate::protocol::{AddressPattern, Message, decode_packet};

// ============================================================================
// Constants
// ============================================================================

/// Receive buffer size; large enough for any UDP payload.
const RECV_BUFFER_SIZE: usize = 65_536;

// ============================================================================
// Types
// ============================================================================

/// Callback invoked for each matching inbound message.
///
/// Runs on the receive task; it must not block.
pub type MessageHandler = Arc<dyn Fn(&Message) + Send + Sync>;

/// Callback receiving decode failures and handler panics.
pub type ErrorObserver = Arc<dyn Fn(&Error) + Send + Sync>;

/// A registered handler.
struct HandlerEntry {
    id: HandlerId,
    pattern: AddressPattern,
    handler: MessageHandler,
}

/// State shared between the listener handle and its receive task.
#[derive(Default)]
struct Shared {
    /// Handlers in registration order.
    handlers: RwLock<Vec<HandlerEntry>>,
    /// Optional error observer.
    observer: RwLock<Option<ErrorObserver>>,
}

impl Shared {
    fn report(&self, error: &Error) {
        let observer = self.observer.read().clone();
        if let Some(observer) = observer {
            let _ = catch_unwind(AssertUnwindSafe(|| observer(error)));
        }
    }
}

/// Handle to a running receive task.
struct RunningTask {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

// ============================================================================
// OscListener
// ============================================================================

/// Receives OSC datagrams and dispatches them to registered handlers.
///
/// # Thread Safety
///
/// All methods take `&self`; handlers may be registered and unregistered
/// from any task, including from inside a handler.
pub struct OscListener {
    /// Bound socket, kept across stop/start cycles.
    socket: Arc<UdpSocket>,
    /// Address the socket is bound to.
    local_addr: SocketAddr,
    /// Handlers and observer.
    shared: Arc<Shared>,
    /// Receive task, if running.
    running: Mutex<Option<RunningTask>>,
    /// Held for the whole of `stop`, across the join.
    stopping: AsyncMutex<()>,
}

impl OscListener {
    /// Binds the receive socket.
    ///
    /// Use port 0 to let the OS choose.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the address cannot be bound.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| Error::transport(format!("failed to bind {addr}: {e}")))?;
        let local_addr = socket.local_addr()?;

        debug!(%local_addr, "OSC listener bound");

        Ok(Self {
            socket: Arc::new(socket),
            local_addr,
            shared: Arc::new(Shared::default()),
            running: Mutex::new(None),
            stopping: AsyncMutex::new(()),
        })
    }

    /// Returns the bound address.
    #[inline]
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns `true` while the receive task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Starts the receive task. Does nothing if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut running = self.running.lock();
        if running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
        {
            return;
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(Self::run_receive_loop(
            Arc::clone(&self.socket),
            Arc::clone(&self.shared),
            shutdown_rx,
        ));

        *running = Some(RunningTask { shutdown_tx, task });
        info!(local_addr = %self.local_addr, "OSC listener started");
    }

    /// Stops the receive task and waits for it to finish.
    ///
    /// After this returns no handler is executing, even when several tasks
    /// call it at once. Calling it on a stopped listener is a no-op.
    pub async fn stop(&self) {
        let _stopping = self.stopping.lock().await;

        let Some(running) = self.running.lock().take() else {
            return;
        };

        let _ = running.shutdown_tx.send(());
        if let Err(e) = running.task.await {
            warn!(error = %e, "OSC receive task ended abnormally");
        }

        info!(local_addr = %self.local_addr, "OSC listener stopped");
    }

    /// Registers a handler for messages matching `pattern`.
    ///
    /// Takes effect for the next dispatched datagram.
    pub fn register_handler<F>(&self, pattern: AddressPattern, handler: F) -> HandlerId
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let id = HandlerId::generate();
        debug!(%id, %pattern, "Handler registered");

        self.shared.handlers.write().push(HandlerEntry {
            id,
            pattern,
            handler: Arc::new(handler),
        });
        id
    }

    /// Removes a handler. Returns `false` if it was not registered.
    pub fn unregister_handler(&self, id: HandlerId) -> bool {
        let mut handlers = self.shared.handlers.write();
        let before = handlers.len();
        handlers.retain(|entry| entry.id != id);
        before != handlers.len()
    }

    /// Returns the number of registered handlers.
    #[inline]
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.shared.handlers.read().len()
    }

    /// Sets the observer for decode failures and handler panics.
    pub fn set_error_observer<F>(&self, observer: F)
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        *self.shared.observer.write() = Some(Arc::new(observer));
    }

    /// Clears the error observer.
    pub fn clear_error_observer(&self) {
        *self.shared.observer.write() = None;
    }

    /// Receive loop run by the spawned task.
    async fn run_receive_loop(
        socket: Arc<UdpSocket>,
        shared: Arc<Shared>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => {
                    debug!("Shutdown signal received");
                    break;
                }

                received = socket.recv_from(&mut buf) => {
                    match received {
                        Ok((len, peer)) => Self::handle_datagram(&buf[..len], peer, &shared),

                        // Windows reports ICMP unreachable as a receive error.
                        Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => {
                            trace!("Ignoring connection reset on UDP socket");
                        }

                        Err(e) => {
                            warn!(error = %e, "OSC receive failed");
                            shared.report(&Error::Io(e));
                        }
                    }
                }
            }
        }

        debug!("Receive loop terminated");
    }

    /// Decodes one datagram and dispatches its messages.
    fn handle_datagram(bytes: &[u8], peer: SocketAddr, shared: &Shared) {
        let messages = match decode_packet(bytes) {
            Ok(messages) => messages,
            Err(e) => {
                warn!(%peer, len = bytes.len(), error = %e, "Dropping malformed datagram");
                shared.report(&e);
                return;
            }
        };

        for message in &messages {
            trace!(%peer, %message, "OSC received");
            Self::dispatch(message, shared);
        }
    }

    /// Invokes every matching handler, isolating panics.
    fn dispatch(message: &Message, shared: &Shared) {
        // Snapshot so handlers can (un)register without deadlocking.
        let matching: Vec<(HandlerId, MessageHandler)> = shared
            .handlers
            .read()
            .iter()
            .filter(|entry| entry.pattern.matches(message.address()))
            .map(|entry| (entry.id, Arc::clone(&entry.handler)))
            .collect();

        for (id, handler) in matching {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler(message))) {
                let reason = panic_message(payload.as_ref());
                warn!(handler_id = %id, address = %message.address(), %reason, "Handler panicked");
                shared.report(&Error::handler_panicked(id, message.address(), reason));
            }
        }
    }
}

impl Drop for OscListener {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            let _ = running.shutdown_tx.send(());
            running.task.abort();
        }
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
