//! Stateful navigation of the DAW's device browser.
//!
//! Every step is a command followed by a wait for the DAW to report a
//! change. The DAW only reports values that changed, so a step that has no
//! visible effect produces no reply at all; such a timeout is treated as
//! "nothing changed", not as a failure.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `mod` | Navigator struct, open, commit, cancel |
//! | `tabs` | Tab stepping |
//! | `filters` | Filter column snapshot and selection |
//! | `results` | Result window reading and paginated collection |

// ============================================================================
// Submodules
// ============================================================================

mod filters;
mod results;
mod tabs;

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info, warn};

use crate::controller::OscEndpoint;
use crate::error::{Error, Result};
use crate::protocol::{AddressPattern, Message, address};

use super::options::NavigatorOptions;
use super::session::{BrowseContext, BrowserSession, BrowserState};

// ============================================================================
// BrowserNavigator
// ============================================================================

/// Drives one browse session against an [`OscEndpoint`].
///
/// # Example
///
/// ```ignore
/// let mut navigator = BrowserNavigator::new(controller.clone());
/// navigator.open(BrowseContext::Device).await?;
/// navigator.select_tab("Result").await?;
/// let results = navigator.collect_all_results().await?;
/// navigator.cancel().await?;
/// ```
#[derive(Debug)]
pub struct BrowserNavigator<E> {
    endpoint: E,
    options: NavigatorOptions,
    session: BrowserSession,
}

// ============================================================================
// Constructors And Accessors
// ============================================================================

impl<E: OscEndpoint> BrowserNavigator<E> {
    /// Creates a navigator with default options.
    #[must_use]
    pub fn new(endpoint: E) -> Self {
        Self {
            endpoint,
            options: NavigatorOptions::default(),
            session: BrowserSession::new(),
        }
    }

    /// Creates a navigator with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options fail
    /// [`NavigatorOptions::validate`].
    pub fn with_options(endpoint: E, options: NavigatorOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            endpoint,
            options,
            session: BrowserSession::new(),
        })
    }

    /// Returns the session state.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &BrowserSession {
        &self.session
    }

    /// Returns the options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &NavigatorOptions {
        &self.options
    }

    /// Returns the endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }
}

// ============================================================================
// Open / Commit / Cancel
// ============================================================================

impl<E: OscEndpoint> BrowserNavigator<E> {
    /// Opens the browser and waits for the DAW to confirm it is active.
    ///
    /// Does nothing if the session is already open.
    ///
    /// # Errors
    ///
    /// - [`Error::BrowserOpenTimeout`] if activation was never confirmed; the
    ///   session is reset to `Closed`
    /// - transport errors from the endpoint, also resetting the session
    pub async fn open(&mut self, context: BrowseContext) -> Result<()> {
        if self.session.is_open() {
            debug!(%context, "Browser already open");
            return Ok(());
        }

        self.session.reset();
        self.session.state = BrowserState::Opening;
        self.session.context = Some(context);

        let attempts = self.options.open_retries;
        let timeout = self.options.open_timeout;

        for attempt in 1..=attempts {
            let outcome = self
                .endpoint
                .send_and_wait(
                    Message::trigger(context.open_address()),
                    AddressPattern::exact(address::BROWSER_ACTIVE),
                    timeout,
                )
                .await;

            let active = match outcome {
                Ok(reply) => reply.first_bool() == Some(true),
                // Already-open browsers report nothing new.
                Err(e) if e.is_unknown_outcome() => self.cached_bool(address::BROWSER_ACTIVE),
                Err(e) => {
                    self.session.reset();
                    return Err(e);
                }
            };

            if active {
                self.settle().await;
                self.session.state = BrowserState::Open;
                self.session.current_tab = self.cached_str(address::BROWSER_TAB);
                self.refresh_filters();
                info!(%context, attempt, tab = ?self.session.current_tab, "Browser open");
                return Ok(());
            }

            debug!(%context, attempt, attempts, "Browser not active yet");
        }

        warn!(%context, attempts, "Browser did not open");
        self.session.reset();
        Err(Error::browser_open_timeout(
            attempts,
            timeout.as_millis() as u64,
        ))
    }

    /// Inserts the selected result and closes the session.
    ///
    /// The session is reset whether or not the send succeeds.
    ///
    /// # Errors
    ///
    /// - [`Error::BrowserNotOpen`] if no session is open
    /// - transport errors from the endpoint
    pub async fn commit(&mut self) -> Result<()> {
        self.close_with(BrowserState::Committing, address::BROWSER_COMMIT)
            .await
    }

    /// Closes the browser without inserting anything.
    ///
    /// The session is reset whether or not the send succeeds.
    ///
    /// # Errors
    ///
    /// - [`Error::BrowserNotOpen`] if no session is open
    /// - transport errors from the endpoint
    pub async fn cancel(&mut self) -> Result<()> {
        self.close_with(BrowserState::Cancelling, address::BROWSER_CANCEL)
            .await
    }

    async fn close_with(&mut self, state: BrowserState, command: &str) -> Result<()> {
        if self.session.state() == BrowserState::Closed {
            return Err(Error::BrowserNotOpen);
        }

        self.session.state = state;
        let _reset = SessionReset(&mut self.session);

        debug!(%state, "Closing browser");
        self.endpoint.fire_and_forget(Message::trigger(command)).await
    }
}

// ============================================================================
// Shared Helpers
// ============================================================================

impl<E: OscEndpoint> BrowserNavigator<E> {
    /// Sends one navigation command and waits for a reply matching `expect`.
    ///
    /// Returns `Ok(None)` if the DAW reported nothing within the step
    /// timeout.
    async fn step(&self, message: Message, expect: AddressPattern) -> Result<Option<Message>> {
        let command = message.address().to_string();
        match self
            .endpoint
            .send_and_wait(message, expect, self.options.step_timeout)
            .await
        {
            Ok(reply) => {
                self.settle().await;
                Ok(Some(reply))
            }
            Err(e) if e.is_unknown_outcome() => {
                debug!(%command, "Step produced no visible change");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Fails unless the session is open.
    fn ensure_open(&self) -> Result<()> {
        if self.session.is_open() {
            Ok(())
        } else {
            Err(Error::BrowserNotOpen)
        }
    }

    /// Marks the end of a navigation step, whatever its outcome.
    fn finish_navigation<T>(&mut self, result: Result<T>) -> Result<T> {
        self.session.state = BrowserState::Open;
        result
    }

    async fn settle(&self) {
        if !self.options.settle.is_zero() {
            tokio::time::sleep(self.options.settle).await;
        }
    }

    fn cached_bool(&self, address: &str) -> bool {
        self.endpoint
            .get_cached(address)
            .and_then(|message| message.first_bool())
            .unwrap_or(false)
    }

    fn cached_str(&self, address: &str) -> Option<String> {
        self.endpoint
            .get_cached(address)
            .and_then(|message| message.first_str().map(str::to_string))
            .filter(|value| !value.is_empty())
    }
}

// ============================================================================
// SessionReset
// ============================================================================

/// Resets the session on drop, covering errors and cancelled futures.
struct SessionReset<'a>(&'a mut BrowserSession);

impl Drop for SessionReset<'_> {
    fn drop(&mut self) {
        self.0.reset();
    }
}
