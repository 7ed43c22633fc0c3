//! Tab stepping.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::controller::OscEndpoint;
use crate::error::{Error, Result};
use crate::protocol::{AddressPattern, Message, address};

use super::BrowserNavigator;
use crate::browser::session::BrowserState;

// ============================================================================
// BrowserNavigator - Tabs
// ============================================================================

impl<E: OscEndpoint> BrowserNavigator<E> {
    /// Steps forward through the tabs until `/browser/tab` reports `name`.
    ///
    /// Returns the number of steps taken, 0 if already there.
    ///
    /// # Errors
    ///
    /// - [`Error::BrowserNotOpen`] if no session is open
    /// - [`Error::TabNotFound`] after `max_tab_steps` steps, or as soon as
    ///   the tabs wrap around to where stepping began
    pub async fn select_tab(&mut self, name: &str) -> Result<usize> {
        self.ensure_open()?;

        let start = self.cached_str(address::BROWSER_TAB);
        if start.as_deref() == Some(name) {
            self.session.current_tab = start;
            return Ok(0);
        }

        self.session.state = BrowserState::Navigating;
        let result = self.step_to_tab(name, start.as_deref()).await;
        self.finish_navigation(result)
    }

    async fn step_to_tab(&mut self, name: &str, start: Option<&str>) -> Result<usize> {
        let max_steps = self.options.max_tab_steps;

        for steps in 1..=max_steps {
            let reply = self
                .step(
                    Message::trigger(address::BROWSER_TAB_NEXT),
                    AddressPattern::exact(address::BROWSER_TAB),
                )
                .await?;

            let reported = reply.as_ref().and_then(Message::first_str);
            let tab = reported
                .map(str::to_string)
                .or_else(|| self.cached_str(address::BROWSER_TAB));
            debug!(steps, tab = ?tab, wanted = name, "Tab step");

            self.session.current_tab = tab.clone();
            if tab.as_deref() == Some(name) {
                return Ok(steps);
            }

            if reported.is_some() && reported == start {
                return Err(Error::tab_not_found(name, steps));
            }
        }

        Err(Error::tab_not_found(name, max_steps))
    }
}
