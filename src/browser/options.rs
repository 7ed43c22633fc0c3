//! Navigator tuning.
//!
//! # Example
//!
//! ```ignore
//! let options = NavigatorOptions::new()
//!     .with_max_pages(20)
//!     .with_step_timeout(Duration::from_millis(300));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// NavigatorOptions
// ============================================================================

/// Bounds and delays used by [`BrowserNavigator`](super::BrowserNavigator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorOptions {
    /// Most tab steps `select_tab` takes before giving up.
    pub max_tab_steps: usize,
    /// Most pages `collect_all_results` reads.
    pub max_pages: usize,
    /// Open commands sent before `BrowserOpenTimeout`.
    pub open_retries: u32,
    /// Wait for activation per open attempt.
    pub open_timeout: Duration,
    /// Wait for the DAW to report a change after each step.
    pub step_timeout: Duration,
    /// Pause after a confirmed step so the rest of the update burst lands.
    pub settle: Duration,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigatorOptions {
    /// Creates options with conservative defaults for a local DAW.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_tab_steps: 10,
            max_pages: 50,
            open_retries: 3,
            open_timeout: Duration::from_secs(2),
            step_timeout: Duration::from_millis(500),
            settle: Duration::from_millis(50),
        }
    }

    /// Sets the tab step bound.
    #[inline]
    #[must_use]
    pub fn with_max_tab_steps(mut self, steps: usize) -> Self {
        self.max_tab_steps = steps;
        self
    }

    /// Sets the page bound.
    #[inline]
    #[must_use]
    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    /// Sets the number of open attempts.
    #[inline]
    #[must_use]
    pub fn with_open_retries(mut self, retries: u32) -> Self {
        self.open_retries = retries;
        self
    }

    /// Sets the per-attempt open timeout.
    #[inline]
    #[must_use]
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// Sets the per-step timeout.
    #[inline]
    #[must_use]
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Sets the post-step settle delay.
    #[inline]
    #[must_use]
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a bound or timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_tab_steps == 0 || self.max_pages == 0 || self.open_retries == 0 {
            return Err(Error::config("navigator bounds must be at least 1"));
        }
        if self.open_timeout.is_zero() || self.step_timeout.is_zero() {
            return Err(Error::config("navigator timeouts must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = NavigatorOptions::default();
        assert_eq!(options.max_pages, 50);
        assert_eq!(options.max_tab_steps, 10);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_bound_rejected() {
        let options = NavigatorOptions::new().with_max_pages(0);
        assert!(matches!(options.validate(), Err(Error::Config { .. })));
    }
}
