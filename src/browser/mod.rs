//! Device browser automation.
//!
//! The DAW's browser popup is a stateful UI: tabs are stepped one at a time,
//! filter columns move a cursor, and results are shown through a window of
//! 16 slots that is paged forward. This module turns that into a small set
//! of operations over an [`OscEndpoint`](crate::controller::OscEndpoint):
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BrowserNavigator`] | Open, tab, filter, collect, commit, cancel |
//! | [`BrowserSession`] | State of the current session |
//! | [`NavigatorOptions`] | Step bounds and timeouts |
//!
//! # Example
//!
//! ```no_run
//! use bitwig_osc_bridge::{BridgeConfig, BrowseContext, BrowserNavigator, Controller, Result};
//!
//! # async fn example() -> Result<()> {
//! let controller = Controller::connect(BridgeConfig::new()).await?;
//! let mut navigator = BrowserNavigator::new(controller);
//!
//! navigator.open(BrowseContext::Device).await?;
//! navigator.select_tab("Everything").await?;
//! for result in navigator.collect_all_results().await? {
//!     println!("{} ({})", result.name, result.filter_signature);
//! }
//! navigator.cancel().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Stateful browser navigation.
pub mod navigator;

/// Navigator bounds and timeouts.
pub mod options;

/// Session state and snapshot types.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use navigator::BrowserNavigator;
pub use options::NavigatorOptions;
pub use session::{
    BrowseContext, BrowserSession, BrowserState, CollectedResult, FilterColumn, FilterItem,
    ResultItem, filter_signature, same_window,
};
