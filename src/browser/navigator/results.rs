//! Result window reading and paginated collection.
//!
//! The DAW exposes 16 result slots at a time. Slots are read individually
//! and an empty slot does not end the window: later slots may still hold
//! results. There is no explicit end-of-results signal; the end is reached
//! when stepping to the next page leaves the window unchanged.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info};

use crate::controller::OscEndpoint;
use crate::error::Result;
use crate::protocol::{AddressPattern, Message, address};

use super::BrowserNavigator;
use crate::browser::session::{BrowserState, CollectedResult, ResultItem, same_window};

// ============================================================================
// BrowserNavigator - Results
// ============================================================================

impl<E: OscEndpoint> BrowserNavigator<E> {
    /// Reads the visible result window from the cache into the session.
    pub fn read_results_page(&mut self) -> &[ResultItem] {
        self.session.results_page = (1..=address::BROWSER_WINDOW_SIZE)
            .filter_map(|slot| self.read_result_slot(slot))
            .collect();
        &self.session.results_page
    }

    /// Pages through all results, accumulating them without duplicates.
    ///
    /// Stops when a page step leaves the window unchanged or after
    /// `max_pages` windows. Results are keyed by name plus the filter
    /// signature they were found under, and accumulate across calls until
    /// the session closes.
    ///
    /// # Errors
    ///
    /// - [`Error::BrowserNotOpen`](crate::Error::BrowserNotOpen) if no
    ///   session is open
    /// - transport errors from the endpoint
    pub async fn collect_all_results(&mut self) -> Result<Vec<CollectedResult>> {
        self.ensure_open()?;

        self.session.state = BrowserState::Navigating;
        let result = self.page_through_results().await;
        let result = self.finish_navigation(result);

        result.map(|()| self.session.collected().to_vec())
    }

    async fn page_through_results(&mut self) -> Result<()> {
        let signature = self.filter_signature();
        let max_pages = self.options.max_pages;

        let mut window = self.read_results_page().to_vec();
        let mut pages = 1;
        let mut added = self.session.merge(&window, &signature, pages);
        debug!(page = pages, slots = window.len(), added, "Result page read");

        while pages < max_pages {
            self.step(
                Message::trigger(address::BROWSER_RESULT_PAGE_NEXT),
                AddressPattern::prefix(address::BROWSER_RESULT_PREFIX),
            )
            .await?;
            self.session.page_cursor += 1;

            let next = self.read_results_page().to_vec();
            if same_window(&window, &next) {
                debug!(page = pages, "Window unchanged, end of results");
                break;
            }

            pages += 1;
            added = self.session.merge(&next, &signature, pages);
            debug!(page = pages, slots = next.len(), added, "Result page read");
            window = next;
        }

        info!(
            pages,
            collected = self.session.collected().len(),
            signature = %signature,
            "Result collection finished"
        );
        Ok(())
    }

    fn read_result_slot(&self, slot: usize) -> Option<ResultItem> {
        let cached =
            |property: &str| self.endpoint.get_cached(&address::browser_result(slot, property));

        let name = self.cached_str(&address::browser_result(slot, "name"))?;
        if cached("exists").and_then(|message| message.first_bool()) == Some(false) {
            return None;
        }

        Some(ResultItem {
            slot_index: slot,
            name,
            is_selected: cached("isSelected")
                .and_then(|message| message.first_bool())
                .unwrap_or(false),
        })
    }
}
