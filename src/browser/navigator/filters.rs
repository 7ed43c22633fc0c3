//! Filter columns.
//!
//! Columns are read from the live cache; the DAW pushes every column when
//! the browser opens and whenever a selection changes. Only the 16 items in
//! a column's visible window are addressable, so items scrolled out of that
//! window cannot be selected by name.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::controller::OscEndpoint;
use crate::error::{Error, Result};
use crate::protocol::{AddressPattern, Message, address};

use super::BrowserNavigator;
use crate::browser::session::{self, BrowserState, FilterColumn, FilterItem};

// ============================================================================
// BrowserNavigator - Filters
// ============================================================================

impl<E: OscEndpoint> BrowserNavigator<E> {
    /// Re-reads all filter columns from the cache into the session.
    pub fn refresh_filters(&mut self) -> &[FilterColumn] {
        self.session.filters = (1..=address::BROWSER_FILTER_COLUMNS)
            .map(|column| self.read_filter_column(column))
            .collect();
        &self.session.filters
    }

    /// Returns the signature of the current filter selection.
    pub fn filter_signature(&mut self) -> String {
        session::filter_signature(self.refresh_filters())
    }

    /// Moves the cursor of filter `column` onto the item named `item_name`.
    ///
    /// Returns the number of steps sent. The match is case-sensitive. If
    /// the column reports no selection, the cursor is assumed to be on the
    /// first slot.
    ///
    /// # Errors
    ///
    /// - [`Error::BrowserNotOpen`] if no session is open
    /// - [`Error::InvalidArgument`] if `column` is not in 1..=6
    /// - [`Error::FilterItemNotFound`] if the item is not visible
    pub async fn select_filter(&mut self, column: usize, item_name: &str) -> Result<usize> {
        self.ensure_open()?;
        if !(1..=address::BROWSER_FILTER_COLUMNS).contains(&column) {
            return Err(Error::invalid_argument(format!(
                "filter column must be between 1 and {}, got {column}",
                address::BROWSER_FILTER_COLUMNS
            )));
        }

        let snapshot = self.read_filter_column(column);
        let target = snapshot
            .find(item_name)
            .filter(|_| snapshot.exists)
            .map(|item| item.index)
            .ok_or_else(|| Error::filter_item_not_found(column, item_name))?;
        let current = snapshot.selected().map_or(1, |item| item.index);

        let distance = target.abs_diff(current);
        if distance == 0 {
            return Ok(0);
        }

        self.session.state = BrowserState::Navigating;
        let result = self
            .step_filter(column, target > current, distance)
            .await
            .map(|()| distance);
        self.refresh_filters();
        debug!(column, item = item_name, distance, "Filter selected");
        self.finish_navigation(result)
    }

    async fn step_filter(&self, column: usize, forward: bool, steps: usize) -> Result<()> {
        let expect = AddressPattern::prefix(address::browser_filter_prefix(column));
        for _ in 0..steps {
            self.step(
                Message::trigger(address::browser_filter_step(column, forward)),
                expect.clone(),
            )
            .await?;
        }
        Ok(())
    }

    /// Reads one filter column from the cache.
    pub(crate) fn read_filter_column(&self, column: usize) -> FilterColumn {
        let name = self.cached_str(&address::browser_filter(column, "name"));
        let exists = self
            .endpoint
            .get_cached(&address::browser_filter(column, "exists"))
            .and_then(|message| message.first_bool())
            .unwrap_or(name.is_some());

        let items = (1..=address::BROWSER_WINDOW_SIZE)
            .filter_map(|slot| self.read_filter_item(column, slot))
            .collect();

        FilterColumn {
            index: column,
            name,
            exists,
            items,
        }
    }

    fn read_filter_item(&self, column: usize, slot: usize) -> Option<FilterItem> {
        let cached = |property: &str| {
            self.endpoint
                .get_cached(&address::browser_filter_item(column, slot, property))
        };

        let name = self.cached_str(&address::browser_filter_item(column, slot, "name"))?;
        if cached("exists").and_then(|message| message.first_bool()) == Some(false) {
            return None;
        }

        Some(FilterItem {
            index: slot,
            name,
            hit_count: cached("hits").and_then(|message| message.first_i64()),
            is_selected: cached("isSelected")
                .and_then(|message| message.first_bool())
                .unwrap_or(false),
        })
    }
}
