//! Browser session state.
//!
//! The session is a plain value: the navigator mutates it, tests inspect it.
//!
//! # States
//!
//! ```text
//! Closed ─► Opening ─► Open ◄─► Navigating
//!                       │
//!                       ├─► Committing ─► Closed
//!                       └─► Cancelling ─► Closed
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::address;

// ============================================================================
// BrowserState
// ============================================================================

/// Lifecycle state of a browse session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserState {
    /// No browser popup.
    #[default]
    Closed,
    /// Open command sent, activation not yet confirmed.
    Opening,
    /// Browser confirmed active.
    Open,
    /// A tab, filter or page step is in progress.
    Navigating,
    /// Commit sent.
    Committing,
    /// Cancel sent.
    Cancelling,
}

impl BrowserState {
    /// Returns `true` if navigation commands are allowed.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open | Self::Navigating)
    }
}

impl fmt::Display for BrowserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Navigating => "navigating",
            Self::Committing => "committing",
            Self::Cancelling => "cancelling",
        };
        f.write_str(name)
    }
}

// ============================================================================
// BrowseContext
// ============================================================================

/// What the browser is opened for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowseContext {
    /// Insert a device after the selected one.
    #[default]
    Device,
    /// Insert a device before the selected one.
    DeviceBefore,
    /// Replace the selected device with a preset.
    Preset,
}

impl BrowseContext {
    /// Address of the open command.
    #[inline]
    #[must_use]
    pub const fn open_address(self) -> &'static str {
        match self {
            Self::Device => address::BROWSER_OPEN_DEVICE,
            Self::DeviceBefore => address::BROWSER_OPEN_DEVICE_BEFORE,
            Self::Preset => address::BROWSER_OPEN_PRESET,
        }
    }

    /// Name used in tool arguments.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::DeviceBefore => "device_before",
            Self::Preset => "preset",
        }
    }
}

impl fmt::Display for BrowseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowseContext {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "device" | "after" => Ok(Self::Device),
            "device_before" | "before" => Ok(Self::DeviceBefore),
            "preset" => Ok(Self::Preset),
            other => Err(Error::invalid_argument(format!(
                "unknown browse context {other:?}, expected device, device_before or preset"
            ))),
        }
    }
}

// ============================================================================
// Filter And Result Items
// ============================================================================

/// One visible entry of a filter column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterItem {
    /// 1-based slot in the visible window.
    pub index: usize,
    /// Display name.
    pub name: String,
    /// Number of results the item would match, if reported.
    pub hit_count: Option<i64>,
    /// Whether the column's cursor is on this item.
    pub is_selected: bool,
}

/// One filter column (Location, Category, Creator, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterColumn {
    /// 1-based column index.
    pub index: usize,
    /// Column name, if reported.
    pub name: Option<String>,
    /// Whether the column exists in the current tab.
    pub exists: bool,
    /// Visible items, at most one window.
    pub items: Vec<FilterItem>,
}

impl FilterColumn {
    /// Returns the selected item.
    #[must_use]
    pub fn selected(&self) -> Option<&FilterItem> {
        self.items.iter().find(|item| item.is_selected)
    }

    /// Finds a visible item by exact, case-sensitive name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&FilterItem> {
        self.items.iter().find(|item| item.name == name)
    }
}

/// One occupied slot of the result window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultItem {
    /// 1-based slot in the window.
    pub slot_index: usize,
    /// Display name.
    pub name: String,
    /// Whether this result is selected.
    pub is_selected: bool,
}

/// A result accumulated across pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectedResult {
    /// Display name.
    pub name: String,
    /// Filter signature the result was seen under.
    pub filter_signature: String,
    /// 1-based page within the collection run.
    pub page: usize,
    /// Slot within that page.
    pub slot_index: usize,
}

impl CollectedResult {
    fn key(&self) -> (String, String) {
        (self.name.clone(), self.filter_signature.clone())
    }
}

// ============================================================================
// BrowserSession
// ============================================================================

/// State of one browse session.
#[derive(Debug, Clone, Default)]
pub struct BrowserSession {
    pub(crate) state: BrowserState,
    pub(crate) context: Option<BrowseContext>,
    pub(crate) current_tab: Option<String>,
    pub(crate) filters: Vec<FilterColumn>,
    pub(crate) results_page: Vec<ResultItem>,
    pub(crate) page_cursor: usize,
    collected: Vec<CollectedResult>,
    keys: FxHashSet<(String, String)>,
}

impl BrowserSession {
    /// Creates a closed, empty session.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> BrowserState {
        self.state
    }

    /// Returns `true` if the browser is open.
    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Context the browser was opened for.
    #[inline]
    #[must_use]
    pub const fn context(&self) -> Option<BrowseContext> {
        self.context
    }

    /// Last known tab name.
    #[inline]
    #[must_use]
    pub fn current_tab(&self) -> Option<&str> {
        self.current_tab.as_deref()
    }

    /// Last filter snapshot.
    #[inline]
    #[must_use]
    pub fn filters(&self) -> &[FilterColumn] {
        &self.filters
    }

    /// Last result window read.
    #[inline]
    #[must_use]
    pub fn results_page(&self) -> &[ResultItem] {
        &self.results_page
    }

    /// Number of page steps taken in this session.
    #[inline]
    #[must_use]
    pub const fn page_cursor(&self) -> usize {
        self.page_cursor
    }

    /// De-duplicated results in first-seen order.
    #[inline]
    #[must_use]
    pub fn collected(&self) -> &[CollectedResult] {
        &self.collected
    }

    /// Adds unseen results from one window. Returns how many were new.
    pub fn merge(&mut self, window: &[ResultItem], filter_signature: &str, page: usize) -> usize {
        let mut added = 0;
        for item in window {
            let result = CollectedResult {
                name: item.name.clone(),
                filter_signature: filter_signature.to_string(),
                page,
                slot_index: item.slot_index,
            };
            if self.keys.insert(result.key()) {
                self.collected.push(result);
                added += 1;
            }
        }
        added
    }

    /// Returns to `Closed` and forgets everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Filter Signature
// ============================================================================

/// Builds the `Column=Item|...` signature of the selected filter items.
///
/// Columns that do not exist or have no selection are skipped.
#[must_use]
pub fn filter_signature(filters: &[FilterColumn]) -> String {
    filters
        .iter()
        .filter(|column| column.exists)
        .filter_map(|column| {
            let selected = column.selected()?;
            let name = column
                .name
                .clone()
                .unwrap_or_else(|| format!("filter{}", column.index));
            Some(format!("{name}={}", selected.name))
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Returns `true` if two windows show the same slots with the same names.
#[must_use]
pub fn same_window(a: &[ResultItem], b: &[ResultItem]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x.slot_index == y.slot_index && x.name == y.name)
}

// ============================================================================
// Tests
// ============================================================================
