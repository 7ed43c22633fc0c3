//! Read-only resources rendered as plain text.
//!
//! | URI | Source |
//! |-----|--------|
//! | `bitwig://transport` | play state, tempo, time signature |
//! | `bitwig://tracks` | tracks 1..=10 of the bank |
//! | `bitwig://track/{index}` | one track in detail |
//! | `bitwig://devices` | selected device and its chain |
//! | `bitwig://device/parameters` | the 8 remote-control parameters |
//! | `bitwig://device/siblings` | devices next to the selected one |
//! | `bitwig://device/layers` | layers of the selected device |
//! | `bitwig://browser/tab` | browser session state and tab |
//! | `bitwig://browser/filters` | last filter snapshot |
//! | `bitwig://browser/results` | result window and collected count |
//! | `bitwig://status` | connection health and error tallies |
//!
//! Device and track resources read the live cache only; the browser
//! resources read the navigator's session; status reads the endpoint's
//! diagnostics.

// ============================================================================
// Imports
// ============================================================================

use std::fmt::Write as _;

use serde::Serialize;

use crate::browser::BrowserSession;
use crate::controller::{ControllerStatus, OscEndpoint};
use crate::error::{Error, Result};
use crate::protocol::{OscType, address};

// ============================================================================
// Constants
// ============================================================================

const SCHEME: &str = "bitwig://";

const TRACK_PREFIX: &str = "bitwig://track/";

// ============================================================================
// Resource
// ============================================================================

/// A parsed resource URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// `bitwig://transport`
    Transport,
    /// `bitwig://tracks`
    Tracks,
    /// `bitwig://track/{index}`
    Track(usize),
    /// `bitwig://devices`
    Devices,
    /// `bitwig://device/parameters`
    DeviceParameters,
    /// `bitwig://device/siblings`
    DeviceSiblings,
    /// `bitwig://device/layers`
    DeviceLayers,
    /// `bitwig://browser/tab`
    BrowserTab,
    /// `bitwig://browser/filters`
    BrowserFilters,
    /// `bitwig://browser/results`
    BrowserResults,
    /// `bitwig://status`
    Status,
}

impl Resource {
    /// Parses a resource URI.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a track URI without a valid index
    /// - [`Error::ResourceNotFound`] for any other unknown URI
    pub fn parse(uri: &str) -> Result<Self> {
        if let Some(index) = uri.strip_prefix(TRACK_PREFIX) {
            return match index.parse::<usize>() {
                Ok(index) if index >= 1 => Ok(Self::Track(index)),
                _ => Err(Error::invalid_argument(format!("Invalid track URI: {uri}"))),
            };
        }

        match uri.strip_prefix(SCHEME) {
            Some("transport") => Ok(Self::Transport),
            Some("tracks") => Ok(Self::Tracks),
            Some("devices") => Ok(Self::Devices),
            Some("device/parameters") => Ok(Self::DeviceParameters),
            Some("device/siblings") => Ok(Self::DeviceSiblings),
            Some("device/layers") => Ok(Self::DeviceLayers),
            Some("browser/tab") => Ok(Self::BrowserTab),
            Some("browser/filters") => Ok(Self::BrowserFilters),
            Some("browser/results") => Ok(Self::BrowserResults),
            Some("status") => Ok(Self::Status),
            _ => Err(Error::resource_not_found("Resource", uri)),
        }
    }

    /// Returns `true` for resources backed by the browser session.
    #[inline]
    #[must_use]
    pub const fn is_browser(self) -> bool {
        matches!(
            self,
            Self::BrowserTab | Self::BrowserFilters | Self::BrowserResults
        )
    }
}

// ============================================================================
// ResourceInfo
// ============================================================================

/// Listing entry for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    /// URI or URI template.
    pub uri: &'static str,
    /// Short display name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Always `text/plain`.
    pub mime_type: &'static str,
}

const fn info(uri: &'static str, name: &'static str, description: &'static str) -> ResourceInfo {
    ResourceInfo {
        uri,
        name,
        description,
        mime_type: "text/plain",
    }
}

/// Lists every resource the facade serves.
#[must_use]
pub fn list_resources() -> Vec<ResourceInfo> {
    vec![
        info("bitwig://transport", "Transport Info", "Current transport state"),
        info("bitwig://tracks", "Tracks Info", "Information about all tracks"),
        info(
            "bitwig://track/{index}",
            "Track Details",
            "Information about a specific track",
        ),
        info("bitwig://devices", "Active Devices", "The selected device and its chain"),
        info(
            "bitwig://device/parameters",
            "Device Parameters",
            "Parameters of the selected device",
        ),
        info(
            "bitwig://device/siblings",
            "Device Siblings",
            "Devices next to the selected device",
        ),
        info(
            "bitwig://device/layers",
            "Device Layers",
            "Layers of the selected device",
        ),
        info("bitwig://browser/tab", "Browser Tab", "Browser session state and tab"),
        info(
            "bitwig://browser/filters",
            "Browser Filters",
            "Filter columns of the open browser",
        ),
        info(
            "bitwig://browser/results",
            "Browser Results",
            "Visible results and collected count",
        ),
        info("bitwig://status", "Bridge Status", "Connection health and error counts"),
    ]
}

// ============================================================================
// Cache Rendering
// ============================================================================

/// Renders a cache-backed resource.
///
/// # Errors
///
/// [`Error::ResourceNotFound`] for a track without a name, or if called
/// with a browser resource.
pub fn render_cached<E: OscEndpoint + ?Sized>(endpoint: &E, resource: Resource) -> Result<String> {
    let view = CacheView(endpoint);
    match resource {
        Resource::Transport => Ok(view.transport()),
        Resource::Tracks => Ok(view.tracks()),
        Resource::Track(index) => view.track(index),
        Resource::Devices => Ok(view.devices()),
        Resource::DeviceParameters => Ok(view.device_parameters()),
        Resource::DeviceSiblings => Ok(view.device_siblings()),
        Resource::DeviceLayers => Ok(view.device_layers()),
        other => Err(Error::resource_not_found("Cached resource", format!("{other:?}"))),
    }
}

struct CacheView<'a, E: ?Sized>(&'a E);

impl<E: OscEndpoint + ?Sized> CacheView<'_, E> {
    fn value(&self, address: &str) -> Option<OscType> {
        self.0
            .get_cached(address)
            .and_then(|message| message.first().cloned())
    }

    fn flag(&self, address: &str) -> Option<bool> {
        self.value(address).and_then(|value| value.as_bool())
    }

    fn text(&self, address: &str) -> Option<String> {
        self.value(address)
            .map(|value| value.to_string())
            .filter(|value| !value.is_empty())
    }

    fn device_selected(&self) -> bool {
        self.flag(address::DEVICE_EXISTS).unwrap_or(false)
    }

    fn device_name(&self) -> String {
        self.text(address::DEVICE_NAME).unwrap_or_default()
    }

    fn transport(&self) -> String {
        let mut lines = vec!["Transport State:".to_string()];
        lines.push(format!(
            "Playing: {}",
            self.flag(address::PLAY).unwrap_or(false)
        ));

        if let Some(tempo) = self.value(address::TEMPO) {
            lines.push(format!("Tempo: {tempo} BPM"));
        }

        if let (Some(numerator), Some(denominator)) = (
            self.value(address::SIGNATURE_NUMERATOR),
            self.value(address::SIGNATURE_DENOMINATOR),
        ) {
            lines.push(format!("Time Signature: {numerator}/{denominator}"));
        }

        lines.join("\n")
    }

    fn tracks(&self) -> String {
        let tracks: Vec<String> = (1..=address::TRACK_BANK_SIZE)
            .filter_map(|index| {
                let name = self.text(&address::track(index, "name"))?;
                let mut block = format!("Track {index}: {name}");
                for (property, label, boolean) in [
                    ("volume", "Volume", false),
                    ("pan", "Pan", false),
                    ("mute", "Mute", true),
                    ("solo", "Solo", true),
                    ("recarm", "Record Armed", true),
                ] {
                    if let Some(value) = self.property(&address::track(index, property), boolean)
                    {
                        let _ = write!(block, "\n  {label}: {value}");
                    }
                }
                Some(block)
            })
            .collect();

        if tracks.is_empty() {
            "No tracks found".to_string()
        } else {
            format!("Tracks:\n\n{}", tracks.join("\n\n"))
        }
    }

    fn track(&self, index: usize) -> Result<String> {
        let name = self
            .text(&address::track(index, "name"))
            .ok_or_else(|| Error::resource_not_found("Track", index.to_string()))?;

        let mut lines = vec![format!("Track: {name}"), format!("Index: {index}")];
        for (property, label, boolean) in [
            ("type", "Type", false),
            ("volume", "Volume", false),
            ("pan", "Pan", false),
            ("mute", "Mute", true),
            ("solo", "Solo", true),
            ("recarm", "Record Armed", true),
            ("color", "Color", false),
            ("sends", "Send Count", false),
        ] {
            if let Some(value) = self.property(&address::track(index, property), boolean) {
                lines.push(format!("{label}: {value}"));
            }
        }
        Ok(lines.join("\n"))
    }

    fn property(&self, address: &str, boolean: bool) -> Option<String> {
        let value = self.value(address)?;
        Some(if boolean {
            value.as_bool().unwrap_or(false).to_string()
        } else {
            value.to_string()
        })
    }

    fn chain_size(&self) -> usize {
        self.value(address::DEVICE_CHAIN_SIZE)
            .and_then(|value| value.as_i64())
            .and_then(|size| usize::try_from(size).ok())
            .unwrap_or(0)
    }

    fn devices(&self) -> String {
        if !self.device_selected() {
            return "No active device found".to_string();
        }

        let mut lines = vec![format!("Active Device: {}", self.device_name())];
        let size = self.chain_size();
        if size > 0 {
            lines.push(format!("Device Chain Size: {size}"));
            for index in 1..=size {
                if let Some(name) = self.text(&address::device_chain_name(index)) {
                    lines.push(format!("  {index}: {name}"));
                }
            }
        }
        lines.join("\n")
    }

    fn device_parameters(&self) -> String {
        if !self.device_selected() {
            return "No device parameters found".to_string();
        }

        let mut lines = vec![format!("Device: {}", self.device_name()), "Parameters:".to_string()];
        for index in 1..=address::DEVICE_PARAM_COUNT {
            if !self.flag(&address::device_param(index, "exists")).unwrap_or(false) {
                continue;
            }
            let name = self.text(&address::device_param(index, "name")).unwrap_or_default();
            let value = self
                .value(&address::device_param(index, "value"))
                .map(|value| value.to_string())
                .unwrap_or_default();
            let mut line = format!("  {index}: {name} = {value}");
            if let Some(display) = self.text(&address::device_param(index, "value/str")) {
                let _ = write!(line, " ({display})");
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    fn device_siblings(&self) -> String {
        if !self.device_selected() {
            return "No sibling devices found".to_string();
        }

        let mut lines = vec![
            format!("Current Device: {}", self.device_name()),
            "Sibling Devices:".to_string(),
        ];
        for index in 1..=self.chain_size().min(address::DEVICE_SLOT_COUNT) {
            if !self.flag(&address::device_sibling(index, "exists")).unwrap_or(false) {
                continue;
            }
            let name = self.text(&address::device_sibling(index, "name")).unwrap_or_default();
            lines.push(format!("  {index}: {name}"));
            if let Some(bypassed) = self.flag(&address::device_sibling(index, "bypass")) {
                lines.push(format!("    Bypassed: {bypassed}"));
            }
        }

        if lines.len() > 2 {
            lines.join("\n")
        } else {
            "No sibling devices found".to_string()
        }
    }

    fn device_layers(&self) -> String {
        const EMPTY: &str = "No device layers found or device does not support layers";

        if !self.device_selected() || !self.flag(address::DEVICE_LAYER_EXISTS).unwrap_or(false) {
            return EMPTY.to_string();
        }

        let mut lines = vec![format!("Device: {}", self.device_name()), "Layers:".to_string()];
        for index in 1..=address::DEVICE_SLOT_COUNT {
            if !self.flag(&address::device_layer(index, "exists")).unwrap_or(false) {
                continue;
            }
            let name = self.text(&address::device_layer(index, "name")).unwrap_or_default();
            lines.push(format!("  {index}: {name}"));
            if let Some(size) = self.text(&address::device_layer(index, "chain/size")) {
                lines.push(format!("    Contains {size} devices"));
            }
        }

        if lines.len() > 2 {
            lines.join("\n")
        } else {
            EMPTY.to_string()
        }
    }
}

// ============================================================================
// Status Rendering
// ============================================================================

/// Renders `bitwig://status`.
#[must_use]
pub fn render_status(status: Option<&ControllerStatus>) -> String {
    let Some(status) = status else {
        return "Status unavailable".to_string();
    };

    let age = |ms: Option<u64>| ms.map_or_else(|| "never".to_string(), |ms| format!("{ms} ms ago"));
    let errors = &status.errors;

    [
        "Bridge Status:".to_string(),
        format!("Running: {}", status.running),
        format!("Healthy: {}", status.healthy),
        format!("DAW: {}", status.target_addr),
        format!("Listening: {}", status.listen_addr),
        format!("Pending Requests: {}", status.pending),
        format!("Cached Addresses: {}", status.cached),
        format!("Messages Received: {}", status.received),
        format!("Last Message: {}", age(status.last_inbound_ms)),
        format!("Last Reply: {}", age(status.last_success_ms)),
        format!("Consecutive Timeouts: {}", status.consecutive_timeouts),
        format!("Last Error: {}", status.last_error.as_deref().unwrap_or("none")),
        "Errors:".to_string(),
        format!("  Malformed: {}", errors.malformed),
        format!("  Handler Panics: {}", errors.handler_panics),
        format!("  Receive: {}", errors.receive),
        format!("  Timeouts: {}", errors.timeouts),
        format!("  Conflicts: {}", errors.conflicts),
        format!("  Send: {}", errors.send),
        format!("  Other: {}", errors.other),
    ]
    .join("\n")
}

// ============================================================================
// Session Rendering
// ============================================================================

/// Renders a browser-session resource.
///
/// # Errors
///
/// [`Error::ResourceNotFound`] if called with a cache-backed resource.
pub fn render_session(session: &BrowserSession, resource: Resource) -> Result<String> {
    match resource {
        Resource::BrowserTab => Ok(render_tab(session)),
        Resource::BrowserFilters => Ok(render_filters(session)),
        Resource::BrowserResults => Ok(render_results(session)),
        other => Err(Error::resource_not_found("Browser resource", format!("{other:?}"))),
    }
}

fn render_tab(session: &BrowserSession) -> String {
    let mut lines = vec![format!("Browser: {}", session.state())];
    if let Some(context) = session.context() {
        lines.push(format!("Context: {context}"));
    }
    if let Some(tab) = session.current_tab() {
        lines.push(format!("Tab: {tab}"));
    }
    lines.join("\n")
}

fn render_filters(session: &BrowserSession) -> String {
    if !session.is_open() {
        return "Browser is not open".to_string();
    }

    let mut out = String::from("Filters:");
    for column in session.filters().iter().filter(|column| column.exists) {
        let name = column.name.as_deref().unwrap_or("(unnamed)");
        let _ = write!(out, "\n\n{}: {name}", column.index);
        for item in &column.items {
            let marker = if item.is_selected { '*' } else { ' ' };
            let _ = write!(out, "\n {marker} {}: {}", item.index, item.name);
            if let Some(hits) = item.hit_count {
                let _ = write!(out, " ({hits})");
            }
        }
    }
    out
}

fn render_results(session: &BrowserSession) -> String {
    if !session.is_open() {
        return "Browser is not open".to_string();
    }

    let mut out = format!(
        "Results (page step {}, {} collected):",
        session.page_cursor(),
        session.collected().len()
    );
    if session.results_page().is_empty() {
        out.push_str("\n  (no results visible)");
    }
    for item in session.results_page() {
        let marker = if item.is_selected { '*' } else { ' ' };
        let _ = write!(out, "\n {marker} {}: {}", item.slot_index, item.name);
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
