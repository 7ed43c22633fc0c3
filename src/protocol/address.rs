//! Bitwig controller address families.
//!
//! Track, parameter, slot and column indices are 1-based, matching what the
//! DAW reports. The functions here only build strings; no validation of
//! ranges happens at this level.
//!
//! | Family | Examples |
//! |--------|----------|
//! | Transport | `/play`, `/stop`, `/tempo/raw`, `/signature/numerator` |
//! | Track | `/track/{i}/volume`, `/track/{i}/mute` |
//! | Device | `/device/param/{i}/value`, `/device/sibling/{i}/select` |
//! | Browser | `/browser/isActive`, `/browser/result/{k}/name` |

// ============================================================================
// Transport
// ============================================================================

/// Play toggle, and the play state the DAW reports.
pub const PLAY: &str = "/play";

/// Stop command.
pub const STOP: &str = "/stop";

/// Tempo in BPM.
pub const TEMPO: &str = "/tempo/raw";

/// Time signature numerator.
pub const SIGNATURE_NUMERATOR: &str = "/signature/numerator";

/// Time signature denominator.
pub const SIGNATURE_DENOMINATOR: &str = "/signature/denominator";

/// Asks the DAW to re-send its whole state.
pub const REFRESH: &str = "/refresh";

// ============================================================================
// Track
// ============================================================================

/// Number of tracks the controller script reports in one bank.
pub const TRACK_BANK_SIZE: usize = 10;

/// Builds `/track/{index}/{property}`.
#[inline]
#[must_use]
pub fn track(index: usize, property: &str) -> String {
    format!("/track/{index}/{property}")
}

/// Builds the `/track/{index}/` prefix.
#[inline]
#[must_use]
pub fn track_prefix(index: usize) -> String {
    format!("/track/{index}/")
}

// ============================================================================
// Device
// ============================================================================

/// Number of remote-control parameters per device page.
pub const DEVICE_PARAM_COUNT: usize = 8;

/// Number of addressable siblings and layers.
pub const DEVICE_SLOT_COUNT: usize = 8;

/// Whether a device is selected.
pub const DEVICE_EXISTS: &str = "/device/exists";

/// Selected device name.
pub const DEVICE_NAME: &str = "/device/name";

/// Number of devices in the selected chain.
pub const DEVICE_CHAIN_SIZE: &str = "/device/chain/size";

/// Bypass toggle for the selected device.
pub const DEVICE_BYPASS: &str = "/device/bypass";

/// Selects the next device in the chain.
pub const DEVICE_NEXT: &str = "/device/+";

/// Selects the previous device in the chain.
pub const DEVICE_PREVIOUS: &str = "/device/-";

/// Leaves the current layer for its parent.
pub const DEVICE_LAYER_PARENT: &str = "/device/layer/parent";

/// Whether the selected device has layers.
pub const DEVICE_LAYER_EXISTS: &str = "/device/layer/exists";

/// Plugin window toggle.
pub const DEVICE_WINDOW: &str = "/device/window";

/// Builds `/device/param/{index}/{property}`.
#[inline]
#[must_use]
pub fn device_param(index: usize, property: &str) -> String {
    format!("/device/param/{index}/{property}")
}

/// Builds `/device/chain/{index}/name`.
#[inline]
#[must_use]
pub fn device_chain_name(index: usize) -> String {
    format!("/device/chain/{index}/name")
}

/// Builds `/device/sibling/{index}/{property}`.
#[inline]
#[must_use]
pub fn device_sibling(index: usize, property: &str) -> String {
    format!("/device/sibling/{index}/{property}")
}

/// Builds `/device/layer/{index}/{property}`.
#[inline]
#[must_use]
pub fn device_layer(index: usize, property: &str) -> String {
    format!("/device/layer/{index}/{property}")
}

// ============================================================================
// Browser
// ============================================================================

/// Number of result slots and filter items visible at once.
pub const BROWSER_WINDOW_SIZE: usize = 16;

/// Number of filter columns.
pub const BROWSER_FILTER_COLUMNS: usize = 6;

/// Opens the browser to insert a device after the selection.
pub const BROWSER_OPEN_DEVICE: &str = "/browser/device";

/// Opens the browser to insert a device before the selection.
pub const BROWSER_OPEN_DEVICE_BEFORE: &str = "/browser/device/before";

/// Opens the browser to replace the selection with a preset.
pub const BROWSER_OPEN_PRESET: &str = "/browser/preset";

/// Whether the browser popup is open.
pub const BROWSER_ACTIVE: &str = "/browser/isActive";

/// Whether a browser exists at all.
pub const BROWSER_EXISTS: &str = "/browser/exists";

/// Name of the current browser tab.
pub const BROWSER_TAB: &str = "/browser/tab";

/// Steps to the next browser tab.
pub const BROWSER_TAB_NEXT: &str = "/browser/tab/+";

/// Steps to the previous browser tab.
pub const BROWSER_TAB_PREVIOUS: &str = "/browser/tab/-";

/// Advances the result window by one page.
pub const BROWSER_RESULT_PAGE_NEXT: &str = "/browser/result/page/+";

/// Prefix shared by every result-slot address.
pub const BROWSER_RESULT_PREFIX: &str = "/browser/result/";

/// Inserts the selected result and closes the browser.
pub const BROWSER_COMMIT: &str = "/browser/commit";

/// Closes the browser without inserting.
pub const BROWSER_CANCEL: &str = "/browser/cancel";

/// Builds `/browser/result/{slot}/{property}`.
#[inline]
#[must_use]
pub fn browser_result(slot: usize, property: &str) -> String {
    format!("/browser/result/{slot}/{property}")
}

/// Builds `/browser/filter/{column}/{property}`.
#[inline]
#[must_use]
pub fn browser_filter(column: usize, property: &str) -> String {
    format!("/browser/filter/{column}/{property}")
}

/// Builds the `/browser/filter/{column}/` prefix.
#[inline]
#[must_use]
pub fn browser_filter_prefix(column: usize) -> String {
    format!("/browser/filter/{column}/")
}

/// Builds `/browser/filter/{column}/item/{item}/{property}`.
#[inline]
#[must_use]
pub fn browser_filter_item(column: usize, item: usize, property: &str) -> String {
    format!("/browser/filter/{column}/item/{item}/{property}")
}

/// Builds the filter step address, `+` forward and `-` backward.
#[inline]
#[must_use]
pub fn browser_filter_step(column: usize, forward: bool) -> String {
    let direction = if forward { '+' } else { '-' };
    format!("/browser/filter/{column}/{direction}")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_addresses() {
        assert_eq!(track(3, "volume"), "/track/3/volume");
        assert!(track(3, "name").starts_with(&track_prefix(3)));
    }

    #[test]
    fn test_browser_addresses() {
        assert_eq!(browser_result(16, "name"), "/browser/result/16/name");
        assert_eq!(
            browser_filter_item(2, 5, "isSelected"),
            "/browser/filter/2/item/5/isSelected"
        );
        assert_eq!(browser_filter_step(4, true), "/browser/filter/4/+");
        assert_eq!(browser_filter_step(4, false), "/browser/filter/4/-");
        assert!(browser_result(1, "exists").starts_with(BROWSER_RESULT_PREFIX));
    }

    #[test]
    fn test_device_addresses() {
        assert_eq!(device_param(8, "value/str"), "/device/param/8/value/str");
        assert_eq!(device_sibling(2, "select"), "/device/sibling/2/select");
        assert_eq!(device_layer(1, "chain/size"), "/device/layer/1/chain/size");
    }
}
