//! Tool call decoding and validation.
//!
//! A call arrives as a tool name plus a JSON object of arguments:
//!
//! ```json
//! { "name": "set_tempo", "arguments": { "bpm": 128 } }
//! ```
//!
//! Deserialization checks presence and JSON types; [`ToolCall::validate`]
//! checks ranges. Both failures surface as [`Error::InvalidArgument`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::browser::BrowseContext;
use crate::error::{Error, Result};
use crate::protocol::address;

// ============================================================================
// Constants
// ============================================================================

/// Largest tempo the DAW accepts.
pub const MAX_TEMPO: f64 = 666.0;

/// Upper bound of the DAW's 0..=128 value resolution.
pub const MAX_VALUE: f64 = 128.0;

// ============================================================================
// DeviceDirection
// ============================================================================

/// Direction for [`ToolCall::NavigateDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceDirection {
    /// Next device in the chain.
    Next,
    /// Previous device in the chain.
    Previous,
}

impl DeviceDirection {
    /// Command address for this direction.
    #[inline]
    #[must_use]
    pub const fn address(self) -> &'static str {
        match self {
            Self::Next => address::DEVICE_NEXT,
            Self::Previous => address::DEVICE_PREVIOUS,
        }
    }
}

impl fmt::Display for DeviceDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Next => "next",
            Self::Previous => "previous",
        })
    }
}

// ============================================================================
// ToolCall
// ============================================================================

/// One decoded tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    /// Toggle play/pause.
    TransportPlay {},
    /// Stop playback.
    TransportStop {},
    /// Set the tempo in BPM.
    SetTempo {
        /// Tempo, 0..=666.
        bpm: f64,
    },
    /// Set a track's volume.
    SetTrackVolume {
        /// 1-based track index.
        track_index: i64,
        /// Volume, 0..=128.
        volume: f64,
    },
    /// Set a track's pan.
    SetTrackPan {
        /// 1-based track index.
        track_index: i64,
        /// Pan, 0..=128, 64 is center.
        pan: f64,
    },
    /// Toggle a track's mute.
    ToggleTrackMute {
        /// 1-based track index.
        track_index: i64,
    },
    /// Set a track's mute explicitly.
    SetTrackMute {
        /// 1-based track index.
        track_index: i64,
        /// Muted or not.
        mute: bool,
    },
    /// Set a parameter of the selected device.
    SetDeviceParameter {
        /// 1-based parameter index, 1..=8.
        param_index: i64,
        /// Value, 0..=128.
        value: f64,
    },
    /// Toggle bypass of the selected device.
    ToggleDeviceBypass {},
    /// Select a sibling of the selected device.
    SelectDeviceSibling {
        /// 1-based sibling index, 1..=8.
        sibling_index: i64,
    },
    /// Move the device selection.
    NavigateDevice {
        /// `next` or `previous`.
        direction: DeviceDirection,
    },
    /// Enter a layer of the selected device.
    EnterDeviceLayer {
        /// 1-based layer index, 1..=8.
        layer_index: i64,
    },
    /// Return to the parent of the current layer.
    ExitDeviceLayer {},
    /// Toggle the selected device's window.
    ToggleDeviceWindow {},
    /// Open the browser.
    BrowseOpen {
        /// What to browse for.
        #[serde(default)]
        context: BrowseContext,
    },
    /// Step to a browser tab by name.
    BrowseSelectTab {
        /// Tab name, case-sensitive.
        tab: String,
    },
    /// Select an item in a filter column.
    BrowseSelectFilter {
        /// 1-based column, 1..=6.
        column: usize,
        /// Item name, case-sensitive.
        item: String,
    },
    /// Collect all results across pages.
    BrowseCollect {},
    /// Insert the selected result and close the browser.
    BrowseCommit {},
    /// Close the browser without inserting.
    BrowseCancel {},
}

#[derive(Deserialize)]
struct RawCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl ToolCall {
    /// Every tool name, in listing order.
    pub const NAMES: &'static [&'static str] = &[
        "transport_play",
        "transport_stop",
        "set_tempo",
        "set_track_volume",
        "set_track_pan",
        "toggle_track_mute",
        "set_track_mute",
        "set_device_parameter",
        "toggle_device_bypass",
        "select_device_sibling",
        "navigate_device",
        "enter_device_layer",
        "exit_device_layer",
        "toggle_device_window",
        "browse_open",
        "browse_select_tab",
        "browse_select_filter",
        "browse_collect",
        "browse_commit",
        "browse_cancel",
    ];

    /// Decodes a call from a tool name and its JSON arguments.
    ///
    /// `null` arguments are treated as an empty object.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the name is unknown or an argument is
    /// missing or mistyped.
    pub fn from_parts(name: &str, arguments: Value) -> Result<Self> {
        if !Self::NAMES.contains(&name) {
            return Err(Error::invalid_argument(format!("Unknown tool: {name}")));
        }

        let arguments = match arguments {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other,
        };
        let tagged = serde_json::json!({ "name": name, "arguments": arguments });

        serde_json::from_value(tagged)
            .map_err(|e| Error::invalid_argument(format!("{name}: {e}")))
    }

    /// Decodes a `{"name": .., "arguments": ..}` document.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the document or its arguments are
    /// malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawCall = serde_json::from_str(json)
            .map_err(|e| Error::invalid_argument(format!("invalid tool call: {e}")))?;
        Self::from_parts(&raw.name, raw.arguments)
    }

    /// Tool name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TransportPlay {} => "transport_play",
            Self::TransportStop {} => "transport_stop",
            Self::SetTempo { .. } => "set_tempo",
            Self::SetTrackVolume { .. } => "set_track_volume",
            Self::SetTrackPan { .. } => "set_track_pan",
            Self::ToggleTrackMute { .. } => "toggle_track_mute",
            Self::SetTrackMute { .. } => "set_track_mute",
            Self::SetDeviceParameter { .. } => "set_device_parameter",
            Self::ToggleDeviceBypass {} => "toggle_device_bypass",
            Self::SelectDeviceSibling { .. } => "select_device_sibling",
            Self::NavigateDevice { .. } => "navigate_device",
            Self::EnterDeviceLayer { .. } => "enter_device_layer",
            Self::ExitDeviceLayer {} => "exit_device_layer",
            Self::ToggleDeviceWindow {} => "toggle_device_window",
            Self::BrowseOpen { .. } => "browse_open",
            Self::BrowseSelectTab { .. } => "browse_select_tab",
            Self::BrowseSelectFilter { .. } => "browse_select_filter",
            Self::BrowseCollect {} => "browse_collect",
            Self::BrowseCommit {} => "browse_commit",
            Self::BrowseCancel {} => "browse_cancel",
        }
    }

    /// Checks argument ranges.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] naming the offending argument.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::SetTempo { bpm } => check_range("tempo value", *bpm, MAX_TEMPO),
            Self::SetTrackVolume {
                track_index,
                volume,
            } => {
                check_positive("track_index", *track_index)?;
                check_range("volume", *volume, MAX_VALUE)
            }
            Self::SetTrackPan { track_index, pan } => {
                check_positive("track_index", *track_index)?;
                check_range("pan", *pan, MAX_VALUE)
            }
            Self::ToggleTrackMute { track_index } | Self::SetTrackMute { track_index, .. } => {
                check_positive("track_index", *track_index)
            }
            Self::SetDeviceParameter { param_index, value } => {
                check_slot("param_index", *param_index, address::DEVICE_PARAM_COUNT)?;
                check_range("value", *value, MAX_VALUE)
            }
            Self::SelectDeviceSibling { sibling_index } => {
                check_slot("sibling_index", *sibling_index, address::DEVICE_SLOT_COUNT)
            }
            Self::EnterDeviceLayer { layer_index } => {
                check_slot("layer_index", *layer_index, address::DEVICE_SLOT_COUNT)
            }
            Self::BrowseSelectTab { tab } if tab.is_empty() => {
                Err(Error::invalid_argument("Invalid tab: must not be empty"))
            }
            Self::BrowseSelectFilter { column, item } => {
                if !(1..=address::BROWSER_FILTER_COLUMNS).contains(column) {
                    return Err(Error::invalid_argument(format!(
                        "Invalid column: must be between 1 and {}",
                        address::BROWSER_FILTER_COLUMNS
                    )));
                }
                if item.is_empty() {
                    return Err(Error::invalid_argument("Invalid item: must not be empty"));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Range Checks
// ============================================================================

fn check_range(label: &str, value: f64, max: f64) -> Result<()> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "Invalid {label}: must be between 0 and {max}"
        )))
    }
}

fn check_positive(label: &str, value: i64) -> Result<()> {
    if value >= 1 {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "Invalid {label}: must be a positive integer"
        )))
    }
}

fn check_slot(label: &str, value: i64, max: usize) -> Result<()> {
    if (1..=max as i64).contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "Invalid {label}: must be between 1 and {max}"
        )))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_with_arguments() {
        let call = ToolCall::from_parts("set_tempo", json!({ "bpm": 128 })).expect("decode");
        assert_eq!(call, ToolCall::SetTempo { bpm: 128.0 });
        assert_eq!(call.name(), "set_tempo");
    }

    #[test]
    fn test_decode_without_arguments() {
        let call = ToolCall::from_parts("transport_play", Value::Null).expect("decode");
        assert_eq!(call, ToolCall::TransportPlay {});

        let call = ToolCall::from_json(r#"{"name":"browse_open"}"#).expect("decode");
        assert_eq!(
            call,
            ToolCall::BrowseOpen {
                context: BrowseContext::Device
            }
        );
    }

    #[test]
    fn test_unknown_tool_and_missing_argument() {
        let err = ToolCall::from_parts("launch_rocket", json!({})).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(err.to_string().contains("launch_rocket"));

        let err = ToolCall::from_parts("set_track_volume", json!({ "track_index": 1 }))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_validate_ranges() {
        assert!(ToolCall::SetTempo { bpm: 666.0 }.validate().is_ok());
        assert!(ToolCall::SetTempo { bpm: 667.0 }.validate().is_err());
        assert!(ToolCall::SetTempo { bpm: -1.0 }.validate().is_err());
        assert!(
            ToolCall::SetTrackVolume {
                track_index: 0,
                volume: 64.0
            }
            .validate()
            .is_err()
        );
        assert!(
            ToolCall::SetDeviceParameter {
                param_index: 9,
                value: 1.0
            }
            .validate()
            .is_err()
        );
        assert!(ToolCall::SelectDeviceSibling { sibling_index: 8 }.validate().is_ok());
        assert!(
            ToolCall::BrowseSelectFilter {
                column: 7,
                item: "Delay".into()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_direction_is_lowercase() {
        let call =
            ToolCall::from_parts("navigate_device", json!({ "direction": "previous" }))
                .expect("decode");
        assert_eq!(
            call,
            ToolCall::NavigateDevice {
                direction: DeviceDirection::Previous
            }
        );
        assert!(ToolCall::from_parts("navigate_device", json!({ "direction": "Up" })).is_err());
    }

    #[test]
    fn test_every_name_decodes_or_needs_arguments() {
        for name in ToolCall::NAMES {
            if let Ok(call) = ToolCall::from_parts(name, Value::Null) {
                assert_eq!(call.name(), *name);
            }
        }
    }
}
