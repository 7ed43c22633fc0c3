//! Tool and resource facade.
//!
//! Maps named tool calls and `bitwig://` resource URIs onto the controller
//! and the browser navigator. Every tool returns a short status string;
//! failures are reported as [`ToolError`].
//!
//! | Module | Description |
//! |--------|-------------|
//! | `call` | [`ToolCall`] decoding and argument validation |
//! | `resources` | Resource URIs and their text rendering |
//! | `prompts` | Prompt templates |
//! | `error` | [`ToolError`] shape |
//!
//! # Example
//!
//! ```no_run
//! use bitwig_osc_bridge::{BridgeConfig, Controller, Result, Tools};
//! use serde_json::json;
//!
//! # async fn example() -> Result<()> {
//! let tools = Tools::new(Controller::connect(BridgeConfig::new()).await?);
//!
//! let status = tools.invoke("set_tempo", json!({ "bpm": 124 })).await;
//! println!("{status:?}");
//! println!("{}", tools.read_resource("bitwig://transport").await?);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod call;
mod error;
mod prompts;
mod resources;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::browser::{BrowserNavigator, NavigatorOptions};
use crate::controller::{Controller, OscEndpoint};
use crate::error::{Error, Result};
use crate::protocol::{Message, address};

pub use call::{DeviceDirection, MAX_TEMPO, MAX_VALUE, ToolCall};
pub use error::ToolError;
pub use prompts::{
    Prompt, PromptArgument, PromptInfo, PromptMessage, list_prompts, render_prompt,
};
pub use resources::{
    Resource, ResourceInfo, list_resources, render_cached, render_session, render_status,
};

// ============================================================================
// Constants
// ============================================================================

/// Pause after `/refresh` before a resource is rendered.
pub const DEFAULT_REFRESH_WAIT: Duration = Duration::from_millis(500);

// ============================================================================
// Tools
// ============================================================================

/// Executes tool calls and serves resources over one endpoint.
///
/// The browser navigator sits behind an async mutex, so concurrent browse
/// tools run one at a time.
#[derive(Debug)]
pub struct Tools<E = Controller> {
    endpoint: E,
    navigator: Mutex<BrowserNavigator<E>>,
    refresh_wait: Duration,
}

impl<E: OscEndpoint + Clone> Tools<E> {
    /// Creates a facade with default navigator options.
    #[must_use]
    pub fn new(endpoint: E) -> Self {
        let navigator = BrowserNavigator::new(endpoint.clone());
        Self::from_navigator(endpoint, navigator)
    }

    /// Creates a facade with explicit navigator options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options are invalid.
    pub fn with_navigator_options(endpoint: E, options: NavigatorOptions) -> Result<Self> {
        let navigator = BrowserNavigator::with_options(endpoint.clone(), options)?;
        Ok(Self::from_navigator(endpoint, navigator))
    }

    fn from_navigator(endpoint: E, navigator: BrowserNavigator<E>) -> Self {
        Self {
            endpoint,
            navigator: Mutex::new(navigator),
            refresh_wait: DEFAULT_REFRESH_WAIT,
        }
    }

    /// Sets the pause after `/refresh`; zero skips the refresh entirely.
    #[inline]
    #[must_use]
    pub fn with_refresh_wait(mut self, wait: Duration) -> Self {
        self.refresh_wait = wait;
        self
    }

    /// Returns the endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// Returns the navigator.
    #[inline]
    #[must_use]
    pub fn navigator(&self) -> &Mutex<BrowserNavigator<E>> {
        &self.navigator
    }
}

// ============================================================================
// Tool Execution
// ============================================================================

impl<E: OscEndpoint + Clone> Tools<E> {
    /// Decodes and executes a call, reducing failures to [`ToolError`].
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] for any decode, validation or execution
    /// failure.
    pub async fn invoke(&self, name: &str, arguments: Value) -> std::result::Result<String, ToolError> {
        let outcome = match ToolCall::from_parts(name, arguments) {
            Ok(call) => self.execute(call).await,
            Err(e) => Err(e),
        };

        outcome.map_err(|e| {
            warn!(tool = name, error = %e, "Tool failed");
            ToolError::from(&e)
        })
    }

    /// Validates and executes a call, returning a status line.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if an argument is out of range
    /// - transport and browser errors from the operation
    pub async fn execute(&self, call: ToolCall) -> Result<String> {
        call.validate()?;
        debug!(tool = call.name(), "Executing tool");

        match call {
            ToolCall::TransportPlay {} => {
                self.send(Message::bare(address::PLAY)).await?;
                Ok("Transport play/pause toggled".to_string())
            }
            ToolCall::TransportStop {} => {
                self.send(Message::trigger(address::STOP)).await?;
                Ok("Transport stopped".to_string())
            }
            ToolCall::SetTempo { bpm } => {
                self.send(Message::with_value(address::TEMPO, bpm as f32))
                    .await?;
                Ok(format!("Tempo set to {bpm} BPM"))
            }
            ToolCall::SetTrackVolume {
                track_index,
                volume,
            } => {
                let index = slot(track_index)?;
                self.send(Message::with_value(
                    address::track(index, "volume"),
                    volume as f32,
                ))
                .await?;
                Ok(format!("Track {index} volume set to {volume}"))
            }
            ToolCall::SetTrackPan { track_index, pan } => {
                let index = slot(track_index)?;
                self.send(Message::with_value(address::track(index, "pan"), pan as f32))
                    .await?;
                Ok(format!("Track {index} pan set to {pan}"))
            }
            ToolCall::ToggleTrackMute { track_index } => {
                let index = slot(track_index)?;
                self.send(Message::bare(address::track(index, "mute")))
                    .await?;
                Ok(format!("Track {index} mute toggled"))
            }
            ToolCall::SetTrackMute { track_index, mute } => {
                let index = slot(track_index)?;
                self.send(Message::with_value(
                    address::track(index, "mute"),
                    i32::from(mute),
                ))
                .await?;
                Ok(format!("Track {index} mute set to {mute}"))
            }
            ToolCall::SetDeviceParameter { param_index, value } => {
                let index = slot(param_index)?;
                self.send(Message::with_value(
                    address::device_param(index, "value"),
                    value as f32,
                ))
                .await?;
                Ok(format!("Device parameter {index} set to {value}"))
            }
            ToolCall::ToggleDeviceBypass {} => {
                self.send(Message::bare(address::DEVICE_BYPASS)).await?;
                Ok("Device bypass toggled".to_string())
            }
            ToolCall::SelectDeviceSibling { sibling_index } => {
                let index = slot(sibling_index)?;
                self.send(Message::trigger(address::device_sibling(index, "select")))
                    .await?;
                Ok(format!("Selected sibling device {index}"))
            }
            ToolCall::NavigateDevice { direction } => {
                self.send(Message::trigger(direction.address())).await?;
                Ok(format!("Navigated to {direction} device"))
            }
            ToolCall::EnterDeviceLayer { layer_index } => {
                let index = slot(layer_index)?;
                self.send(Message::trigger(address::device_layer(index, "select")))
                    .await?;
                Ok(format!("Entered device layer {index}"))
            }
            ToolCall::ExitDeviceLayer {} => {
                self.send(Message::trigger(address::DEVICE_LAYER_PARENT))
                    .await?;
                Ok("Exited device layer".to_string())
            }
            ToolCall::ToggleDeviceWindow {} => {
                self.send(Message::bare(address::DEVICE_WINDOW)).await?;
                Ok("Device window toggled".to_string())
            }
            ToolCall::BrowseOpen { context } => {
                let mut navigator = self.navigator.lock().await;
                navigator.open(context).await?;
                let tab = navigator.session().current_tab().unwrap_or("unknown");
                Ok(format!("Browser opened for {context} (tab: {tab})"))
            }
            ToolCall::BrowseSelectTab { tab } => {
                let steps = self.navigator.lock().await.select_tab(&tab).await?;
                Ok(format!("Selected browser tab {tab} after {steps} steps"))
            }
            ToolCall::BrowseSelectFilter { column, item } => {
                let steps = self
                    .navigator
                    .lock()
                    .await
                    .select_filter(column, &item)
                    .await?;
                Ok(format!(
                    "Selected {item} in filter column {column} after {steps} steps"
                ))
            }
            ToolCall::BrowseCollect {} => {
                let results = self.navigator.lock().await.collect_all_results().await?;
                Ok(serde_json::to_string_pretty(&results)?)
            }
            ToolCall::BrowseCommit {} => {
                self.navigator.lock().await.commit().await?;
                Ok("Browser selection committed".to_string())
            }
            ToolCall::BrowseCancel {} => {
                self.navigator.lock().await.cancel().await?;
                Ok("Browser cancelled".to_string())
            }
        }
    }

    async fn send(&self, message: Message) -> Result<()> {
        self.endpoint.fire_and_forget(message).await
    }
}

// ============================================================================
// Resources
// ============================================================================

impl<E: OscEndpoint + Clone> Tools<E> {
    /// Renders the resource at `uri`.
    ///
    /// Cache-backed resources first ask the DAW to resend its state and
    /// wait `refresh_wait` for it to arrive.
    ///
    /// # Errors
    ///
    /// - [`Error::ResourceNotFound`] for unknown URIs or missing tracks
    /// - [`Error::InvalidArgument`] for malformed track URIs
    /// - transport errors from the refresh
    pub async fn read_resource(&self, uri: &str) -> Result<String> {
        let resource = Resource::parse(uri)?;
        debug!(uri, "Reading resource");

        if resource == Resource::Status {
            return Ok(render_status(self.endpoint.status().as_ref()));
        }

        if resource.is_browser() {
            let mut navigator = self.navigator.lock().await;
            if navigator.session().is_open() {
                navigator.refresh_filters();
                navigator.read_results_page();
            }
            return render_session(navigator.session(), resource);
        }

        if !self.refresh_wait.is_zero() {
            self.send(Message::trigger(address::REFRESH)).await?;
            tokio::time::sleep(self.refresh_wait).await;
        }
        render_cached(&self.endpoint, resource)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn slot(index: i64) -> Result<usize> {
    usize::try_from(index)
        .map_err(|_| Error::invalid_argument(format!("Invalid index: {index}")))
}
