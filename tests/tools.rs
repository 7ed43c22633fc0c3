//! Tool facade against the in-memory DAW.

mod common;

use std::time::Duration;

use serde_json::{Value, json};
use tokio_test::{assert_err, assert_ok, block_on};

use bitwig_osc_bridge::{
    Error, ErrorKind, Message, ToolCall, ToolError, Tools, address,
    tools::{list_prompts, list_resources, render_prompt},
};
use common::{DawModel, FakeDaw, UdpDaw, fast_options, init_tracing};

fn tools(model: DawModel) -> (FakeDaw, Tools<FakeDaw>) {
    init_tracing();
    let daw = FakeDaw::new(model);
    let tools = Tools::with_navigator_options(daw.clone(), fast_options())
        .expect("valid options")
        .with_refresh_wait(Duration::ZERO);
    (daw, tools)
}

fn mixer_model() -> DawModel {
    DawModel::default()
        .with_value(address::PLAY, 1_i32)
        .with_value(address::TEMPO, 120.5_f32)
        .with_value(address::SIGNATURE_NUMERATOR, 7_i32)
        .with_value(address::SIGNATURE_DENOMINATOR, 8_i32)
        .with_value(&address::track(1, "name"), "Drums")
        .with_value(&address::track(1, "volume"), 0.75_f32)
        .with_value(&address::track(1, "mute"), 0_i32)
        .with_value(&address::track(2, "name"), "Bass")
        .with_value(address::DEVICE_EXISTS, 1_i32)
        .with_value(address::DEVICE_NAME, "Polymer")
        .with_value(address::DEVICE_CHAIN_SIZE, 2_i32)
        .with_value(&address::device_chain_name(1), "Polymer")
        .with_value(&address::device_chain_name(2), "Delay+")
        .with_value(&address::device_param(1, "exists"), 1_i32)
        .with_value(&address::device_param(1, "name"), "Cutoff")
        .with_value(&address::device_param(1, "value"), 64_i32)
        .with_value(&address::device_param(1, "value/str"), "1.2 kHz")
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn test_commands_send_expected_messages() {
    let (daw, tools) = tools(DawModel::default());

    let status = assert_ok!(block_on(
        tools.execute(ToolCall::SetTempo { bpm: 128.0 })
    ));
    assert_eq!(status, "Tempo set to 128 BPM");

    let status = assert_ok!(block_on(tools.execute(ToolCall::SetTrackVolume {
        track_index: 3,
        volume: 100.0,
    })));
    assert_eq!(status, "Track 3 volume set to 100");

    assert_ok!(block_on(tools.execute(ToolCall::TransportPlay {})));
    assert_ok!(block_on(tools.execute(ToolCall::ToggleTrackMute { track_index: 2 })));

    let sent = daw.sent();
    assert_eq!(sent[0], Message::with_value(address::TEMPO, 128.0_f32));
    assert_eq!(sent[1], Message::with_value(address::track(3, "volume"), 100.0_f32));
    assert_eq!(sent[2], Message::bare(address::PLAY));
    assert_eq!(sent[3], Message::bare(address::track(2, "mute")));
}

#[test]
fn test_device_commands() {
    let (daw, tools) = tools(DawModel::default());

    let calls = [
        (json!({ "direction": "next" }), "navigate_device", "Navigated to next device"),
        (json!({ "sibling_index": 4 }), "select_device_sibling", "Selected sibling device 4"),
        (json!({ "layer_index": 2 }), "enter_device_layer", "Entered device layer 2"),
        (Value::Null, "exit_device_layer", "Exited device layer"),
        (Value::Null, "toggle_device_bypass", "Device bypass toggled"),
        (Value::Null, "toggle_device_window", "Device window toggled"),
    ];
    for (arguments, name, expected) in calls {
        assert_eq!(block_on(tools.invoke(name, arguments)).expect(name), expected);
    }

    let addresses: Vec<String> = daw.sent().iter().map(|m| m.address().to_string()).collect();
    assert_eq!(
        addresses,
        [
            address::DEVICE_NEXT.to_string(),
            address::device_sibling(4, "select"),
            address::device_layer(2, "select"),
            address::DEVICE_LAYER_PARENT.to_string(),
            address::DEVICE_BYPASS.to_string(),
            address::DEVICE_WINDOW.to_string(),
        ]
    );
}

#[test]
fn test_invalid_arguments_send_nothing() {
    let (daw, tools) = tools(DawModel::default());

    let err = assert_err!(block_on(tools.invoke("set_tempo", json!({ "bpm": 700 }))));
    assert_eq!(err.kind, ErrorKind::BadInput);
    assert!(err.message.contains("tempo"));

    let err = assert_err!(block_on(tools.invoke("set_track_pan", json!({ "pan": 64 }))));
    assert_eq!(err.kind, ErrorKind::BadInput);

    let err = assert_err!(block_on(tools.invoke("no_such_tool", Value::Null)));
    assert_eq!(err.kind, ErrorKind::BadInput);

    assert!(daw.sent().is_empty());
}

// ============================================================================
// Browser Tools
// ============================================================================

#[tokio::test]
async fn test_browse_tools_round_trip() {
    let (daw, tools) = tools(
        DawModel::default()
            .with_tabs(&["Everything", "Result"])
            .with_results(18),
    );

    let opened = tools
        .invoke("browse_open", json!({ "context": "device" }))
        .await
        .expect("open");
    assert_eq!(opened, "Browser opened for device (tab: Everything)");

    let selected = tools
        .invoke("browse_select_tab", json!({ "tab": "Result" }))
        .await
        .expect("tab");
    assert_eq!(selected, "Selected browser tab Result after 1 steps");

    let collected = tools.invoke("browse_collect", Value::Null).await.expect("collect");
    let collected: Vec<Value> = serde_json::from_str(&collected).expect("json");
    assert_eq!(collected.len(), 18);
    assert_eq!(collected[17]["page"], 2);

    let page = tools.read_resource("bitwig://browser/results").await.expect("resource");
    assert!(page.contains("18 collected"));

    tools.invoke("browse_cancel", Value::Null).await.expect("cancel");
    assert_eq!(daw.sent_count(address::BROWSER_CANCEL), 1);

    let err = tools.invoke("browse_commit", Value::Null).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::State);
    assert_eq!(
        tools.read_resource("bitwig://browser/tab").await.expect("tab"),
        "Browser: closed"
    );
}

// ============================================================================
// Resources
// ============================================================================

#[tokio::test]
async fn test_transport_and_track_resources() {
    let (_daw, tools) = tools(mixer_model());
    // Nothing is cached until the DAW has been asked to resend its state.
    let tools = tools.with_refresh_wait(Duration::from_millis(1));

    let transport = tools.read_resource("bitwig://transport").await.expect("transport");
    assert_eq!(
        transport,
        "Transport State:\nPlaying: true\nTempo: 120.5 BPM\nTime Signature: 7/8"
    );

    let tracks = tools.read_resource("bitwig://tracks").await.expect("tracks");
    assert!(tracks.starts_with("Tracks:\n\nTrack 1: Drums\n  Volume: 0.75\n  Mute: false"));
    assert!(tracks.contains("Track 2: Bass"));

    let track = tools.read_resource("bitwig://track/1").await.expect("track");
    assert!(track.starts_with("Track: Drums\nIndex: 1"));

    let err = tools.read_resource("bitwig://track/9").await.unwrap_err();
    assert!(matches!(err, Error::ResourceNotFound { .. }));
    let err = tools.read_resource("bitwig://track/x").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
    let err = tools.read_resource("bitwig://nowhere").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_device_resources() {
    init_tracing();
    let daw = FakeDaw::new(mixer_model());
    let tools = Tools::new(daw.clone()).with_refresh_wait(Duration::from_millis(1));

    let devices = tools.read_resource("bitwig://devices").await.expect("devices");
    assert_eq!(
        devices,
        "Active Device: Polymer\nDevice Chain Size: 2\n  1: Polymer\n  2: Delay+"
    );
    assert_eq!(daw.sent_count(address::REFRESH), 1);

    let parameters = tools
        .read_resource("bitwig://device/parameters")
        .await
        .expect("parameters");
    assert_eq!(parameters, "Device: Polymer\nParameters:\n  1: Cutoff = 64 (1.2 kHz)");

    assert_eq!(
        tools.read_resource("bitwig://device/siblings").await.expect("siblings"),
        "No sibling devices found"
    );
    assert_eq!(
        tools.read_resource("bitwig://device/layers").await.expect("layers"),
        "No device layers found or device does not support layers"
    );
}

#[test]
fn test_empty_cache_renders_placeholders() {
    let (_daw, tools) = tools(DawModel::default());

    assert_eq!(
        assert_ok!(block_on(tools.read_resource("bitwig://tracks"))),
        "No tracks found"
    );
    assert_eq!(
        assert_ok!(block_on(tools.read_resource("bitwig://devices"))),
        "No active device found"
    );
    assert!(list_resources().iter().all(|r| r.mime_type == "text/plain"));
}

#[tokio::test]
async fn test_status_resource_reports_controller_health() {
    init_tracing();
    let model = DawModel::default().with_value(address::TEMPO, 120.0_f32);
    let (_daw, controller) = UdpDaw::controller(model).await;
    let tools = Tools::new(controller.clone());

    assert!(controller.ping(Duration::from_secs(1)).await);
    let status = tools.read_resource("bitwig://status").await.expect("status");

    assert!(status.starts_with("Bridge Status:\nRunning: true\nHealthy: true"));
    assert!(status.contains("Consecutive Timeouts: 0"));
    assert!(status.contains("  Malformed: 0"));

    controller.shutdown().await;
    let status = tools.read_resource("bitwig://status").await.expect("status");
    assert!(status.contains("Running: false"));
}

#[test]
fn test_status_unavailable_without_diagnostics() {
    let (daw, tools) = tools(DawModel::default());

    assert_eq!(
        assert_ok!(block_on(tools.read_resource("bitwig://status"))),
        "Status unavailable"
    );
    assert!(daw.sent().is_empty());
}

#[test]
fn test_invalid_navigator_options_are_rejected() {
    let err = Tools::with_navigator_options(
        FakeDaw::new(DawModel::default()),
        fast_options().with_open_retries(0),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadInput);
}

// ============================================================================
// Prompts
// ============================================================================

#[test]
fn test_prompts_list_and_render() {
    let names: Vec<&str> = list_prompts().iter().map(|prompt| prompt.name).collect();
    assert_eq!(
        names,
        ["setup_mixing_session", "create_track_template", "optimize_track_settings"]
    );

    let message = render_prompt(
        "optimize_track_settings",
        &json!({ "track_type": "bass", "problem": "muddy" }),
    )
    .expect("render");
    assert!(message.text.contains("my bass track"));
    assert!(message.text.contains("it sounds muddy."));

    let err = ToolError::from(render_prompt("optimize_track_settings", &Value::Null).unwrap_err());
    assert_eq!(err.kind, ErrorKind::BadInput);
}
