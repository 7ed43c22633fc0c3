//! Controller behavior over real loopback sockets.

mod common;

use std::time::{Duration, Instant};

use tokio::net::UdpSocket;

use bitwig_osc_bridge::protocol::{decode, encode};
use bitwig_osc_bridge::{
    AddressPattern, BridgeConfig, ConflictPolicy, Controller, Error, Message, address,
};
use common::{DawModel, UdpDaw, init_tracing};

/// A controller and a silent socket standing in for the DAW.
async fn setup() -> (Controller, UdpSocket) {
    init_tracing();
    let daw = UdpSocket::bind("127.0.0.1:0").await.expect("bind daw");
    let config = BridgeConfig::new()
        .with_send_port(daw.local_addr().expect("daw addr").port())
        .with_receive_port(0)
        .with_conflict_policy(ConflictPolicy::Reject);
    let controller = Controller::connect(config).await.expect("connect");
    (controller, daw)
}

async fn push(daw: &UdpSocket, controller: &Controller, message: Message) {
    daw.send_to(&encode(&message), controller.listen_addr())
        .await
        .expect("daw send");
}

async fn recv(daw: &UdpSocket) -> Message {
    let mut buf = [0u8; 1024];
    let (len, _) = daw.recv_from(&mut buf).await.expect("daw recv");
    decode(&buf[..len]).expect("decode")
}

#[tokio::test]
async fn test_timeout_is_deterministic() {
    let (controller, _daw) = setup().await;
    let timeout = Duration::from_millis(150);

    let started = Instant::now();
    let err = controller
        .send_and_wait(
            Message::bare("/tempo/raw"),
            AddressPattern::exact("/tempo/raw"),
            timeout,
        )
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout());
    assert!(err.is_unknown_outcome());
    assert!(elapsed >= timeout, "returned early after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "returned late after {elapsed:?}");
    assert_eq!(controller.pending_count(), 0);
    controller.shutdown().await;
}

#[tokio::test]
async fn test_waiters_are_isolated_by_pattern() {
    let (controller, daw) = setup().await;

    let volume = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller
                .send_and_wait(
                    Message::bare(address::track(1, "volume")),
                    AddressPattern::exact(address::track(1, "volume")),
                    Duration::from_secs(2),
                )
                .await
        })
    };
    let pan = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller
                .send_and_wait(
                    Message::bare(address::track(1, "pan")),
                    AddressPattern::exact(address::track(1, "pan")),
                    Duration::from_secs(2),
                )
                .await
        })
    };

    recv(&daw).await;
    recv(&daw).await;
    push(&daw, &controller, Message::with_value(address::track(1, "pan"), 64.0_f32)).await;
    push(&daw, &controller, Message::with_value(address::track(1, "volume"), 100.0_f32)).await;

    let pan = pan.await.expect("join").expect("pan reply");
    let volume = volume.await.expect("join").expect("volume reply");
    assert_eq!(pan.first_f64(), Some(64.0));
    assert_eq!(volume.first_f64(), Some(100.0));
    controller.shutdown().await;
}

#[tokio::test]
async fn test_conflicting_request_is_rejected() {
    let (controller, _daw) = setup().await;

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller
                .send_and_wait(
                    Message::bare(address::TEMPO),
                    AddressPattern::exact(address::TEMPO),
                    Duration::from_millis(300),
                )
                .await
        })
    };
    while controller.pending_count() == 0 {
        tokio::task::yield_now().await;
    }

    let err = controller
        .send_and_wait(
            Message::bare(address::TEMPO),
            AddressPattern::exact(address::TEMPO),
            Duration::from_millis(300),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConcurrentRequestConflict { .. }));

    assert!(first.await.expect("join").unwrap_err().is_timeout());
    controller.shutdown().await;
}

#[tokio::test]
async fn test_cache_keeps_most_recent_value() {
    let (controller, daw) = setup().await;
    let volume = address::track(2, "volume");

    push(&daw, &controller, Message::with_value(volume.as_str(), 10.0_f32)).await;
    push(&daw, &controller, Message::with_value(volume.as_str(), 90.0_f32)).await;

    // Datagrams on loopback arrive in order; wait for the second one.
    let deadline = Instant::now() + Duration::from_secs(2);
    while controller.get_cached(&volume).and_then(|m| m.first_f64()) != Some(90.0) {
        assert!(Instant::now() < deadline, "cache never saw the latest value");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let entry = controller.cached_entry(&volume).expect("entry");
    assert!(entry.age() < Duration::from_secs(2));
    assert_eq!(controller.cached_with_prefix(&address::track_prefix(2)).len(), 1);
    controller.shutdown().await;
}

#[tokio::test]
async fn test_fire_and_forget_does_not_populate_cache() -> anyhow::Result<()> {
    let (controller, daw) = setup().await;

    controller.fire_and_forget(Message::trigger(address::PLAY)).await?;

    assert_eq!(recv(&daw).await.address(), address::PLAY);
    assert!(controller.get_cached(address::PLAY).is_none());
    assert_eq!(controller.pending_count(), 0);
    controller.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_datagrams_after_shutdown_are_ignored() {
    let (controller, daw) = setup().await;
    controller.shutdown().await;
    assert!(!controller.is_running());

    push(&daw, &controller, Message::with_value(address::TEMPO, 99.0_f32)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(controller.get_cached(address::TEMPO).is_none());

    let err = controller
        .send_and_wait(
            Message::bare(address::TEMPO),
            AddressPattern::exact(address::TEMPO),
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ListenerStopped));
}

#[tokio::test]
async fn test_refresh_all_fills_cache() {
    init_tracing();
    let model = DawModel::default()
        .with_value(address::TEMPO, 120.0_f32)
        .with_value(&address::track(1, "name"), "Drums");
    let (_daw, controller) = UdpDaw::controller(model).await;

    controller
        .refresh_all(Duration::from_secs(1))
        .await
        .expect("first value");

    let deadline = Instant::now() + Duration::from_secs(2);
    while controller.get_cached(&address::track(1, "name")).is_none() {
        assert!(Instant::now() < deadline, "track name never arrived");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(
        controller.get_cached(address::TEMPO).and_then(|m| m.first_f64()),
        Some(120.0)
    );
    assert!(controller.ping(Duration::from_millis(500)).await);
    controller.shutdown().await;
}
