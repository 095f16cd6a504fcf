//! Integration tests for ibbq-core
//!
//! These tests require an iBBQ thermometer in range and should be run with:
//! `cargo test --package ibbq-core -- --ignored --nocapture`
//!
//! Set the IBBQ_DEVICE_ADDRESS environment variable to the device's address:
//! `IBBQ_DEVICE_ADDRESS="AA:BB:CC:DD:EE:FF" cargo test --package ibbq-core -- --ignored`

use std::env;
use std::time::Duration;

use tokio::time::timeout;

use ibbq_core::{ProbeSession, SessionState};
use ibbq_types::TempUnit;

/// Default timeout for BLE operations.
const BLE_TIMEOUT: Duration = Duration::from_secs(30);

fn device_address() -> String {
    env::var("IBBQ_DEVICE_ADDRESS").expect("set IBBQ_DEVICE_ADDRESS to run hardware tests")
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_connect_and_bring_up() {
    let address = device_address();
    println!("Connecting to {}", address);

    let session = timeout(
        BLE_TIMEOUT,
        ProbeSession::connect(&address, TempUnit::Celsius),
    )
    .await
    .expect("connection timed out")
    .expect("failed to connect");

    assert_eq!(session.state(), SessionState::Connected);

    session.login().await.expect("login failed");
    session.enable_data().await.expect("enable_data failed");
    assert_eq!(session.state(), SessionState::Streaming);

    session.disconnect().await.expect("disconnect failed");
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_streaming_delivers_temperatures() {
    let address = device_address();

    let session = ProbeSession::connect(&address, TempUnit::Celsius)
        .await
        .expect("failed to connect");
    session.login().await.expect("login failed");
    session.enable_data().await.expect("enable_data failed");

    // The device sends a realtime frame roughly every second.
    let mut received = false;
    for _ in 0..15 {
        if session
            .wait_notification(Duration::from_secs(1))
            .await
            .expect("notification wait failed")
            && session.take_probes().is_some()
        {
            received = true;
            break;
        }
    }
    assert!(received, "no temperature frame within 15 seconds");

    session.disconnect().await.expect("disconnect failed");
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_battery_poll_round_trip() {
    let address = device_address();

    let session = ProbeSession::connect(&address, TempUnit::Celsius)
        .await
        .expect("failed to connect");
    session.login().await.expect("login failed");
    session.enable_data().await.expect("enable_data failed");
    session.request_battery().await.expect("battery poll failed");

    let mut battery = None;
    for _ in 0..15 {
        let _ = session.wait_notification(Duration::from_secs(1)).await;
        battery = session.take_battery();
        if battery.is_some() {
            break;
        }
    }

    let level = battery.expect("no battery report within 15 seconds");
    assert!(level <= 100);

    session.disconnect().await.expect("disconnect failed");
}
