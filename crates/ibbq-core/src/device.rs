//! BLE device connection for iBBQ thermometers.
//!
//! [`Device`] wraps a btleplug peripheral: it scans for the configured
//! address, connects, discovers the probe service, and exposes the
//! [`GattLink`] operations the session layer drives. Every BLE call is
//! wrapped in a timeout so a stalled stack cannot hang the bridge.

use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, ValueNotification,
    WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::{Stream, StreamExt};
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};
use uuid::Uuid;

use ibbq_types::uuid::SETTINGS_DATA;

use crate::error::{Error, Result};
use crate::link::{GattLink, Notification};

/// How long to scan before giving up on finding the device.
const SCAN_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for establishing the BLE connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for service discovery after connection.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for BLE characteristic write operations.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// A connected iBBQ thermometer.
///
/// This struct intentionally does not implement `Clone`: it owns an active
/// BLE connection, and cloning would make connection ownership ambiguous.
/// Share it across tasks with `Arc` instead.
pub struct Device {
    /// Kept alive for the lifetime of the peripheral connection; the
    /// peripheral may hold internal references to the adapter.
    #[allow(dead_code)]
    adapter: Adapter,
    peripheral: Peripheral,
    /// The identifier the device was found under.
    address: String,
    /// Discovered characteristics by UUID.
    characteristics: HashMap<Uuid, Characteristic>,
    /// The single notification stream for the connection.
    notifications: Mutex<Pin<Box<dyn Stream<Item = ValueNotification> + Send>>>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("address", &self.address)
            .field("characteristics", &self.characteristics.len())
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Scan for the thermometer at `address`, connect, and discover its
    /// services.
    ///
    /// `address` is the Bluetooth MAC address on Linux and Windows, or the
    /// CoreBluetooth peripheral UUID on macOS.
    #[tracing::instrument(level = "info", skip_all, fields(address = %address))]
    pub async fn connect(address: &str) -> Result<Self> {
        let adapter = default_adapter().await?;
        let peripheral = find_peripheral(&adapter, address).await?;

        info!("Connecting to {}", address);
        timeout(CONNECT_TIMEOUT, peripheral.connect())
            .await
            .map_err(|_| Error::timeout("connect to device", CONNECT_TIMEOUT))??;

        debug!("Discovering services");
        timeout(DISCOVERY_TIMEOUT, peripheral.discover_services())
            .await
            .map_err(|_| Error::timeout("discover services", DISCOVERY_TIMEOUT))??;

        let mut characteristics = HashMap::new();
        for service in peripheral.services() {
            for characteristic in &service.characteristics {
                characteristics.insert(characteristic.uuid, characteristic.clone());
            }
        }
        debug!("Discovered {} characteristics", characteristics.len());

        // A device without the settings characteristic is not an iBBQ
        // thermometer; fail before the session starts writing to it.
        if !characteristics.contains_key(&SETTINGS_DATA) {
            let _ = peripheral.disconnect().await;
            return Err(Error::CharacteristicNotFound {
                uuid: SETTINGS_DATA,
            });
        }

        let notifications = peripheral.notifications().await?;

        Ok(Self {
            adapter,
            peripheral,
            address: address.to_string(),
            characteristics,
            notifications: Mutex::new(notifications),
        })
    }

    /// The identifier this device was connected under.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Check if the device is connected (queries BLE stack state).
    pub async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    fn characteristic(&self, uuid: Uuid) -> Result<&Characteristic> {
        self.characteristics
            .get(&uuid)
            .ok_or(Error::CharacteristicNotFound { uuid })
    }
}

#[async_trait]
impl GattLink for Device {
    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<()> {
        let target = self.characteristic(characteristic)?;
        timeout(
            WRITE_TIMEOUT,
            self.peripheral
                .write(target, payload, WriteType::WithResponse),
        )
        .await
        .map_err(|_| Error::timeout(format!("write characteristic {}", characteristic), WRITE_TIMEOUT))??;
        Ok(())
    }

    async fn subscribe(&self, characteristic: Uuid) -> Result<()> {
        let target = self.characteristic(characteristic)?;
        self.peripheral.subscribe(target).await?;
        Ok(())
    }

    async fn next_notification(&self, wait: Duration) -> Result<Option<Notification>> {
        let mut stream = self.notifications.lock().await;
        match timeout(wait, stream.next()).await {
            Ok(Some(notification)) => Ok(Some(Notification {
                characteristic: notification.uuid,
                value: notification.value,
            })),
            // The stream only ends when the connection is gone.
            Ok(None) => Err(Error::Disconnected),
            Err(_) => Ok(None),
        }
    }

    async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

/// Get the first available Bluetooth adapter.
async fn default_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or(Error::NoAdapter)
}

/// Scan until a peripheral matching `address` appears.
///
/// The scan result cache is polled once a second so a device that advertises
/// mid-scan is picked up without waiting out the full window.
async fn find_peripheral(adapter: &Adapter, address: &str) -> Result<Peripheral> {
    adapter.start_scan(ScanFilter::default()).await?;

    let mut elapsed = Duration::ZERO;
    while elapsed < SCAN_TIMEOUT {
        sleep(Duration::from_secs(1)).await;
        elapsed += Duration::from_secs(1);

        for peripheral in adapter.peripherals().await? {
            if peripheral_matches(&peripheral, address) {
                let _ = adapter.stop_scan().await;
                debug!("Found {} after {:?}", address, elapsed);
                return Ok(peripheral);
            }
        }
    }

    let _ = adapter.stop_scan().await;
    Err(Error::DeviceNotFound {
        identifier: address.to_string(),
        duration: SCAN_TIMEOUT,
    })
}

/// Match a peripheral against a configured identifier.
///
/// Accepts the MAC address (Linux/Windows) or the platform peripheral id
/// (macOS, where MAC addresses are not exposed).
fn peripheral_matches(peripheral: &Peripheral, address: &str) -> bool {
    peripheral
        .address()
        .to_string()
        .eq_ignore_ascii_case(address)
        || peripheral.id().to_string().eq_ignore_ascii_case(address)
}
