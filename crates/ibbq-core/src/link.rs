//! Trait abstraction over the GATT transport.
//!
//! [`GattLink`] is the seam between session logic and the Bluetooth stack:
//! [`Device`](crate::Device) implements it over btleplug, and
//! [`MockLink`](crate::MockLink) implements it in-memory for tests. The
//! session never touches a peripheral directly.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

/// A notification delivered by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// The characteristic the notification arrived on.
    pub characteristic: Uuid,
    /// Raw payload bytes.
    pub value: Vec<u8>,
}

/// Operations a connected GATT link must provide.
///
/// Implementations represent an *established* connection; constructing one is
/// transport-specific (see [`Device::connect`](crate::Device::connect)).
#[async_trait]
pub trait GattLink: Send + Sync {
    /// Write a payload to a characteristic, waiting for the device's ack.
    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<()>;

    /// Enable notification delivery for a characteristic.
    async fn subscribe(&self, characteristic: Uuid) -> Result<()>;

    /// Pull the next notification, waiting at most `wait`.
    ///
    /// Returns `Ok(None)` when the wait elapses with nothing to deliver, and
    /// [`Error::Disconnected`](crate::Error::Disconnected) when the
    /// notification stream has ended because the link dropped.
    async fn next_notification(&self, wait: Duration) -> Result<Option<Notification>>;

    /// Tear the connection down.
    async fn disconnect(&self) -> Result<()>;
}
