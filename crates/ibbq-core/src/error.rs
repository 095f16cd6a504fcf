//! Error types for ibbq-core.
//!
//! Faults come in two classes and the reconnect logic treats them very
//! differently:
//!
//! - **disconnect-class** ([`Error::is_disconnect`] returns `true`): the BLE
//!   link is gone. The session is dead and the supervisor should tear it down
//!   and re-enter its backoff loop. Background callers (the battery poll) may
//!   swallow these, since the notification wait will surface the same
//!   condition.
//! - **everything else**: a local, possibly transient problem with one
//!   operation. These propagate so the caller can decide; swallowing them
//!   blanket-style would hide real faults.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when communicating with an iBBQ thermometer.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Device not found during scan.
    #[error("device '{identifier}' not found after scanning for {duration:?}")]
    DeviceNotFound {
        /// The address that was searched for.
        identifier: String,
        /// How long the scan ran.
        duration: Duration,
    },

    /// No Bluetooth adapter available.
    #[error("no Bluetooth adapter available")]
    NoAdapter,

    /// The notification stream ended or the link dropped mid-session.
    #[error("connection to device lost")]
    Disconnected,

    /// Operation attempted while not connected to the device.
    #[error("not connected to device")]
    NotConnected,

    /// Required BLE characteristic not found on the device.
    #[error("characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID that was not found.
        uuid: Uuid,
    },

    /// Operation timed out.
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// Invalid configuration provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Whether this fault means the BLE link itself is gone.
    ///
    /// Disconnect-class faults are recoverable only by reconnecting; the
    /// supervisor reacts to them with its backoff loop, and background
    /// writers are allowed to swallow them.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Error::Disconnected
                | Error::NotConnected
                | Error::Bluetooth(btleplug::Error::NotConnected)
                | Error::Bluetooth(btleplug::Error::DeviceNotFound)
        )
    }
}

/// Result type alias using ibbq-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
