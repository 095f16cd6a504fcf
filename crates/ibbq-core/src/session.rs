//! One BLE connection's lifecycle, from connect to disconnect.
//!
//! A [`ProbeSession`] walks the device through its bring-up sequence
//! (connect → login → enable streaming) and then routes incoming
//! notifications into [`LatestReadings`]. It is generic over [`GattLink`] so
//! the state machine runs identically over a real [`Device`] and the test
//! [`MockLink`](crate::MockLink).
//!
//! Exactly one session is live at a time; the reconnect loop tears the
//! current one down before building the next.

use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, warn};

use ibbq_types::uuid::{ACCOUNT_VERIFY, REALTIME_DATA, SETTINGS_DATA, SETTINGS_RESULT};
use ibbq_types::{CREDENTIALS, Channel, ENABLE_REALTIME_DATA, REQUEST_BATTERY, TempUnit, decode};

use crate::device::Device;
use crate::error::Result;
use crate::link::GattLink;
use crate::readings::LatestReadings;

/// Where a session is in its bring-up sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The link has dropped; the session is dead.
    Disconnected,
    /// Linked and subscribed, not yet authenticated.
    Connected,
    /// Credentials accepted; command writes are allowed.
    Authenticated,
    /// Real-time streaming enabled.
    Streaming,
}

/// A live session with one iBBQ thermometer.
pub struct ProbeSession<L> {
    link: L,
    unit: TempUnit,
    state: Mutex<SessionState>,
    readings: LatestReadings,
}

impl ProbeSession<Device> {
    /// Scan for and connect to the thermometer at `address`.
    pub async fn connect(address: &str, unit: TempUnit) -> Result<Self> {
        let device = Device::connect(address).await?;
        Self::establish(device, unit).await
    }
}

impl<L: GattLink> ProbeSession<L> {
    /// Build a session over an already-connected link.
    ///
    /// Subscribes to the two notification channels (real-time data and
    /// settings results) so nothing the device sends during bring-up is
    /// missed.
    pub async fn establish(link: L, unit: TempUnit) -> Result<Self> {
        link.subscribe(REALTIME_DATA).await?;
        link.subscribe(SETTINGS_RESULT).await?;
        Ok(Self {
            link,
            unit,
            state: Mutex::new(SessionState::Connected),
            readings: LatestReadings::new(),
        })
    }

    /// Current position in the bring-up sequence.
    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// The display unit this session was configured with.
    pub fn unit(&self) -> TempUnit {
        self.unit
    }

    fn set_state(&self, state: SessionState) {
        let mut current = self.state.lock().unwrap();
        debug!("session state {:?} -> {:?}", *current, state);
        *current = state;
    }

    /// Write the fixed credential payload.
    ///
    /// The device silently drops every command until this has been written
    /// once on the current connection.
    pub async fn login(&self) -> Result<()> {
        self.link.write(ACCOUNT_VERIFY, &CREDENTIALS).await?;
        self.set_state(SessionState::Authenticated);
        Ok(())
    }

    /// Select the display unit and start the real-time stream.
    pub async fn enable_data(&self) -> Result<()> {
        self.link.write(SETTINGS_DATA, self.unit.command()).await?;
        self.link.write(SETTINGS_DATA, &ENABLE_REALTIME_DATA).await?;
        self.set_state(SessionState::Streaming);
        Ok(())
    }

    /// Ask the device to report its battery voltage.
    ///
    /// The report arrives asynchronously on the settings-result channel.
    /// Disconnect-class faults are swallowed: this runs from a background
    /// timer, and the notification wait will surface the lost link anyway.
    /// Any other fault propagates.
    pub async fn request_battery(&self) -> Result<()> {
        match self.link.write(SETTINGS_DATA, &REQUEST_BATTERY).await {
            Err(e) if e.is_disconnect() => {
                debug!("battery poll skipped, link is down: {}", e);
                Ok(())
            }
            other => other,
        }
    }

    /// Pull one notification, waiting at most `wait`.
    ///
    /// Returns `Ok(true)` when a notification was delivered (whether or not
    /// it carried a reading), `Ok(false)` when the wait elapsed, and a
    /// disconnect-class error when the link has dropped. Malformed payloads
    /// are logged and discarded without failing the session.
    pub async fn wait_notification(&self, wait: Duration) -> Result<bool> {
        let notification = match self.link.next_notification(wait).await {
            Ok(Some(notification)) => notification,
            Ok(None) => return Ok(false),
            Err(e) => {
                if e.is_disconnect() {
                    self.set_state(SessionState::Disconnected);
                }
                return Err(e);
            }
        };

        let Some(channel) = Channel::from_uuid(notification.characteristic) else {
            debug!(
                "notification on unhandled characteristic {}",
                notification.characteristic
            );
            return Ok(true);
        };

        match decode(channel, &notification.value) {
            Ok(event) => {
                debug!("decoded {:?} from {:?}", event, channel);
                self.readings.apply(event);
            }
            Err(e) => {
                warn!("discarding malformed notification on {:?}: {}", channel, e);
            }
        }
        Ok(true)
    }

    /// Take the latest probe array if it changed since the last take.
    pub fn take_probes(&self) -> Option<Vec<Option<u16>>> {
        self.readings.take_probes()
    }

    /// Take the latest battery percentage if it changed since the last take.
    pub fn take_battery(&self) -> Option<u8> {
        self.readings.take_battery()
    }

    /// Tear the connection down.
    pub async fn disconnect(&self) -> Result<()> {
        self.set_state(SessionState::Disconnected);
        self.link.disconnect().await
    }
}
