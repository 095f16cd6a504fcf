//! Wire protocol for iBBQ thermometers: notification channels, command
//! payloads, and the notification decoder.
//!
//! Decoding is pure. The session layer owns all mutable reading state and
//! applies [`ProbeEvent`]s to it; malformed payloads surface as
//! [`ParseError`](crate::ParseError) so the caller can log and move on
//! without tearing the connection down.

use uuid::Uuid;

use crate::calibration::battery_percentage;
use crate::error::{ParseError, ParseResult};
use crate::uuid::{REALTIME_DATA, SETTINGS_RESULT};

// --- Command payloads ---

/// Credential payload written to [`ACCOUNT_VERIFY`](crate::uuid::ACCOUNT_VERIFY).
///
/// The device ignores every other write until it has seen this exact
/// sequence on the current connection.
pub const CREDENTIALS: [u8; 15] = [
    0x21, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, 0xB8, 0x22, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Start the real-time temperature stream.
pub const ENABLE_REALTIME_DATA: [u8; 6] = [0x0B, 0x01, 0x00, 0x00, 0x00, 0x00];

/// Request a battery voltage report on the settings-result channel.
pub const REQUEST_BATTERY: [u8; 6] = [0x08, 0x24, 0x00, 0x00, 0x00, 0x00];

/// Switch the device display to Celsius.
pub const UNITS_CELSIUS: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Switch the device display to Fahrenheit.
pub const UNITS_FAHRENHEIT: [u8; 6] = [0x02, 0x01, 0x00, 0x00, 0x00, 0x00];

/// Leading marker byte of a battery report frame.
pub const BATTERY_MARKER: u8 = 0x24;

/// Raw probe values at or above this are "no probe plugged in" sentinels.
pub const PROBE_DISCONNECTED_SENTINEL: u16 = 10_000;

// --- Notification channels ---

/// The two notifying characteristics a live session subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    /// Real-time temperature frames ([`REALTIME_DATA`]).
    Realtime,
    /// Command responses, battery reports included ([`SETTINGS_RESULT`]).
    SettingsResult,
}

impl Channel {
    /// Map a characteristic UUID onto its channel, if it is one we decode.
    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        if uuid == REALTIME_DATA {
            Some(Channel::Realtime)
        } else if uuid == SETTINGS_RESULT {
            Some(Channel::SettingsResult)
        } else {
            None
        }
    }

    /// The characteristic UUID this channel arrives on.
    pub fn uuid(self) -> Uuid {
        match self {
            Channel::Realtime => REALTIME_DATA,
            Channel::SettingsResult => SETTINGS_RESULT,
        }
    }
}

// --- Decoded events ---

/// A decoded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProbeEvent {
    /// One raw temperature per probe, device order, tenths of a degree
    /// Celsius regardless of the configured display unit.
    Temperatures(Vec<u16>),
    /// Battery charge percentage, `0..=100`.
    Battery(u8),
    /// A frame that is well-formed but not for us (for example a settings
    /// response without the battery marker).
    Ignored,
}

/// Decode a raw notification payload from the given channel.
///
/// Temperature frames are a run of little-endian u16 values, one per probe.
/// Battery frames carry [`BATTERY_MARKER`] at offset 0 followed by two
/// little-endian u16s (current and maximum voltage); any other marker means
/// the frame is a different settings response and decodes to
/// [`ProbeEvent::Ignored`].
pub fn decode(channel: Channel, data: &[u8]) -> ParseResult<ProbeEvent> {
    match channel {
        Channel::Realtime => decode_temperatures(data),
        Channel::SettingsResult => decode_settings_result(data),
    }
}

fn decode_temperatures(data: &[u8]) -> ParseResult<ProbeEvent> {
    if data.is_empty() {
        return Err(ParseError::Truncated {
            expected: 2,
            actual: 0,
        });
    }
    if data.len() % 2 != 0 {
        return Err(ParseError::OddLength(data.len()));
    }
    let values = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(ProbeEvent::Temperatures(values))
}

fn decode_settings_result(data: &[u8]) -> ParseResult<ProbeEvent> {
    let Some(&marker) = data.first() else {
        return Err(ParseError::Truncated {
            expected: 5,
            actual: 0,
        });
    };
    if marker != BATTERY_MARKER {
        return Ok(ProbeEvent::Ignored);
    }
    if data.len() < 5 {
        return Err(ParseError::Truncated {
            expected: 5,
            actual: data.len(),
        });
    }
    let current = u16::from_le_bytes([data[1], data[2]]);
    let max = u16::from_le_bytes([data[3], data[4]]);
    Ok(ProbeEvent::Battery(battery_percentage(current, max)))
}

// --- Temperature units ---

/// Display unit for published temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TempUnit {
    /// Degrees Celsius.
    Celsius,
    /// Degrees Fahrenheit.
    #[default]
    Fahrenheit,
}

/// Error returned when a temperature unit string is not recognised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown temperature unit '{0}' (expected 'c' or 'f')")]
pub struct UnknownUnit(pub String);

impl std::str::FromStr for TempUnit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(TempUnit::Celsius),
            "f" | "fahrenheit" => Ok(TempUnit::Fahrenheit),
            other => Err(UnknownUnit(other.to_string())),
        }
    }
}

impl TempUnit {
    /// The unit-selection command for this unit.
    pub fn command(self) -> &'static [u8] {
        match self {
            TempUnit::Celsius => &UNITS_CELSIUS,
            TempUnit::Fahrenheit => &UNITS_FAHRENHEIT,
        }
    }

    /// Convert a raw tenths-of-Celsius probe value into this display unit.
    pub fn convert(self, raw_tenths: u16) -> f64 {
        let celsius = f64::from(raw_tenths) / 10.0;
        match self {
            TempUnit::Celsius => celsius,
            TempUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Display label for logs.
    pub fn label(self) -> &'static str {
        match self {
            TempUnit::Celsius => "°C",
            TempUnit::Fahrenheit => "°F",
        }
    }
}
