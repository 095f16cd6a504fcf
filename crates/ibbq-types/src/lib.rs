//! Platform-agnostic protocol types for Inkbird iBBQ thermometers.
//!
//! This crate holds everything about the iBBQ wire protocol that does not
//! touch a Bluetooth stack: UUID constants, fixed command payloads, the
//! notification decoder, and the battery calibration curve. The session
//! layer (ibbq-core) feeds raw notification payloads through [`decode`] and
//! applies the resulting [`ProbeEvent`]s to its state.
//!
//! # Example
//!
//! ```
//! use ibbq_types::{Channel, ProbeEvent, decode};
//!
//! // A two-probe frame: 21.1 °C and 22.5 °C in raw tenths.
//! let frame = [0xD3, 0x00, 0xE1, 0x00];
//! let event = decode(Channel::Realtime, &frame).unwrap();
//! assert_eq!(event, ProbeEvent::Temperatures(vec![211, 225]));
//! ```

pub mod calibration;
pub mod error;
pub mod protocol;
pub mod uuid;

pub use calibration::battery_percentage;
pub use error::{ParseError, ParseResult};
pub use protocol::{
    BATTERY_MARKER, CREDENTIALS, Channel, ENABLE_REALTIME_DATA, PROBE_DISCONNECTED_SENTINEL,
    ProbeEvent, REQUEST_BATTERY, TempUnit, UNITS_CELSIUS, UNITS_FAHRENHEIT, UnknownUnit, decode,
};
