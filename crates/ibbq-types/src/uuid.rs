//! Bluetooth UUIDs for iBBQ thermometers.
//!
//! All iBBQ-family devices expose a single vendor service with five
//! characteristics. The 16-bit short UUIDs (`0xFFF0`..`0xFFF5`) are expanded
//! against the standard Bluetooth base UUID.

use uuid::{Uuid, uuid};

// --- iBBQ Service UUID ---

/// The vendor service that carries every iBBQ characteristic.
pub const PROBE_SERVICE: Uuid = uuid!("0000fff0-0000-1000-8000-00805f9b34fb");

// --- iBBQ Characteristic UUIDs ---

/// Settings result characteristic (notify).
///
/// Command responses arrive here, including battery voltage reports.
pub const SETTINGS_RESULT: Uuid = uuid!("0000fff1-0000-1000-8000-00805f9b34fb");

/// Account-and-verify characteristic (write).
///
/// The fixed credential payload must be written here once per connection
/// before the device accepts any other command.
pub const ACCOUNT_VERIFY: Uuid = uuid!("0000fff2-0000-1000-8000-00805f9b34fb");

/// History data characteristic (notify). Not used by the bridge.
pub const HISTORY_DATA: Uuid = uuid!("0000fff3-0000-1000-8000-00805f9b34fb");

/// Real-time data characteristic (notify).
///
/// Streams one little-endian u16 per probe, in tenths of a degree Celsius.
pub const REALTIME_DATA: Uuid = uuid!("0000fff4-0000-1000-8000-00805f9b34fb");

/// Settings data characteristic (write).
///
/// Unit selection, stream enable, and battery poll commands are written here.
pub const SETTINGS_DATA: Uuid = uuid!("0000fff5-0000-1000-8000-00805f9b34fb");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_uuid() {
        assert_eq!(
            PROBE_SERVICE.to_string(),
            "0000fff0-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_characteristic_uuids_share_the_base() {
        // Every characteristic is a short UUID on the Bluetooth base.
        for c in [
            SETTINGS_RESULT,
            ACCOUNT_VERIFY,
            HISTORY_DATA,
            REALTIME_DATA,
            SETTINGS_DATA,
        ] {
            assert!(c.to_string().ends_with("-0000-1000-8000-00805f9b34fb"));
        }
    }

    #[test]
    fn test_notify_channels_are_distinct() {
        assert_ne!(REALTIME_DATA, SETTINGS_RESULT);
    }
}
