//! Translate latest readings into MQTT publishes.

use tracing::debug;

use ibbq_core::{GattLink, ProbeSession};
use ibbq_types::{PROBE_DISCONNECTED_SENTINEL, TempUnit};

use crate::mqtt::MqttRelay;

/// Publishes a session's pending readings on its feed topics.
#[derive(Clone)]
pub struct Relay {
    mqtt: MqttRelay,
    unit: TempUnit,
}

impl Relay {
    /// Create a relay publishing in the given display unit.
    pub fn new(mqtt: MqttRelay, unit: TempUnit) -> Self {
        Self { mqtt, unit }
    }

    /// Publish whatever changed since the last call.
    ///
    /// Each probe with a pending update goes to `temp{N}` (1-based);
    /// a pending battery update goes to `battery`. Probes that never
    /// reported, and raw values in the disconnected-probe sentinel range,
    /// are skipped. Publishing is fire-and-forget.
    pub async fn publish_latest<L: GattLink>(&self, session: &ProbeSession<L>) {
        if let Some(probes) = session.take_probes() {
            for (topic, payload) in probe_publishes(&probes, self.unit) {
                self.mqtt.publish(&topic, payload).await;
            }
        }

        if let Some(battery) = session.take_battery() {
            debug!("battery at {}%", battery);
            self.mqtt.publish("battery", battery.to_string()).await;
        }
    }
}

/// Build the `temp{N}` topic/payload pairs for a probe array.
fn probe_publishes(probes: &[Option<u16>], unit: TempUnit) -> Vec<(String, String)> {
    let mut publishes = Vec::new();
    for (index, probe) in probes.iter().enumerate() {
        let Some(raw) = probe else { continue };
        if *raw >= PROBE_DISCONNECTED_SENTINEL {
            debug!("probe {} is unplugged (raw {})", index + 1, raw);
            continue;
        }
        let value = format_temperature(unit.convert(*raw));
        debug!("probe {}: {}{}", index + 1, value, unit.label());
        publishes.push((format!("temp{}", index + 1), value));
    }
    publishes
}

/// Format a converted temperature as a compact decimal string.
fn format_temperature(value: f64) -> String {
    let rendered = format!("{:.2}", value);
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fahrenheit_conversion() {
        let publishes = probe_publishes(&[Some(211)], TempUnit::Fahrenheit);
        assert_eq!(publishes, vec![("temp1".to_string(), "69.98".to_string())]);
    }

    #[test]
    fn test_celsius_conversion() {
        let publishes = probe_publishes(&[Some(211)], TempUnit::Celsius);
        assert_eq!(publishes, vec![("temp1".to_string(), "21.1".to_string())]);
    }

    #[test]
    fn test_topics_are_one_based() {
        let publishes = probe_publishes(&[Some(200), Some(300)], TempUnit::Celsius);
        let topics: Vec<&str> = publishes.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(topics, vec!["temp1", "temp2"]);
    }

    #[test]
    fn test_sentinel_values_are_skipped() {
        let publishes = probe_publishes(
            &[Some(10_000), Some(0xFFF6), Some(211)],
            TempUnit::Celsius,
        );
        assert_eq!(publishes, vec![("temp3".to_string(), "21.1".to_string())]);
    }

    #[test]
    fn test_unreported_probes_are_skipped() {
        let publishes = probe_publishes(&[None, Some(211)], TempUnit::Celsius);
        assert_eq!(publishes, vec![("temp2".to_string(), "21.1".to_string())]);
    }

    #[test]
    fn test_zero_is_a_valid_reading() {
        // 0.0 °C is in range; only the sentinel band means "unplugged".
        let publishes = probe_publishes(&[Some(0)], TempUnit::Celsius);
        assert_eq!(publishes, vec![("temp1".to_string(), "0".to_string())]);
    }

    #[test]
    fn test_format_trims_trailing_zeros() {
        assert_eq!(format_temperature(69.98), "69.98");
        assert_eq!(format_temperature(21.1), "21.1");
        assert_eq!(format_temperature(70.0), "70");
    }
}
