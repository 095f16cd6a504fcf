//! Latest-reading state fed by notifications and drained by the relay.
//!
//! Writers (the notification routing in the session) and readers (the upload
//! task) run on different tasks, so each field pairs its value with an
//! "updated since last read" flag and both sides of the hand-off go through
//! one mutex guard: an update can never be lost between a read and its
//! clear.

use std::sync::Mutex;

use ibbq_types::ProbeEvent;

/// Latest known readings for one session, with per-field dirty flags.
///
/// The probe array only ever grows: once the device has reported N probes,
/// later shorter frames update the probes they carry and leave the rest at
/// their last known values. Probes that have never reported are `None`.
#[derive(Debug, Default)]
pub struct LatestReadings {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    probes: Vec<Option<u16>>,
    probes_updated: bool,
    battery: Option<u8>,
    battery_updated: bool,
}

impl LatestReadings {
    /// Create empty reading state for a new session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a decoded notification.
    pub fn apply(&self, event: ProbeEvent) {
        match event {
            ProbeEvent::Temperatures(values) => self.record_temperatures(&values),
            ProbeEvent::Battery(percentage) => self.record_battery(percentage),
            ProbeEvent::Ignored => {}
        }
    }

    /// Record a temperature frame, growing the probe array if needed.
    pub fn record_temperatures(&self, values: &[u16]) {
        let mut inner = self.inner.lock().unwrap();
        if values.len() > inner.probes.len() {
            inner.probes.resize(values.len(), None);
        }
        for (index, value) in values.iter().enumerate() {
            inner.probes[index] = Some(*value);
        }
        inner.probes_updated = true;
    }

    /// Record a battery percentage.
    pub fn record_battery(&self, percentage: u8) {
        let mut inner = self.inner.lock().unwrap();
        inner.battery = Some(percentage);
        inner.battery_updated = true;
    }

    /// Take the probe array if it changed since the last take.
    ///
    /// Returns `None` when nothing new arrived; otherwise returns the full
    /// array and clears the dirty flag in the same critical section.
    pub fn take_probes(&self) -> Option<Vec<Option<u16>>> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.probes_updated {
            return None;
        }
        inner.probes_updated = false;
        Some(inner.probes.clone())
    }

    /// Take the battery percentage if it changed since the last take.
    pub fn take_battery(&self) -> Option<u8> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.battery_updated {
            return None;
        }
        inner.battery_updated = false;
        inner.battery
    }

    /// Number of probes observed so far.
    pub fn probe_count(&self) -> usize {
        self.inner.lock().unwrap().probes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_probes_is_read_and_clear() {
        let readings = LatestReadings::new();
        readings.record_temperatures(&[211, 225]);

        assert_eq!(readings.take_probes(), Some(vec![Some(211), Some(225)]));
        assert_eq!(readings.take_probes(), None);
    }

    #[test]
    fn test_probe_array_grows() {
        let readings = LatestReadings::new();
        readings.record_temperatures(&[211, 225]);
        readings.record_temperatures(&[211, 225, 198]);

        assert_eq!(
            readings.take_probes(),
            Some(vec![Some(211), Some(225), Some(198)])
        );
        assert_eq!(readings.probe_count(), 3);
    }

    #[test]
    fn test_probe_array_never_shrinks() {
        let readings = LatestReadings::new();
        readings.record_temperatures(&[211, 225, 198]);
        // A shorter frame updates the probes it carries and keeps the rest.
        readings.record_temperatures(&[300]);

        assert_eq!(
            readings.take_probes(),
            Some(vec![Some(300), Some(225), Some(198)])
        );
    }

    #[test]
    fn test_take_battery_is_read_and_clear() {
        let readings = LatestReadings::new();
        readings.record_battery(85);

        assert_eq!(readings.take_battery(), Some(85));
        assert_eq!(readings.take_battery(), None);

        readings.record_battery(84);
        assert_eq!(readings.take_battery(), Some(84));
    }

    #[test]
    fn test_empty_state_has_nothing_to_take() {
        let readings = LatestReadings::new();
        assert_eq!(readings.take_probes(), None);
        assert_eq!(readings.take_battery(), None);
    }

    #[test]
    fn test_ignored_event_changes_nothing() {
        let readings = LatestReadings::new();
        readings.apply(ProbeEvent::Ignored);
        assert_eq!(readings.take_probes(), None);
        assert_eq!(readings.take_battery(), None);
    }

    #[test]
    fn test_apply_routes_events() {
        let readings = LatestReadings::new();
        readings.apply(ProbeEvent::Temperatures(vec![211]));
        readings.apply(ProbeEvent::Battery(42));
        assert_eq!(readings.take_probes(), Some(vec![Some(211)]));
        assert_eq!(readings.take_battery(), Some(42));
    }
}
