//! Reconnection backoff policy and the remote restart override.
//!
//! The reconnect loop sleeps [`Backoff::wait_seconds`] between attempts.
//! Failures grow the wait by ×1.5 up to a ceiling; a successful connection
//! resets it. A remotely delivered [`RestartOverride`] replaces the next
//! wait outright: it is the operator's single-use, highest-priority
//! directive and is not subject to the growth ceiling.

use std::sync::{Arc, Mutex};

/// Wait before the first reconnection attempt, in seconds.
pub const INITIAL_BACKOFF: f64 = 1.0;

/// Ceiling for multiplicative backoff growth, in seconds.
pub const MAX_BACKOFF: f64 = 4.0;

/// Growth factor applied after each failed attempt.
const BACKOFF_MULTIPLIER: f64 = 1.5;

/// Floor for any wait, in seconds.
const MIN_BACKOFF: f64 = 1.0;

/// Stateful reconnection backoff.
#[derive(Debug, Clone)]
pub struct Backoff {
    value: f64,
    initial: f64,
    max: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(INITIAL_BACKOFF, MAX_BACKOFF)
    }
}

impl Backoff {
    /// Create a backoff starting at `initial` seconds and growing up to
    /// `max`.
    pub fn new(initial: f64, max: f64) -> Self {
        Self {
            value: initial.max(MIN_BACKOFF),
            initial,
            max,
        }
    }

    /// Seconds to wait before the next attempt.
    pub fn wait_seconds(&self) -> f64 {
        self.value
    }

    /// Reset to the initial wait after a successful connection.
    pub fn reset(&mut self) {
        self.value = self.initial.max(MIN_BACKOFF);
    }

    /// Grow the wait after a failed attempt, clamped to `[1, max]`.
    pub fn record_failure(&mut self) {
        self.value = (self.value * BACKOFF_MULTIPLIER).clamp(MIN_BACKOFF, self.max);
    }

    /// Adopt a remotely supplied wait.
    ///
    /// Floor-clamped to one second but deliberately not ceiling-clamped: the
    /// override is an explicit instruction, not a computed guess.
    pub fn adopt(&mut self, seconds: u64) {
        self.value = (seconds as f64).max(MIN_BACKOFF);
    }
}

/// A pending restart directive delivered over MQTT.
///
/// Written by the inbound-message task, consumed (at most once per value) by
/// the reconnect loop while it waits out a backoff. Cloning shares the same
/// underlying slot.
#[derive(Debug, Clone, Default)]
pub struct RestartOverride {
    pending: Arc<Mutex<Option<u64>>>,
}

impl RestartOverride {
    /// Create an empty override slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a directive, replacing any unconsumed one.
    pub fn set(&self, seconds: u64) {
        *self.pending.lock().unwrap() = Some(seconds);
    }

    /// Consume the pending directive, if any.
    pub fn take(&self) -> Option<u64> {
        self.pending.lock().unwrap().take()
    }
}
