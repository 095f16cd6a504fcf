//! MQTT bridge daemon for Inkbird iBBQ thermometers.
//!
//! This crate wires the ibbq-core session layer to an MQTT broker:
//!
//! - Connects to the configured thermometer and keeps reconnecting with
//!   backoff when the link drops
//! - Republishes the latest probe temperatures and battery level on a timer
//! - Accepts a remote `restart` message that overrides the next backoff wait
//!
//! # MQTT Topics
//!
//! All topics are rooted at the feed path `{username}/feeds/ibbq` and joined
//! with `.`:
//!
//! - `connect` — 0/1 liveness flag (also the connection's last will)
//! - `temp{N}` — Nth probe temperature in the configured display unit
//! - `battery` — battery percentage, 0-100
//! - `restart` — inbound only: integer seconds to use as the next backoff
//!
//! # Configuration
//!
//! Read once at startup from the environment:
//!
//! ```text
//! IBBQ_DEVICE_ADDRESS  device MAC address (required)
//! IBBQ_TEMP_UNITS      display unit, "c" or "f" (default "f")
//! IBBQ_MQTT_HOST       broker host (required)
//! IBBQ_MQTT_PORT       broker port (default 1883)
//! IBBQ_MQTT_USERNAME   broker username, also the feed path root
//! IBBQ_MQTT_PASSWORD   broker password
//! IBBQ_UPLOAD_PERIOD   seconds between uploads (required)
//! ```

pub mod config;
pub mod mqtt;
pub mod relay;
pub mod scheduler;
pub mod supervisor;

pub use config::{Config, ConfigError, MqttConfig};
pub use mqtt::MqttRelay;
pub use relay::Relay;
pub use scheduler::PeriodicTask;
