//! BLE session layer for Inkbird iBBQ thermometers.
//!
//! This crate owns one connection's lifecycle: scanning for the device,
//! connecting and discovering the probe service, walking the bring-up
//! sequence (login → unit select → stream enable), and folding incoming
//! notifications into latest-reading state with read-and-clear accessors.
//! It also carries the reconnection backoff policy the bridge's supervisor
//! drives.
//!
//! # Architecture
//!
//! - [`Device`] — btleplug-backed transport with per-operation timeouts
//! - [`GattLink`] — the trait seam between session logic and the transport
//!   (implemented by [`Device`] and by [`MockLink`] for tests)
//! - [`ProbeSession`] — the Disconnected → Connected → Authenticated →
//!   Streaming state machine and notification routing
//! - [`LatestReadings`] — dirty-flagged readings shared with the uploader
//! - [`Backoff`] / [`RestartOverride`] — reconnect pacing
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use ibbq_core::ProbeSession;
//! use ibbq_types::TempUnit;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = ProbeSession::connect("AA:BB:CC:DD:EE:FF", TempUnit::Fahrenheit).await?;
//!     session.login().await?;
//!     session.enable_data().await?;
//!
//!     loop {
//!         session.wait_notification(Duration::from_secs(1)).await?;
//!         if let Some(probes) = session.take_probes() {
//!             println!("probes: {:?}", probes);
//!         }
//!     }
//! }
//! ```

pub mod backoff;
pub mod device;
pub mod error;
pub mod link;
pub mod mock;
pub mod readings;
pub mod session;

pub use backoff::{Backoff, INITIAL_BACKOFF, MAX_BACKOFF, RestartOverride};
pub use device::Device;
pub use error::{Error, Result};
pub use link::{GattLink, Notification};
pub use mock::MockLink;
pub use readings::LatestReadings;
pub use session::{ProbeSession, SessionState};
