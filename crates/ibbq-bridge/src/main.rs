//! ibbq-bridge - BLE thermometer to MQTT bridge.
//!
//! Run with: `cargo run -p ibbq-bridge`

use std::time::Duration;

use clap::Parser;
use tracing::info;

use ibbq_bridge::{Config, MqttRelay, supervisor};
use ibbq_core::RestartOverride;

/// Bridge an Inkbird iBBQ thermometer to an MQTT broker.
///
/// Configuration comes from IBBQ_* environment variables; the flags below
/// override them.
#[derive(Parser, Debug)]
#[command(name = "ibbq-bridge")]
#[command(version, about, long_about = None)]
struct Args {
    /// Device address (overrides IBBQ_DEVICE_ADDRESS).
    #[arg(short, long)]
    address: Option<String>,

    /// Seconds between reading uploads (overrides IBBQ_UPLOAD_PERIOD).
    #[arg(short, long)]
    period: Option<u64>,

    /// Temperature display unit, 'c' or 'f' (overrides IBBQ_TEMP_UNITS).
    #[arg(short, long)]
    units: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ibbq_bridge=info".parse()?)
                .add_directive("ibbq_core=info".parse()?),
        )
        .init();

    // Load configuration
    let mut config = Config::from_env()?;

    // Override config with CLI args
    if let Some(address) = args.address {
        config.device_address = address;
    }
    if let Some(period) = args.period {
        config.upload_period = Duration::from_secs(period);
    }
    if let Some(units) = args.units {
        config.units = units.parse()?;
    }
    config.validate()?;

    let restart = RestartOverride::new();
    let (mqtt, _event_loop) = MqttRelay::new(&config.mqtt, restart.clone());

    info!(
        "Starting ibbq-bridge for {} (upload every {:?})",
        config.device_address, config.upload_period
    );

    // The supervisor never returns; ctrl-c ends the process.
    tokio::select! {
        _ = supervisor::run(config, mqtt, restart) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    Ok(())
}
