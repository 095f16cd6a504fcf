//! The top-level reconnect loop.
//!
//! One session at a time: connect, bring the device up, stream until the
//! link drops, tear everything down, wait out the backoff, try again. The
//! loop has no terminal state; it ends only with the process.
//!
//! While waiting out a backoff the loop checks once a second for a remote
//! restart directive, which ends the wait immediately and becomes the next
//! backoff value.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use ibbq_core::{Backoff, Device, Error, ProbeSession, RestartOverride};

use crate::config::Config;
use crate::mqtt::MqttRelay;
use crate::relay::Relay;
use crate::scheduler::PeriodicTask;

/// Fixed period of the battery poll task.
const BATTERY_POLL_PERIOD: Duration = Duration::from_secs(300);

/// Bounded wait for a single notification pull.
const NOTIFICATION_WAIT: Duration = Duration::from_secs(1);

/// Tick granularity while waiting out a backoff.
const RESTART_CHECK_TICK: Duration = Duration::from_secs(1);

/// Run the bridge until the process is terminated.
pub async fn run(config: Config, mqtt: MqttRelay, restart: RestartOverride) {
    mqtt.subscribe("restart").await;
    mqtt.publish("connect", "0").await;

    let relay = Relay::new(mqtt.clone(), config.units);
    let mut backoff = Backoff::default();

    loop {
        info!("Connecting to {}", config.device_address);
        let fault = run_session(&config, &mqtt, &relay, &mut backoff).await;
        warn!("Session ended: {}", fault);
        mqtt.publish("connect", "0").await;

        let wait = backoff.wait_seconds();
        info!("Waiting {:.1}s before reconnecting", wait);
        match wait_for_restart(wait, &restart).await {
            Some(seconds) => {
                info!("Adopting remote restart value: {}s", seconds);
                backoff.adopt(seconds);
            }
            None => backoff.record_failure(),
        }
    }
}

/// Bring one session up and drive it until it faults.
///
/// Returns the fault that ended the session. Every exit path has stopped
/// the periodic tasks and dropped the BLE connection before returning, so
/// the caller can immediately reconnect.
async fn run_session(
    config: &Config,
    mqtt: &MqttRelay,
    relay: &Relay,
    backoff: &mut Backoff,
) -> Error {
    let session = match ProbeSession::connect(&config.device_address, config.units).await {
        Ok(session) => Arc::new(session),
        Err(e) => return e,
    };

    if let Err(e) = session.login().await {
        teardown(&session).await;
        return e;
    }
    if let Err(e) = session.enable_data().await {
        teardown(&session).await;
        return e;
    }

    info!("Connected to {}; streaming", config.device_address);
    mqtt.publish("connect", "1").await;
    backoff.reset();

    let upload = {
        let session = Arc::clone(&session);
        let relay = relay.clone();
        PeriodicTask::spawn("upload", config.upload_period, move || {
            let session = Arc::clone(&session);
            let relay = relay.clone();
            async move {
                relay.publish_latest(&session).await;
            }
        })
    };

    // First tick fires at once, so the battery level is reported right
    // after streaming starts rather than five minutes in.
    let battery = {
        let session = Arc::clone(&session);
        PeriodicTask::spawn("battery-poll", BATTERY_POLL_PERIOD, move || {
            let session = Arc::clone(&session);
            async move {
                if let Err(e) = session.request_battery().await {
                    warn!("battery poll failed: {}", e);
                }
            }
        })
    };

    let fault = notification_loop(&session).await;

    // Periodic tasks must be fully stopped before the link goes away so no
    // battery write races the next connection attempt.
    battery.stop().await;
    upload.stop().await;
    teardown(&session).await;
    fault
}

/// Pull notifications until a disconnect-class fault.
///
/// Transient faults are logged and the wait resumes; each pull is bounded
/// so the task stays responsive to shutdown.
async fn notification_loop(session: &ProbeSession<Device>) -> Error {
    loop {
        match session.wait_notification(NOTIFICATION_WAIT).await {
            Ok(_) => {}
            Err(e) if e.is_disconnect() => return e,
            Err(e) => warn!("transient fault while waiting for notifications: {}", e),
        }
    }
}

async fn teardown(session: &ProbeSession<Device>) {
    if let Err(e) = session.disconnect().await {
        debug!("disconnect during teardown failed: {}", e);
    }
}

/// Sleep up to `wait_seconds`, checking each second for a restart directive.
///
/// Returns the directive if one arrived (ending the wait early), `None` when
/// the wait ran its course.
async fn wait_for_restart(wait_seconds: f64, restart: &RestartOverride) -> Option<u64> {
    let mut remaining = wait_seconds;
    while remaining > 0.0 {
        if let Some(seconds) = restart.take() {
            return Some(seconds);
        }
        let step = remaining.min(RESTART_CHECK_TICK.as_secs_f64());
        tokio::time::sleep(Duration::from_secs_f64(step)).await;
        remaining -= step;
    }
    restart.take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_wait_runs_its_course_without_a_directive() {
        let restart = RestartOverride::new();
        let start = Instant::now();

        assert_eq!(wait_for_restart(4.0, &restart).await, None);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_directive_ends_the_wait_immediately() {
        let restart = RestartOverride::new();
        restart.set(10);
        let start = Instant::now();

        assert_eq!(wait_for_restart(4.0, &restart).await, Some(10));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_directive_mid_wait_is_picked_up_within_a_tick() {
        let restart = RestartOverride::new();
        let writer = restart.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            writer.set(7);
        });

        let start = Instant::now();
        assert_eq!(wait_for_restart(10.0, &restart).await, Some(7));
        assert!(start.elapsed() <= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_directive_in_the_last_tick_is_still_taken() {
        let restart = RestartOverride::new();
        let writer = restart.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            writer.set(3);
        });

        assert_eq!(wait_for_restart(2.0, &restart).await, Some(3));
    }
}
