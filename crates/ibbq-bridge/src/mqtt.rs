//! MQTT client for the bridge.
//!
//! [`MqttRelay`] wraps a rumqttc [`AsyncClient`]. Everything the bridge
//! publishes lives under the per-deployment feed path
//! (`{username}/feeds/ibbq`), with topic names joined by `.`.
//!
//! # Reconnection
//!
//! The event-loop task owns broker reconnection: rumqttc retries the
//! connection itself, and publish failures while the broker is away are
//! logged and dropped. The broker's last-will mechanism publishes
//! `connect` = 0 if the bridge dies without saying goodbye.
//!
//! # Inbound messages
//!
//! The only inbound topic is `restart`: an integer number of seconds that
//! overrides the reconnect loop's next backoff wait, delivered through a
//! shared [`RestartOverride`].

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ibbq_core::RestartOverride;

use crate::config::MqttConfig;

/// Client id presented to the broker.
const CLIENT_ID: &str = "ibbq-bridge";

/// Keep-alive interval for the broker connection.
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Pause after an event-loop error before rumqttc retries the connection.
const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

/// Capacity of the client's outgoing request queue.
const REQUEST_QUEUE: usize = 64;

/// Handle for publishing to and subscribing under the bridge's feed path.
#[derive(Clone)]
pub struct MqttRelay {
    client: AsyncClient,
    feed_path: String,
}

impl MqttRelay {
    /// Build the client and spawn its event-loop task.
    ///
    /// Inbound `restart` values are delivered into `restart`. The returned
    /// handle can be used to await or abort the event loop; dropping it is
    /// fine, the task keeps running.
    pub fn new(config: &MqttConfig, restart: RestartOverride) -> (Self, JoinHandle<()>) {
        let feed_path = config.feed_path();

        let mut options = MqttOptions::new(CLIENT_ID, &config.host, config.port);
        options.set_keep_alive(KEEP_ALIVE);
        // Persistent session: the broker keeps the restart subscription
        // alive across its own reconnects.
        options.set_clean_session(false);
        if !config.username.is_empty() {
            options.set_credentials(&config.username, &config.password);
        }
        options.set_last_will(LastWill::new(
            format!("{}.connect", feed_path),
            "0",
            QoS::AtMostOnce,
            false,
        ));

        let (client, event_loop) = AsyncClient::new(options, REQUEST_QUEUE);

        info!(
            "MQTT client for {}:{} with feed path '{}'",
            config.host, config.port, feed_path
        );

        let handle = tokio::spawn(run_event_loop(event_loop, feed_path.clone(), restart));

        (Self { client, feed_path }, handle)
    }

    /// The full topic for a name under the feed path.
    pub fn topic(&self, name: &str) -> String {
        format!("{}.{}", self.feed_path, name)
    }

    /// Publish a value; failures are logged and dropped.
    pub async fn publish(&self, name: &str, payload: impl Into<String>) {
        let topic = self.topic(name);
        let payload = payload.into();
        debug!("publishing '{}' to {}", payload, topic);
        if let Err(e) = self
            .client
            .publish(&topic, QoS::AtMostOnce, false, payload.into_bytes())
            .await
        {
            warn!("failed to publish to {}: {}", topic, e);
        }
    }

    /// Subscribe to a topic under the feed path; failures are logged.
    pub async fn subscribe(&self, name: &str) {
        let topic = self.topic(name);
        if let Err(e) = self.client.subscribe(&topic, QoS::AtMostOnce).await {
            warn!("failed to subscribe to {}: {}", topic, e);
        }
    }
}

/// Drive the rumqttc event loop and route inbound messages.
async fn run_event_loop(mut event_loop: EventLoop, feed_path: String, restart: RestartOverride) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!("MQTT connected: {:?}", ack.code);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                handle_inbound(&feed_path, &publish.topic, &publish.payload, &restart);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("MQTT connection error: {}. Reconnecting...", e);
                tokio::time::sleep(RECONNECT_PAUSE).await;
            }
        }
    }
}

/// Handle one inbound message.
fn handle_inbound(feed_path: &str, topic: &str, payload: &[u8], restart: &RestartOverride) {
    let Some(name) = topic
        .strip_prefix(feed_path)
        .and_then(|rest| rest.strip_prefix('.'))
    else {
        debug!("ignoring message on foreign topic '{}'", topic);
        return;
    };

    match name {
        "restart" => {
            let parsed = std::str::from_utf8(payload)
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok());
            match parsed {
                Some(seconds) => {
                    info!("restart override received: {}s", seconds);
                    restart.set(seconds);
                }
                None => warn!("ignoring restart message with non-integer payload"),
            }
        }
        other => debug!("ignoring message on '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "pitmaster/feeds/ibbq";

    #[test]
    fn test_restart_payload_sets_the_override() {
        let restart = RestartOverride::new();
        handle_inbound(FEED, "pitmaster/feeds/ibbq.restart", b"10", &restart);
        assert_eq!(restart.take(), Some(10));
    }

    #[test]
    fn test_restart_payload_is_trimmed() {
        let restart = RestartOverride::new();
        handle_inbound(FEED, "pitmaster/feeds/ibbq.restart", b" 7\n", &restart);
        assert_eq!(restart.take(), Some(7));
    }

    #[test]
    fn test_non_integer_restart_is_ignored() {
        let restart = RestartOverride::new();
        handle_inbound(FEED, "pitmaster/feeds/ibbq.restart", b"soon", &restart);
        assert_eq!(restart.take(), None);
    }

    #[test]
    fn test_foreign_topic_is_ignored() {
        let restart = RestartOverride::new();
        handle_inbound(FEED, "someone/else/feeds/ibbq.restart", b"10", &restart);
        assert_eq!(restart.take(), None);
    }

    #[test]
    fn test_other_feed_topics_are_ignored() {
        let restart = RestartOverride::new();
        handle_inbound(FEED, "pitmaster/feeds/ibbq.connect", b"10", &restart);
        assert_eq!(restart.take(), None);
    }
}
