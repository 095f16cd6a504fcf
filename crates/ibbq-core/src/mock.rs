//! Mock GATT link for testing without BLE hardware.
//!
//! [`MockLink`] implements [`GattLink`] over in-memory queues: tests script
//! notifications in, then assert on the writes and subscriptions the session
//! performed.
//!
//! # Features
//!
//! - **Scripted notifications**: queue frames for `next_notification` to
//!   deliver in order
//! - **Failure injection**: make every write fail with an error of your
//!   choosing
//! - **Stream closing**: simulate a dropped link mid-session

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::link::{GattLink, Notification};

type ErrorFactory = Box<dyn Fn() -> Error + Send + Sync>;

/// An in-memory [`GattLink`] for tests.
#[derive(Default)]
pub struct MockLink {
    notifications: Mutex<VecDeque<Notification>>,
    writes: Mutex<Vec<(Uuid, Vec<u8>)>>,
    subscriptions: Mutex<Vec<Uuid>>,
    write_failure: Mutex<Option<ErrorFactory>>,
    stream_closed: AtomicBool,
}

impl std::fmt::Debug for MockLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLink")
            .field("queued", &self.notifications.lock().unwrap().len())
            .field("writes", &self.writes.lock().unwrap().len())
            .field("stream_closed", &self.stream_closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl MockLink {
    /// Create a mock link with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notification for delivery.
    pub fn push_notification(&self, notification: Notification) {
        self.notifications.lock().unwrap().push_back(notification);
    }

    /// Close the notification stream, simulating a dropped link.
    ///
    /// Already-queued notifications are still delivered first.
    pub fn close_stream(&self) {
        self.stream_closed.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with the produced error.
    pub fn fail_writes_with<F>(&self, factory: F)
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        *self.write_failure.lock().unwrap() = Some(Box::new(factory));
    }

    /// Writes performed so far, in order.
    pub fn writes(&self) -> Vec<(Uuid, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }

    /// Characteristics subscribed to, in order.
    pub fn subscriptions(&self) -> Vec<Uuid> {
        self.subscriptions.lock().unwrap().clone()
    }
}

#[async_trait]
impl GattLink for MockLink {
    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<()> {
        if let Some(factory) = self.write_failure.lock().unwrap().as_ref() {
            return Err(factory());
        }
        self.writes
            .lock()
            .unwrap()
            .push((characteristic, payload.to_vec()));
        Ok(())
    }

    async fn subscribe(&self, characteristic: Uuid) -> Result<()> {
        self.subscriptions.lock().unwrap().push(characteristic);
        Ok(())
    }

    async fn next_notification(&self, wait: Duration) -> Result<Option<Notification>> {
        if let Some(notification) = self.notifications.lock().unwrap().pop_front() {
            return Ok(Some(notification));
        }
        if self.stream_closed.load(Ordering::SeqCst) {
            return Err(Error::Disconnected);
        }
        tokio::time::sleep(wait).await;
        Ok(None)
    }

    async fn disconnect(&self) -> Result<()> {
        self.stream_closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
