//! Cancellable repeating tasks bound to a session's lifetime.
//!
//! Each [`PeriodicTask`] runs its action to completion before the next tick
//! is considered, so a slow action can never overlap itself. Stopping a task
//! cancels it *and waits for it to finish*, which is what lets the
//! supervisor guarantee no background write races a reconnect.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A repeating background task.
///
/// The first tick fires immediately on spawn; later ticks follow at the
/// given period.
pub struct PeriodicTask {
    name: &'static str,
    handle: JoinHandle<()>,
    token: CancellationToken,
}

impl PeriodicTask {
    /// Spawn a task running `action` every `period`.
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut action: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!("periodic task '{}' stopping", name);
                        break;
                    }
                    _ = ticker.tick() => action().await,
                }
            }
        });

        debug!("periodic task '{}' started ({:?})", name, period);
        Self {
            name,
            handle,
            token,
        }
    }

    /// Cancel the task and wait for it to finish.
    ///
    /// An action already in flight runs to completion first.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            debug!("periodic task '{}' ended abnormally: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_task(period: Duration) -> (PeriodicTask, Arc<AtomicU32>) {
        let count = Arc::new(AtomicU32::new(0));
        let task_count = Arc::clone(&count);
        let task = PeriodicTask::spawn("test", period, move || {
            let count = Arc::clone(&task_count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });
        (task, count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_fires_immediately() {
        let (task, count) = counting_task(Duration::from_secs(300));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_the_period() {
        let (task, count) = counting_task(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticking() {
        let (task, count) = counting_task(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(1)).await;
        task.stop().await;

        let at_stop = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), at_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_waits_for_the_action_in_flight() {
        let done = Arc::new(AtomicU32::new(0));
        let task_done = Arc::clone(&done);
        let task = PeriodicTask::spawn("slow", Duration::from_secs(5), move || {
            let done = Arc::clone(&task_done);
            async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                done.fetch_add(1, Ordering::SeqCst);
            }
        });

        // Let the first action start, then stop mid-flight.
        tokio::time::sleep(Duration::from_secs(1)).await;
        task.stop().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
