//! Background polling that keeps controller caches warm.
//!
//! A sync loop is a tokio task ticking at a fixed interval. It holds only a
//! weak reference to its controller, so dropping the controller ends the loop
//! on the next tick even if nobody called `stop_sync`.

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::ApiError;

/// Default cadence for background refreshes.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Identity of a running sync loop. Cancelling is idempotent and also happens
/// on drop.
#[derive(Debug)]
pub struct SyncHandle {
    resource: &'static str,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!(resource = self.resource, "Background sync stopped");
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn a loop that runs `tick` every `period`, starting one period from now.
///
/// Tick errors are logged and swallowed; there is no caller waiting on them.
/// A tick that is still running when the next one is due delays it rather
/// than overlapping it.
pub fn spawn<C, F, Fut>(
    controller: &Arc<C>,
    period: Duration,
    resource: &'static str,
    tick: F,
) -> SyncHandle
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), ApiError>> + Send,
{
    let weak: Weak<C> = Arc::downgrade(controller);
    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(controller) = weak.upgrade() else {
                debug!(resource, "Controller dropped, ending background sync");
                break;
            };
            if let Err(e) = tick(controller).await {
                warn!(resource, error = %e, "Background sync tick failed");
            }
        }
    });

    info!(resource, period_secs = period.as_secs(), "Background sync started");
    SyncHandle {
        resource,
        task: Some(task),
    }
}

/// Holds at most one live `SyncHandle` for a controller.
#[derive(Debug, Default)]
pub struct SyncSlot {
    handle: Mutex<Option<SyncHandle>>,
}

impl SyncSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any running loop, then install the one produced by `start`.
    pub fn restart(&self, start: impl FnOnce() -> SyncHandle) {
        let mut slot = self.handle.lock();
        if let Some(mut previous) = slot.take() {
            previous.cancel();
        }
        *slot = Some(start());
    }

    pub fn stop(&self) {
        if let Some(mut handle) = self.handle.lock().take() {
            handle.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        ticks: AtomicUsize,
    }

    fn start(counter: &Arc<Counter>, fail: bool) -> SyncHandle {
        spawn(counter, Duration::from_secs(30), "counter", move |c: Arc<Counter>| async move {
            c.ticks.fetch_add(1, Ordering::SeqCst);
            if fail {
                Err(ApiError::Remote("offline".to_string()))
            } else {
                Ok(())
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let counter = Arc::new(Counter::default());
        let _handle = start(&counter, false);

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_do_not_stop_the_loop() {
        let counter = Arc::new(Counter::default());
        let _handle = start(&counter, true);

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_keeps_a_single_loop() {
        let counter = Arc::new(Counter::default());
        let slot = SyncSlot::new();
        slot.restart(|| start(&counter, false));
        slot.restart(|| start(&counter, false));
        assert!(slot.is_running());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let counter = Arc::new(Counter::default());
        let slot = SyncSlot::new();
        slot.restart(|| start(&counter, false));

        slot.stop();
        slot.stop();
        assert!(!slot.is_running());

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_ends_when_controller_dropped() {
        let counter = Arc::new(Counter::default());
        let handle = start(&counter, false);
        drop(counter);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(handle.is_finished());
    }
}
