//! Debounce primitive: turns a rapidly changing value into a stabilized one
//! that only updates after the input has been quiet for the configured delay.
//!
//! At most one timer task is pending at a time. Each `update` aborts the
//! previous task and bumps a generation counter, so a timer that wakes late
//! can never publish a superseded value. Only the latest stable value is
//! observable; there is no history queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Quiet period used by the search overlay.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

pub struct Debouncer<T> {
    delay: Duration,
    generation: Arc<AtomicU64>,
    stable: Arc<watch::Sender<T>>,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { delay, generation: Arc::new(AtomicU64::new(0)), stable: Arc::new(tx), pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Feed a new raw value. Outside a tokio runtime there is no timer to
    /// wait on, so the value stabilizes immediately.
    pub fn update(&mut self, value: T) {
        let gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.abort_pending();

        let Ok(handle) = Handle::try_current() else {
            warn!("No tokio runtime, stabilizing without debounce");
            publish(&self.stable, value);
            return;
        };

        let generation = Arc::clone(&self.generation);
        let stable = Arc::clone(&self.stable);
        let delay = self.delay;
        self.pending = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == gen {
                publish(&stable, value);
            }
        }));
    }

    /// Most recently stabilized value.
    pub fn stable(&self) -> T {
        self.stable.borrow().clone()
    }

    /// Receiver notified each time the stabilized value actually changes.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.stable.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Drop any pending update; the stable value is left untouched.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.abort_pending();
    }

    /// Cancel any pending update and stabilize `value` immediately.
    pub fn reset(&mut self, value: T) {
        self.cancel();
        publish(&self.stable, value);
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

/// Store `value`, notifying receivers only when it differs from the current one.
fn publish<T: PartialEq>(stable: &watch::Sender<T>, value: T) {
    stable.send_if_modified(|current| {
        if *current == value {
            return false;
        }
        *current = value;
        true
    });
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
