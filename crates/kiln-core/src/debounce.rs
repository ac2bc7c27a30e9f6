//! Trailing-edge debounce for invalidation bursts.
//!
//! Editors tend to write several files per save. Each write produces an
//! invalidation, and without coalescing each one would try to resume the
//! paused compiler. [`Debouncer::trigger`] restarts a timer on every call and
//! only the last call of a burst fires the wrapped action, `delay` after it.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

/// Delay used by the develop session between the last invalidation and the
/// compiler resume.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

type DebouncedAction = Arc<dyn Fn() + Send + Sync + 'static>;

/// Armed timer plus a generation bumped on every re-arm or cancel.
///
/// A timer that wakes up after being superseded sees a stale generation and
/// exits without firing.
#[derive(Default)]
struct Timer {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Trailing-edge debouncer backed by tokio timers.
pub struct Debouncer {
    delay: Duration,
    action: DebouncedAction,
    runtime: Handle,
    timer: Arc<Mutex<Timer>>,
}

impl Debouncer {
    /// Create a debouncer that runs `action` on `runtime`.
    ///
    /// # Arguments
    ///
    /// * `delay` - Quiet period required before the action fires
    /// * `runtime` - Runtime the timer tasks are spawned on
    /// * `action` - Callback fired once per burst
    pub fn new<F>(delay: Duration, runtime: Handle, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            delay,
            action: Arc::new(action),
            runtime,
            timer: Arc::new(Mutex::new(Timer::default())),
        }
    }

    /// Configured quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Register a signal, resetting the timer.
    pub fn trigger(&self) {
        let mut timer = self.timer.lock();
        self.arm(&mut timer);
    }

    /// Reset the timer only if it is armed and has not fired yet.
    ///
    /// Returns `false` when there was nothing to reset, in which case the
    /// action either already ran or was never requested.
    pub fn restart_pending(&self) -> bool {
        let mut timer = self.timer.lock();
        if timer.handle.is_none() {
            return false;
        }
        self.arm(&mut timer);
        true
    }

    fn arm(&self, timer: &mut Timer) {
        if let Some(previous) = timer.handle.take() {
            previous.abort();
            trace!("debounce timer reset");
        }
        timer.generation += 1;

        let generation = timer.generation;
        let shared = Arc::clone(&self.timer);
        let action = Arc::clone(&self.action);
        let delay = self.delay;
        timer.handle = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut timer = shared.lock();
                if timer.generation != generation {
                    return;
                }
                timer.handle = None;
            }
            action();
        }));
    }

    /// Drop a pending timer without firing it.
    pub fn cancel(&self) {
        let mut timer = self.timer.lock();
        timer.generation += 1;
        if let Some(previous) = timer.handle.take() {
            previous.abort();
        }
    }

    /// Check whether a timer is armed and has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.timer.lock().handle.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn counting_debouncer(delay: Duration) -> (Debouncer, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&fired);
        let debouncer = Debouncer::new(delay, Handle::current(), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (debouncer, fired)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once_after_last_signal() {
        let (debouncer, fired) = counting_debouncer(DEFAULT_DEBOUNCE);

        for _ in 0..5 {
            debouncer.trigger();
            sleep(Duration::from_millis(100)).await;
        }
        // 100ms have passed since the last trigger
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(199)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());

        sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_leading_edge_invocation() {
        let (debouncer, fired) = counting_debouncer(Duration::from_millis(50));

        debouncer.trigger();
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_fire_separately() {
        let (debouncer, fired) = counting_debouncer(Duration::from_millis(50));

        debouncer.trigger();
        sleep(Duration::from_millis(60)).await;
        debouncer.trigger();
        debouncer.trigger();
        sleep(Duration::from_millis(60)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_pending_extends_armed_timer() {
        let (debouncer, fired) = counting_debouncer(Duration::from_millis(300));

        debouncer.trigger();
        sleep(Duration::from_millis(200)).await;
        assert!(debouncer.restart_pending());

        // 400ms after the first signal, 200ms after the restart
        sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(101)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_pending_after_fire_is_noop() {
        let (debouncer, fired) = counting_debouncer(Duration::from_millis(50));

        assert!(!debouncer.restart_pending());

        debouncer.trigger();
        sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        assert!(!debouncer.restart_pending());
        sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let (debouncer, fired) = counting_debouncer(Duration::from_millis(50));

        debouncer.trigger();
        debouncer.cancel();
        sleep(Duration::from_millis(100)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!debouncer.is_pending());
    }
}
