//! Throttle Module
//!
//! Leading-edge rate limiting: the first call fires, calls during the cooldown
//! are dropped (not queued), and the first call after it fires again.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

// == Throttle ==
/// Cooldown gate tracking the last time a call was let through.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_fired: Mutex<Option<Instant>>,
}

impl Throttle {
    // == Constructor ==
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: Mutex::new(None),
        }
    }

    // == Try Acquire ==
    /// Returns true and restarts the cooldown if `interval` has elapsed since
    /// the last admitted call (or none was admitted yet); false otherwise.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut last = self.lock();
        match *last {
            Some(fired) if now.saturating_duration_since(fired) < self.interval => {
                trace!("throttle: call dropped during cooldown");
                false
            }
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Forgets the last admitted call so the next one fires immediately.
    pub fn reset(&self) {
        *self.lock() = None;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn lock(&self) -> MutexGuard<'_, Option<Instant>> {
        self.last_fired
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// == Throttled ==
/// Function wrapped by a [`Throttle`].
#[derive(Debug)]
pub struct Throttled<F> {
    throttle: Throttle,
    f: F,
}

impl<F> Throttled<F> {
    /// Invokes the wrapped function unless the cooldown is active.
    ///
    /// Returns the function's output, or None if the call was dropped.
    pub fn call<A, R>(&self, args: A) -> Option<R>
    where
        F: Fn(A) -> R,
    {
        self.throttle.try_acquire().then(|| (self.f)(args))
    }

    pub fn reset(&self) {
        self.throttle.reset();
    }
}

/// Wraps `f` so it runs at most once per `interval`.
pub fn throttle<F>(f: F, interval: Duration) -> Throttled<F> {
    Throttled {
        throttle: Throttle::new(interval),
        f,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_throttle_limits_calls() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let track = throttle(
            move |_: ()| {
                c.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(100),
        );

        track.call(());
        track.call(());
        track.call(());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(100)).await;
        track.call(());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_returns_output_only_when_fired() {
        let double = throttle(|x: u32| x * 2, Duration::from_secs(1));

        assert_eq!(double.call(21), Some(42));
        assert_eq!(double.call(5), None);

        tokio::time::advance(Duration::from_millis(999)).await;
        assert_eq!(double.call(5), None);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(double.call(5), Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_restarts_from_last_admitted_call() {
        let gate = Throttle::new(Duration::from_millis(100));

        assert!(gate.try_acquire());
        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(gate.try_acquire());
        tokio::time::advance(Duration::from_millis(60)).await;
        // Only 60ms since the second admitted call
        assert!(!gate.try_acquire());
    }

    #[test]
    fn test_reset() {
        let gate = Throttle::new(Duration::from_secs(60));
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
        gate.reset();
        assert!(gate.try_acquire());
    }
}
