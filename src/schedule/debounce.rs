//! Debounce Module
//!
//! Keyed last-call-wins scheduling. Each key holds at most one pending timer;
//! scheduling again under the same key aborts the previous timer.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Timer registered under one key.
#[derive(Debug)]
struct PendingTask {
    handle: JoinHandle<()>,
    /// Distinguishes this timer from a later replacement under the same key
    generation: u64,
}

type Registry = Arc<Mutex<HashMap<String, PendingTask>>>;

// == Debouncer ==
/// Registry of pending debounced tasks.
///
/// Clones share the registry. Scheduling requires a running Tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    pending: Registry,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Schedule ==
    /// Runs `task` once `delay` passes without another `schedule` under `key`.
    ///
    /// A still-pending task under `key` is aborted and replaced. A task that
    /// has already started running is not interrupted.
    pub fn schedule<F, Fut>(&self, key: impl Into<String>, delay: Duration, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        let deadline = Instant::now() + delay;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);

        let mut pending = lock(&self.pending);
        if let Some(previous) = pending.remove(&key) {
            previous.handle.abort();
            debug!(key = %key, "debounce: replaced pending call");
        }

        let registry = Arc::clone(&self.pending);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            sleep_until(deadline).await;
            {
                // Deregister before running so a call arriving mid-run schedules afresh.
                let mut pending = lock(&registry);
                if pending.get(&task_key).map(|t| t.generation) == Some(generation) {
                    pending.remove(&task_key);
                }
            }
            debug!(key = %task_key, "debounce: firing");
            task().await;
        });

        pending.insert(key, PendingTask { handle, generation });
    }

    // == Debounce ==
    /// Wraps `f` into a callable that debounces under `key` with `delay`.
    pub fn debounce<A, F, Fut>(&self, key: impl Into<String>, delay: Duration, f: F) -> Debounced<A>
    where
        A: Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Debounced {
            debouncer: self.clone(),
            key: key.into(),
            delay,
            f: Arc::new(move |args| f(args).boxed()),
        }
    }

    // == Cancel ==
    /// Aborts the pending task under `key`. Returns true if one was pending.
    pub fn cancel(&self, key: &str) -> bool {
        match lock(&self.pending).remove(key) {
            Some(task) => {
                task.handle.abort();
                debug!(key, "debounce: cancelled");
                true
            }
            None => false,
        }
    }

    /// Aborts every pending task.
    pub fn cancel_all(&self) {
        for (_, task) in lock(&self.pending).drain() {
            task.handle.abort();
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        lock(&self.pending).contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }
}

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<String, PendingTask>> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// == Debounced ==
/// Callable produced by [`Debouncer::debounce`]. Fire-and-forget.
pub struct Debounced<A> {
    debouncer: Debouncer,
    key: String,
    delay: Duration,
    f: Arc<dyn Fn(A) -> BoxFuture<'static, ()> + Send + Sync>,
}

impl<A: Send + 'static> Debounced<A> {
    /// Schedules the wrapped function with `args`, replacing any pending call.
    pub fn call(&self, args: A) {
        let f = Arc::clone(&self.f);
        self.debouncer
            .schedule(self.key.clone(), self.delay, move || f(args));
    }

    /// Drops the pending call, if any.
    pub fn cancel(&self) -> bool {
        self.debouncer.cancel(&self.key)
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending(&self.key)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            debouncer: self.debouncer.clone(),
            key: self.key.clone(),
            delay: self.delay,
            f: Arc::clone(&self.f),
        }
    }
}

impl<A> std::fmt::Debug for Debounced<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debounced")
            .field("key", &self.key)
            .field("delay", &self.delay)
            .finish()
    }
}
