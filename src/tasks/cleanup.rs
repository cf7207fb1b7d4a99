//! TTL Cleanup Task
//!
//! Opt-in background task that periodically sweeps expired cache entries.
//! The cache never starts this on its own.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::cancel::CancelToken;

/// Spawns a task calling [`TtlCache::cleanup`] every `interval`.
///
/// The task ends when `cancel` is cancelled; the returned handle can also be
/// aborted directly.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(TtlCache::<String>::new(Duration::from_secs(300)));
/// let cancel = CancelToken::new();
/// let handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(30), cancel.clone());
/// // Later, on teardown:
/// cancel.cancel();
/// ```
pub fn spawn_cleanup_task<V>(
    cache: Arc<TtlCache<V>>,
    interval: Duration,
    cancel: CancelToken,
) -> JoinHandle<()>
where
    V: Clone + Send + 'static,
{
    tokio::spawn(async move {
        info!("Starting TTL cleanup task with interval of {:?}", interval);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => {
                    info!("TTL cleanup task stopped");
                    return;
                }
            }

            let removed = cache.cleanup();
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
