//! Batch Processor Module
//!
//! Runs an ordered list of operations in consecutive fixed-size groups. Items
//! within a group run concurrently; the next group starts only after the whole
//! current group has resolved, so at most `batch_size` operations are ever
//! outstanding. Results come back in input order.

use std::future::Future;

use futures::future::{join_all, try_join_all};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::{PerfError, Result};

// == Batch Processor ==
#[derive(Debug, Clone, Copy)]
pub struct BatchProcessor {
    batch_size: usize,
}

impl BatchProcessor {
    // == Constructor ==
    /// Creates a processor running `batch_size` operations at a time.
    ///
    /// Returns `InvalidConfig` for a batch size of zero.
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(PerfError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    // == Process ==
    /// Applies `operation` to every item, chunk by chunk.
    ///
    /// Output order equals input order regardless of completion order.
    /// Empty input returns an empty vector without invoking `operation`.
    pub async fn process<T, R, F, Fut>(&self, items: Vec<T>, operation: F) -> Vec<R>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
    {
        let total = items.len();
        let mut results = Vec::with_capacity(total);
        let mut remaining = items.into_iter();

        loop {
            let chunk: Vec<T> = remaining.by_ref().take(self.batch_size).collect();
            if chunk.is_empty() {
                break;
            }
            debug!(
                "batch: running items {}..{} of {}",
                results.len(),
                results.len() + chunk.len(),
                total
            );
            results.extend(join_all(chunk.into_iter().map(&operation)).await);
        }

        results
    }

    /// Like [`process`](Self::process) for fallible operations: stops after
    /// the first chunk containing a failure and returns that failure.
    ///
    /// Later chunks are never started. Other operations in the failing chunk
    /// may be dropped before completion.
    pub async fn try_process<T, R, E, F, Fut>(
        &self,
        items: Vec<T>,
        operation: F,
    ) -> std::result::Result<Vec<R>, E>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = std::result::Result<R, E>>,
    {
        let mut results = Vec::with_capacity(items.len());
        let mut remaining = items.into_iter();

        loop {
            let chunk: Vec<T> = remaining.by_ref().take(self.batch_size).collect();
            if chunk.is_empty() {
                break;
            }
            results.extend(try_join_all(chunk.into_iter().map(&operation)).await?);
        }

        Ok(results)
    }

    /// Like [`process`](Self::process), checking `cancel` before each chunk.
    ///
    /// A chunk that has started always runs to completion; cancellation
    /// returns `BatchCancelled` with the number of items already completed.
    pub async fn process_with_cancel<T, R, F, Fut>(
        &self,
        items: Vec<T>,
        operation: F,
        cancel: &CancelToken,
    ) -> Result<Vec<R>>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
    {
        let mut results = Vec::with_capacity(items.len());
        let mut remaining = items.into_iter();

        loop {
            let chunk: Vec<T> = remaining.by_ref().take(self.batch_size).collect();
            if chunk.is_empty() {
                break;
            }
            if cancel.is_cancelled() {
                debug!(completed = results.len(), "batch: cancelled");
                return Err(PerfError::BatchCancelled {
                    completed: results.len(),
                });
            }
            results.extend(join_all(chunk.into_iter().map(&operation)).await);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(matches!(
            BatchProcessor::new(0),
            Err(PerfError::InvalidConfig(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_preserved_despite_completion_order() {
        let batch = BatchProcessor::new(3).unwrap();
        let items: Vec<u64> = (1..=10).collect();

        // Earlier items in each chunk finish last
        let results = batch
            .process(items, |x| async move {
                sleep(Duration::from_millis(100 - x * 5)).await;
                x * 2
            })
            .await;

        assert_eq!(results, vec![2, 4, 6, 8, 10, 12, 14, 16, 18, 20]);
    }

    #[tokio::test]
    async fn test_empty_input_never_invokes_operation() {
        let batch = BatchProcessor::new(4).unwrap();
        let calls = AtomicUsize::new(0);

        let results: Vec<u32> = batch
            .process(Vec::<u32>::new(), |x| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { x }
            })
            .await;

        assert!(results.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_bounded_by_batch_size() {
        let batch = BatchProcessor::new(4).unwrap();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        batch
            .process((0..17).collect::<Vec<u64>>(), |i| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(10 + i % 3)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .await;

        assert_eq!(peak.load(Ordering::SeqCst), 4);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_try_process_stops_at_failing_chunk() {
        let batch = BatchProcessor::new(2).unwrap();
        let calls = AtomicUsize::new(0);

        let result = batch
            .try_process(vec![1, 2, 3, 4, 5, 6], |x| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if x == 3 {
                        Err(format!("item {} failed", x))
                    } else {
                        Ok(x)
                    }
                }
            })
            .await;

        assert_eq!(result, Err("item 3 failed".to_string()));
        // Chunks [1,2] and [3,4] started, [5,6] did not
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_try_process_success() {
        let batch = BatchProcessor::new(2).unwrap();
        let result = batch
            .try_process(vec![1, 2, 3], |x| async move { Ok::<_, String>(x + 1) })
            .await;
        assert_eq!(result, Ok(vec![2, 3, 4]));
    }

    #[tokio::test]
    async fn test_process_with_cancel_stops_between_chunks() {
        let batch = BatchProcessor::new(2).unwrap();
        let token = CancelToken::new();

        let result = batch
            .process_with_cancel(
                vec![1, 2, 3, 4, 5],
                |x| {
                    if x == 2 {
                        token.cancel();
                    }
                    async move { x }
                },
                &token,
            )
            .await;

        assert!(matches!(
            result,
            Err(PerfError::BatchCancelled { completed: 2 })
        ));
    }
}
