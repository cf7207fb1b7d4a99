//! Retry Executor Module
//!
//! Re-invokes a fallible async operation with exponential backoff. The final
//! failure is classified, logged, and returned together with the attempt count.

use std::future::Future;
use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::classify::{ErrorClassifier, ErrorCode, RawError};
use crate::error::{PerfError, Result};
use crate::retry::RetryPolicy;

// == Retry Executor ==
/// Runs operations under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    classifier: Arc<ErrorClassifier>,
}

impl RetryExecutor {
    // == Constructor ==
    /// Creates an executor that records exhausted failures in `classifier`.
    pub fn new(classifier: Arc<ErrorClassifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    // == Execute ==
    /// Runs `operation` until it succeeds or `policy.max_attempts` is reached.
    ///
    /// Retry `n` (zero-indexed) waits `base_delay * 2^n` first. When attempts
    /// run out the last failure is classified and returned as
    /// [`PerfError::Exhausted`].
    pub async fn execute<F, Fut, T, E>(&self, operation: F, policy: &RetryPolicy) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<RawError>,
    {
        self.execute_with(None, None, operation, policy).await
    }

    /// [`execute`](Self::execute) with a context label for the error record
    /// and an optional cancel token.
    ///
    /// Cancellation is observed before each attempt, while an attempt is in
    /// flight (the attempt future is dropped), and during backoff sleeps.
    pub async fn execute_with<F, Fut, T, E>(
        &self,
        context: Option<&str>,
        cancel: Option<&CancelToken>,
        mut operation: F,
        policy: &RetryPolicy,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<RawError>,
    {
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                debug!(attempts, "retry loop cancelled before next attempt");
                return Err(PerfError::Cancelled { attempts });
            }
            attempts += 1;

            let outcome = match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(attempts, "retry loop cancelled during attempt");
                        return Err(PerfError::Cancelled { attempts });
                    }
                    outcome = operation() => outcome,
                },
                None => operation().await,
            };

            let raw: RawError = match outcome {
                Ok(value) => {
                    if attempts > 1 {
                        debug!("Operation succeeded after {} attempts", attempts);
                    }
                    return Ok(value);
                }
                Err(err) => err.into(),
            };

            let code = ErrorCode::from_raw(&raw);
            if !policy.retry_on.should_retry(&code) {
                debug!(%code, "Non-retryable error: {}", raw);
                let record = self.classifier.classify(raw, context);
                return Err(PerfError::Exhausted { record, attempts });
            }
            if attempts >= policy.max_attempts {
                warn!(
                    "Max attempts ({}) exhausted. Last error: {}",
                    policy.max_attempts, raw
                );
                let record = self.classifier.classify(raw, context);
                return Err(PerfError::Exhausted { record, attempts });
            }

            let delay = policy.delay_for(attempts - 1);
            warn!(
                "Attempt {} failed ({}): {}. Retrying in {:?}...",
                attempts, code, raw, delay
            );

            match cancel {
                Some(token) => tokio::select! {
                    _ = sleep(delay) => {}
                    _ = token.cancelled() => {
                        debug!(attempts, "retry loop cancelled during backoff");
                        return Err(PerfError::Cancelled { attempts });
                    }
                },
                None => sleep(delay).await,
            }
        }
    }
}
