//! perfkit - Client-side performance and resilience layer
//!
//! Provides a TTL cache, debounce/throttle schedulers, retry with exponential
//! backoff, bounded-concurrency batching, result ranking and error
//! classification.

pub mod batch;
pub mod cache;
pub mod cancel;
pub mod classify;
pub mod config;
pub mod error;
pub mod layer;
pub mod ranking;
pub mod retry;
pub mod schedule;
pub mod tasks;

pub use batch::BatchProcessor;
pub use cache::{CacheKey, TtlCache};
pub use cancel::CancelToken;
pub use classify::{ErrorClassifier, ErrorCode, ErrorRecord, RawError};
pub use config::Config;
pub use error::{PerfError, Result};
pub use layer::PerfLayer;
pub use ranking::{Rankable, RankingOptimizer};
pub use retry::{RetryExecutor, RetryPolicy};
pub use schedule::{throttle, Debouncer, Throttle};
pub use tasks::spawn_cleanup_task;
