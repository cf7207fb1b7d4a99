//! Layer Module
//!
//! Composition of cache, retry, ranking and classification into the
//! read-through fetch path used by callers such as a nearby search:
//! cache lookup, retried fetch on miss, ranking, cache fill, return.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::TtlCache;
use crate::cancel::CancelToken;
use crate::classify::{ErrorClassifier, RawError};
use crate::config::Config;
use crate::error::{PerfError, Result};
use crate::ranking::{Rankable, RankingOptimizer};
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::tasks::spawn_cleanup_task;

// == Perf Layer ==
/// Explicitly constructed resilience layer for values of type `V`.
///
/// Owns its cache and shares its classifier with the retry executor, so
/// exhausted fetches land in [`classifier`](Self::classifier)'s error log.
#[derive(Debug)]
pub struct PerfLayer<V> {
    cache: Arc<TtlCache<V>>,
    classifier: Arc<ErrorClassifier>,
    retry: RetryExecutor,
    policy: RetryPolicy,
    ranking: RankingOptimizer,
    max_ranked_items: usize,
}

impl<V: Clone + Send + 'static> PerfLayer<V> {
    // == Constructors ==
    pub fn new(
        cache: Arc<TtlCache<V>>,
        classifier: Arc<ErrorClassifier>,
        policy: RetryPolicy,
        ranking: RankingOptimizer,
        max_ranked_items: usize,
    ) -> Self {
        Self {
            retry: RetryExecutor::new(Arc::clone(&classifier)),
            cache,
            classifier,
            policy,
            ranking,
            max_ranked_items,
        }
    }

    /// Builds a layer from validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            Arc::new(TtlCache::new(config.default_ttl())),
            Arc::new(ErrorClassifier::new(config.error_log_capacity)),
            config.retry_policy(),
            RankingOptimizer::new(),
            config.max_ranked_items,
        ))
    }

    // == Accessors ==
    pub fn cache(&self) -> &Arc<TtlCache<V>> {
        &self.cache
    }

    pub fn classifier(&self) -> &Arc<ErrorClassifier> {
        &self.classifier
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    // == Fetch ==
    /// Returns the cached value under `key`, or fetches it through the retry
    /// executor and caches it for `ttl` (the cache default if None).
    ///
    /// Failures are not cached.
    pub async fn fetch<F, Fut, E>(&self, key: &str, ttl: Option<Duration>, operation: F) -> Result<V>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
        E: Into<RawError>,
    {
        self.fetch_with(key, ttl, None, operation).await
    }

    /// [`fetch`](Self::fetch) with an optional cancel token.
    pub async fn fetch_with<F, Fut, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        cancel: Option<&CancelToken>,
        operation: F,
    ) -> Result<V>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
        E: Into<RawError>,
    {
        let context = operation_name(key);
        self.cache
            .get_or_try_insert_with(key, ttl, || {
                debug!(key, "cache miss, fetching");
                self.retry
                    .execute_with(Some(context), cancel, operation, &self.policy)
            })
            .await
    }

    // == Cleanup ==
    /// Starts the opt-in background sweep for this layer's cache.
    pub fn spawn_cleanup(&self, interval: Duration, cancel: CancelToken) -> JoinHandle<()> {
        spawn_cleanup_task(Arc::clone(&self.cache), interval, cancel)
    }
}

impl<T: Rankable + Clone + Send + 'static> PerfLayer<Vec<T>> {
    // == Fetch Ranked ==
    /// Like [`fetch`](Self::fetch) for result lists: on a miss the fetched
    /// list is cut down to the configured maximum by the ranking optimizer
    /// before it is cached and returned.
    pub async fn fetch_ranked<F, Fut, E>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        operation: F,
    ) -> Result<Vec<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<Vec<T>, E>>,
        E: Into<RawError>,
    {
        let context = operation_name(key);
        self.cache
            .get_or_try_insert_with(key, ttl, || async {
                let items = self
                    .retry
                    .execute_with(Some(context), None, operation, &self.policy)
                    .await?;
                let fetched = items.len();
                let ranked = self.ranking.optimize(items, self.max_ranked_items);
                if ranked.len() < fetched {
                    debug!(key, fetched, kept = ranked.len(), "ranked and truncated results");
                }
                Ok::<_, PerfError>(ranked)
            })
            .await
    }
}

/// Operation part of a `<operation>_<params>` cache key.
fn operation_name(key: &str) -> &str {
    key.split('_').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Marker {
        rating: f64,
    }

    impl Rankable for Marker {
        fn rating(&self) -> Option<f64> {
            Some(self.rating)
        }

        fn distance(&self) -> Option<f64> {
            None
        }
    }

    fn fast_config() -> Config {
        Config {
            retry_base_delay_ms: 1,
            max_ranked_items: 3,
            ..Config::default()
        }
    }

    #[test]
    fn test_operation_name() {
        assert_eq!(operation_name("searchNearby_1_2"), "searchNearby");
        assert_eq!(operation_name("plain"), "plain");
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = Config {
            retry_max_attempts: 0,
            ..Config::default()
        };
        assert!(PerfLayer::<u32>::from_config(&config).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_hits_cache_after_first_success() {
        let layer: PerfLayer<String> = PerfLayer::from_config(&fast_config()).unwrap();
        let calls = Arc::new(AtomicU32::new(0));
        let key = CacheKey::new("placeDetails").part("abc").build();

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = layer
                .fetch(&key, None, move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, RawError>("details".to_string()) }
                })
                .await
                .unwrap();
            assert_eq!(value, "details");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(layer.cache().stats().hits, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_is_logged_and_not_cached() {
        let layer: PerfLayer<String> = PerfLayer::from_config(&fast_config()).unwrap();

        let err = layer
            .fetch("searchNearby_1_2", None, || async {
                Err::<String, _>(RawError::http(429, "rate limited"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PerfError::Exhausted { attempts: 3, .. }));
        assert!(layer.cache().is_empty());

        let log = layer.classifier().error_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].context.as_deref(), Some("searchNearby"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_ranked_truncates_before_caching() {
        let layer: PerfLayer<Vec<Marker>> = PerfLayer::from_config(&fast_config()).unwrap();

        let ranked = layer
            .fetch_ranked("searchNearby_x", None, || async {
                Ok::<_, RawError>(
                    [1.0, 5.0, 3.0, 4.0, 2.0]
                        .into_iter()
                        .map(|rating| Marker { rating })
                        .collect::<Vec<_>>(),
                )
            })
            .await
            .unwrap();

        let ratings: Vec<f64> = ranked.iter().map(|m| m.rating).collect();
        assert_eq!(ratings, vec![5.0, 4.0, 3.0]);
        assert_eq!(layer.cache().get("searchNearby_x"), Some(ranked));
    }
}
