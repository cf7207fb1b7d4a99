//! perfkit demo
//!
//! Drives the layer through a simulated "search nearby" session against an
//! in-process flaky backend: debounced queries, retried and cached fetches,
//! ranking, batched detail lookups, throttled analytics and error reporting.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use perfkit::cache::SHORT_CACHE_TTL;
use perfkit::classify::{is_offline, RawError};
use perfkit::{
    throttle, BatchProcessor, CacheKey, CancelToken, Config, Debouncer, PerfLayer, Rankable,
};

#[derive(Debug, Clone, Serialize)]
struct Place {
    id: u32,
    rating: Option<f64>,
    distance: Option<f64>,
}

impl Rankable for Place {
    fn rating(&self) -> Option<f64> {
        self.rating
    }

    fn distance(&self) -> Option<f64> {
        self.distance
    }
}

#[derive(Debug, Serialize)]
struct SearchFilter {
    category: &'static str,
    radius_m: u32,
}

/// Backend that fails the first `failures` requests with a network error.
struct FlakyBackend {
    calls: AtomicU32,
    failures: u32,
}

impl FlakyBackend {
    async fn search_nearby(&self, lat: f64, lng: f64) -> Result<Vec<Place>, RawError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(20)).await;
        if call <= self.failures {
            return Err(RawError::new("Network request failed"));
        }
        Ok((0..120)
            .map(|id| Place {
                id,
                rating: (id % 4 != 0).then(|| f64::from(id % 50) / 10.0),
                distance: Some((lat.abs() + lng.abs() + f64::from(id)) % 15.0),
            })
            .collect())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perfkit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting perfkit demo");

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_ttl={}s, retry_max_attempts={}, retry_base_delay={}ms, max_ranked_items={}",
        config.default_ttl, config.retry_max_attempts, config.retry_base_delay_ms, config.max_ranked_items
    );

    let layer = Arc::new(PerfLayer::<Vec<Place>>::from_config(&config).context("invalid configuration")?);
    let shutdown = CancelToken::new();
    let cleanup_handle = config
        .cleanup_interval()
        .map(|interval| layer.spawn_cleanup(interval, shutdown.clone()));

    let backend = Arc::new(FlakyBackend {
        calls: AtomicU32::new(0),
        failures: 2,
    });

    // Rapid query edits collapse into a single search
    let debouncer = Debouncer::new();
    let (done_tx, mut done_rx) = tokio::sync::mpsc::channel::<usize>(1);
    let search = {
        let layer = Arc::clone(&layer);
        let backend = Arc::clone(&backend);
        debouncer.debounce("searchNearby", Duration::from_millis(300), move |(lat, lng): (f64, f64)| {
            let layer = Arc::clone(&layer);
            let backend = Arc::clone(&backend);
            let done_tx = done_tx.clone();
            async move {
                let filter = SearchFilter { category: "cafe", radius_m: 1500 };
                let key = match CacheKey::new("searchNearby").part(lat).part(lng).json(&filter) {
                    Ok(key) => key.build(),
                    Err(err) => {
                        warn!("Could not build cache key: {}", err);
                        return;
                    }
                };
                match layer
                    .fetch_ranked(&key, Some(SHORT_CACHE_TTL), || backend.search_nearby(lat, lng))
                    .await
                {
                    Ok(places) => {
                        info!("Search returned {} places", places.len());
                        let _ = done_tx.send(places.len()).await;
                    }
                    Err(err) => {
                        warn!("Search failed: {}", err.user_message());
                        let _ = done_tx.send(0).await;
                    }
                }
            }
        })
    };
    for lat in [48.850, 48.851, 48.852, 48.853, 48.854] {
        search.call((lat, 2.35));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let shown = done_rx.recv().await.unwrap_or(0);
    info!(
        "Debounced search finished: {} markers shown after {} backend calls",
        shown,
        backend.calls.load(Ordering::SeqCst)
    );

    // Same parameters again: served from cache, no backend call
    let key = CacheKey::new("searchNearby")
        .part(48.854)
        .part(2.35)
        .json(&SearchFilter { category: "cafe", radius_m: 1500 })?
        .build();
    let cached = layer
        .fetch_ranked(&key, Some(SHORT_CACHE_TTL), || backend.search_nearby(48.854, 2.35))
        .await?;
    info!(
        "Cached lookup returned {} places, cache stats: {}",
        cached.len(),
        serde_json::to_string(&layer.cache().stats())?
    );

    // Detail lookups for the top places, five at a time
    let batch = BatchProcessor::new(5)?;
    let details = batch
        .process(cached.iter().take(12).cloned().collect(), |place| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            format!("place-{} ({:.1} stars)", place.id, place.rating.unwrap_or(0.0))
        })
        .await;
    info!("Fetched {} place details, first: {:?}", details.len(), details.first());

    // Map pan events are throttled for analytics
    let track_pan = throttle(
        |zoom: u8| info!("analytics: map panned at zoom {}", zoom),
        Duration::from_millis(250),
    );
    let tracked = (0..10u8).filter(|zoom| track_pan.call(*zoom).is_some()).count();
    info!("Tracked {} of 10 pan events", tracked);

    // A permission failure surfaces a user-facing message
    let denied = layer
        .fetch("placePhotos_42", None, || async {
            Err::<Vec<Place>, _>(RawError::http(403, "API key rejected"))
        })
        .await;
    if let Err(err) = denied {
        warn!("Photos unavailable: {}", err.user_message());
    }

    let offline = is_offline(&RawError::new("Network request failed"));
    info!("Offline check on a network failure: {}", offline);

    for record in layer.classifier().error_log() {
        info!("logged error: {}", serde_json::to_string(&record)?);
    }
    layer.classifier().clear_error_log();

    shutdown.cancel();
    if let Some(handle) = cleanup_handle {
        handle.await?;
    }
    info!("Demo complete");
    Ok(())
}
