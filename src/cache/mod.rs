//! Cache Module
//!
//! Provides an in-memory cache with per-entry TTL, lazy expiry on read and an
//! explicit sweep.

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::CacheKey;
pub use stats::CacheStats;
pub use store::TtlCache;

use std::time::Duration;

// == Public Constants ==
/// Default TTL for detail lookups
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// TTL for short-lived results such as nearby searches
pub const SHORT_CACHE_TTL: Duration = Duration::from_secs(2 * 60);
