//! Cache Key Module
//!
//! Builds composite keys of the form `<operation>_<param>_<param>...` so that
//! distinct parameter sets of one operation never share an entry.

use std::fmt::{self, Display};

use serde::Serialize;

// == Cache Key ==
/// Composite cache key builder.
///
/// ```
/// use perfkit::cache::CacheKey;
///
/// let key = CacheKey::new("searchNearby").part(37.77).part(-122.42).build();
/// assert_eq!(key, "searchNearby_37.77_-122.42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    key: String,
}

impl CacheKey {
    /// Starts a key for `operation`.
    pub fn new(operation: &str) -> Self {
        Self {
            key: operation.to_string(),
        }
    }

    /// Appends a scalar parameter using its Display form.
    pub fn part(mut self, value: impl Display) -> Self {
        self.key.push('_');
        self.key.push_str(&value.to_string());
        self
    }

    /// Appends a structured parameter serialized as compact JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> serde_json::Result<Self> {
        let encoded = serde_json::to_string(value)?;
        self.key.push('_');
        self.key.push_str(&encoded);
        Ok(self)
    }

    pub fn build(self) -> String {
        self.key
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.key
    }
}
