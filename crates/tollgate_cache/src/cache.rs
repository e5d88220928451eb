//! Bounded TTL response cache.

use crate::{CacheConfig, CacheStats, MAX_TTL_SECS};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tollgate_error::{CacheError, CacheErrorKind, ConfigError};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: JsonValue,
    expires_at: Instant,
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Entries plus their insertion order, guarded together.
#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    insertion_order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl CacheState {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.insertion_order.remove(&entry.seq);
        Some(entry)
    }

    /// Look up a live entry, deleting it if it has expired.
    fn live(&mut self, key: &str, now: Instant) -> Option<&CacheEntry> {
        if self.entries.get(key)?.is_expired(now) {
            debug!(key, "Cache entry expired, removing");
            self.remove(key);
            return None;
        }
        self.entries.get(key)
    }

    fn evict_oldest(&mut self) {
        if let Some((_, key)) = self.insertion_order.pop_first() {
            debug!(key = %key, "Evicting oldest cache entry");
            self.entries.remove(&key);
        }
    }
}

/// Process-local key/value store with per-entry expiry and a size bound.
///
/// Values are stored as JSON. When the cache is full, the oldest inserted
/// entry is evicted (FIFO); reads do not refresh an entry's position.
/// Overwriting a key moves it to the newest position without evicting
/// anything.
///
/// All operations take a short internal lock and are safe to call from many
/// tasks at once. [`get_or_set`](Self::get_or_set) does not collapse
/// concurrent misses: two callers missing the same key both run their
/// factory.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tollgate_cache::{CacheConfig, ResponseCache};
///
/// let cache = ResponseCache::new(CacheConfig::default().with_max_size(2)).unwrap();
/// cache.set("a", json!(1), None);
/// cache.set("b", json!(2), None);
/// cache.set("c", json!(3), None);
///
/// assert_eq!(cache.count(), 2);
/// assert!(!cache.has("a"));
/// assert_eq!(cache.get("c"), Some(json!(3)));
/// ```
#[derive(Debug)]
pub struct ResponseCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self {
            config: CacheConfig::default(),
            state: Mutex::new(CacheState::default()),
        }
    }
}

impl ResponseCache {
    /// Create a cache from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            enabled = config.enabled(),
            max_size = config.max_size(),
            default_ttl_secs = config.default_ttl_secs(),
            "Creating response cache"
        );
        Ok(Self {
            config,
            state: Mutex::new(CacheState::default()),
        })
    }

    /// A cache that stores nothing.
    pub fn disabled() -> Self {
        Self {
            config: CacheConfig::disabled(),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Whether values are stored at all.
    pub fn is_enabled(&self) -> bool {
        *self.config.enabled()
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch a live value.
    pub fn get(&self, key: &str) -> Option<JsonValue> {
        if !self.is_enabled() {
            return None;
        }
        let now = Instant::now();
        let value = self.state().live(key, now).map(|entry| entry.value.clone());
        debug!(key, hit = value.is_some(), "Cache lookup");
        value
    }

    /// Fetch a live value and decode it.
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the stored JSON does not decode as
    /// `T`. The entry is left in place.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                CacheError::new(CacheErrorKind::Deserialization {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }),
        }
    }

    /// Store a value, expiring after `ttl` (or the default TTL).
    ///
    /// TTLs longer than [`MAX_TTL_SECS`] are clamped to it.
    ///
    /// A no-op when the cache is disabled. Evicts the oldest entry when a new
    /// key would exceed `max_size`.
    pub fn set(&self, key: impl Into<String>, value: JsonValue, ttl: Option<Duration>) {
        if !self.is_enabled() {
            return;
        }
        let key = key.into();
        let ttl = ttl
            .unwrap_or_else(|| self.config.default_ttl())
            .min(Duration::from_secs(MAX_TTL_SECS));
        let Some(expires_at) = Instant::now().checked_add(ttl) else {
            warn!(key = %key, ttl_secs = ttl.as_secs(), "TTL out of clock range, not caching");
            return;
        };
        let max_size = *self.config.max_size();

        let mut state = self.state();
        if state.remove(&key).is_none() && state.entries.len() >= max_size {
            state.evict_oldest();
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.insertion_order.insert(seq, key.clone());
        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Stored cache entry");
        state.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at,
                seq,
            },
        );
    }

    /// Encode and store a value.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if `value` cannot be represented as JSON.
    pub fn set_as<T: Serialize>(
        &self,
        key: impl Into<String>,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let key = key.into();
        let json = serde_json::to_value(value).map_err(|e| {
            CacheError::new(CacheErrorKind::Serialization {
                key: key.clone(),
                reason: e.to_string(),
            })
        })?;
        self.set(key, json, ttl);
        Ok(())
    }

    /// Return the live value for `key`, or run `factory` and store its result.
    ///
    /// The factory runs at most once per call and only on a miss. Failed
    /// factories store nothing. No lock is held while the factory runs.
    ///
    /// # Errors
    ///
    /// Propagates the factory's error.
    #[instrument(skip(self, factory))]
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        factory: F,
        ttl: Option<Duration>,
    ) -> Result<JsonValue, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<JsonValue, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = factory().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    /// Remove an entry. Returns whether one was stored.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.state().remove(key).is_some();
        if removed {
            debug!(key, "Deleted cache entry");
        }
        removed
    }

    /// Whether a live entry exists. Expired entries are removed.
    pub fn has(&self, key: &str) -> bool {
        self.is_enabled() && self.state().live(key, Instant::now()).is_some()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut state = self.state();
        let cleared = state.entries.len();
        state.entries.clear();
        state.insertion_order.clear();
        info!(cleared, "Cleared response cache");
    }

    /// Remove expired entries, returning how many were removed.
    pub fn clear_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state();
        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            state.remove(key);
        }
        if !expired.is_empty() {
            info!(
                removed = expired.len(),
                remaining = state.entries.len(),
                "Cleared expired cache entries"
            );
        }
        expired.len()
    }

    /// Number of stored entries, including expired ones not yet removed.
    pub fn count(&self) -> usize {
        self.state().entries.len()
    }

    /// Snapshot of cache occupancy.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let state = self.state();
        let total_items = state.entries.len();
        let expired_items = state
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .count();
        let max_size = *self.config.max_size();
        let usage_percentage = if max_size == 0 {
            0.0
        } else {
            (total_items as f64 / max_size as f64 * 10_000.0).round() / 100.0
        };

        CacheStats {
            enabled: self.is_enabled(),
            total_items,
            valid_items: total_items - expired_items,
            expired_items,
            max_size,
            usage_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache(max_size: usize) -> ResponseCache {
        ResponseCache::new(
            CacheConfig::default()
                .with_max_size(max_size)
                .with_default_ttl_secs(10),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_exactly_at_ttl() {
        let cache = cache(10);
        cache.set("k", json!("v"), Some(Duration::from_secs(5)));

        tokio::time::advance(Duration::from_millis(4_999)).await;
        assert_eq!(cache.get("k"), Some(json!("v")));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_applies() {
        let cache = cache(10);
        cache.set("k", json!(1), None);
        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.has("k"));
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!cache.has("k"));
    }

    #[test]
    fn test_overwrite_moves_key_to_newest() {
        let cache = cache(2);
        cache.set("a", json!(1), None);
        cache.set("b", json!(2), None);
        cache.set("a", json!(10), None);
        assert_eq!(cache.count(), 2);

        cache.set("c", json!(3), None);
        assert!(!cache.has("b"));
        assert_eq!(cache.get("a"), Some(json!(10)));
    }

    #[test]
    fn test_reads_do_not_refresh_position() {
        let cache = cache(2);
        cache.set("a", json!(1), None);
        cache.set("b", json!(2), None);
        assert!(cache.get("a").is_some());
        cache.set("c", json!(3), None);
        assert!(!cache.has("a"));
        assert!(cache.has("b"));
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = ResponseCache::disabled();
        cache.set("k", json!(1), None);
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.count(), 0);
        assert!(!cache.stats().enabled);
    }

    #[test]
    fn test_typed_round_trip_and_decode_failure() {
        let cache = cache(4);
        cache.set_as("n", &vec![1u32, 2, 3], None).unwrap();
        assert_eq!(cache.get_as::<Vec<u32>>("n").unwrap(), Some(vec![1, 2, 3]));

        let err = cache.get_as::<String>("n").unwrap_err();
        assert!(matches!(err.kind, CacheErrorKind::Deserialization { .. }));
        assert_eq!(cache.get_as::<String>("missing").unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_is_clamped_not_overflowed() {
        let cache = cache(4);
        cache.set("forever", json!("v"), Some(Duration::MAX));
        assert_eq!(cache.get("forever"), Some(json!("v")));

        tokio::time::advance(Duration::from_secs(365 * 24 * 60 * 60)).await;
        assert!(cache.has("forever"));
        assert_eq!(cache.stats().expired_items, 0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(ResponseCache::new(CacheConfig::default().with_max_size(0)).is_err());
    }
}
