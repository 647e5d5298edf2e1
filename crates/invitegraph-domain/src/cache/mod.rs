//! Process-wide response cache with per-category TTL.
//!
//! Memoizes upstream responses by logical key so that the network builder and
//! the route handlers avoid duplicate upstream calls.
//!
//! # Semantics
//!
//! - Each [`CacheCategory`] maps to a fixed TTL chosen once at startup.
//! - An entry is live while `now - inserted_at < ttl`. Reads lazily evict
//!   expired entries.
//! - A write that finds the cache at capacity runs a cleanup pass first:
//!   all expired entries are purged, then, if still full, the oldest 20% by
//!   insertion time. This is an age cache, not an LRU; reads never refresh
//!   an entry.
//! - Entries are never updated in place; a re-fetch overwrites wholesale.
//! - Nothing is persisted. A restart starts cold.
//!
//! # Concurrency
//!
//! Entries live in a `DashMap`, so the cache can be shared as an
//! `Arc<ResponseCache>` across request tasks. Writes are serialized by a
//! mutex so the capacity check, cleanup and insert happen as one step;
//! reads never take it. [`ResponseCache::get_or_fetch`]
//! does not coalesce in-flight misses: concurrent callers with the same key
//! each invoke their producer.
//!
//! # Example
//!
//! ```rust,ignore
//! use invitegraph_domain::cache::{CacheCategory, CacheConfig, ResponseCache};
//!
//! let cache = ResponseCache::new(CacheConfig::default());
//! cache.set("user-v2:42", serde_json::json!({"id": 1}), CacheCategory::Profile);
//! assert!(cache.has("user-v2:42"));
//! ```

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{DomainError, DomainResult};

/// Share of the capacity purged by age when expiry alone does not free room.
const AGE_EVICTION_PERCENT: usize = 20;

/// Logical category of a cached payload; selects the TTL at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    /// Single profile / user records.
    Profile,
    /// Fully built network graphs.
    Network,
    /// Paginated invitation activity lists.
    Invitations,
    /// User search results.
    Search,
}

impl CacheCategory {
    /// All categories, in declaration order.
    pub const ALL: [CacheCategory; 4] = [
        CacheCategory::Profile,
        CacheCategory::Network,
        CacheCategory::Invitations,
        CacheCategory::Search,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheCategory::Profile => "profile",
            CacheCategory::Network => "network",
            CacheCategory::Invitations => "invitations",
            CacheCategory::Search => "search",
        }
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the response cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries held at once.
    pub max_capacity: usize,
    /// TTL for [`CacheCategory::Profile`] entries.
    pub profile_ttl: Duration,
    /// TTL for [`CacheCategory::Network`] entries.
    pub network_ttl: Duration,
    /// TTL for [`CacheCategory::Invitations`] entries.
    pub invitations_ttl: Duration,
    /// TTL for [`CacheCategory::Search`] entries.
    pub search_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1000,
            profile_ttl: Duration::from_secs(5 * 60),
            network_ttl: Duration::from_secs(10 * 60),
            invitations_ttl: Duration::from_secs(3 * 60),
            search_ttl: Duration::from_secs(2 * 60),
        }
    }
}

impl CacheConfig {
    /// Sets the maximum capacity. The cache raises a capacity of zero to one.
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Sets the TTL for one category.
    pub fn with_ttl(mut self, category: CacheCategory, ttl: Duration) -> Self {
        match category {
            CacheCategory::Profile => self.profile_ttl = ttl,
            CacheCategory::Network => self.network_ttl = ttl,
            CacheCategory::Invitations => self.invitations_ttl = ttl,
            CacheCategory::Search => self.search_ttl = ttl,
        }
        self
    }

    /// Returns the TTL configured for a category.
    pub fn ttl_for(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::Profile => self.profile_ttl,
            CacheCategory::Network => self.network_ttl,
            CacheCategory::Invitations => self.invitations_ttl,
            CacheCategory::Search => self.search_ttl,
        }
    }
}

/// Builds a cache key of the form `kind:part1:part2...`.
pub fn cache_key<I, P>(kind: &str, parts: I) -> String
where
    I: IntoIterator<Item = P>,
    P: fmt::Display,
{
    let mut key = kind.to_string();
    for part in parts {
        key.push(':');
        key.push_str(&part.to_string());
    }
    key
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: serde_json::Value,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= self.ttl
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    /// Entries currently held, expired or not.
    pub size: usize,
    /// Configured maximum number of entries.
    pub capacity: usize,
    /// Held entries whose TTL has elapsed but which were not yet evicted.
    pub expired: usize,
    /// Held entries still live.
    pub active: usize,
}

impl CacheStats {
    /// Share of live entries among held entries, formatted as `"x.y%"`.
    ///
    /// Returns `"0%"` when nothing is live.
    pub fn active_ratio_label(&self) -> String {
        if self.active == 0 {
            return "0%".to_string();
        }
        let ratio = self.active as f64 / (self.active + self.expired) as f64;
        format!("{:.1}%", ratio * 100.0)
    }
}

/// Key/value response cache with per-category TTL and capacity-bounded cleanup.
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    write_gate: Mutex<()>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("config", &self.config)
            .field("entry_count", &self.entries.len())
            .finish()
    }
}

impl ResponseCache {
    /// Creates a cache driven by the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache driven by the given clock.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let config = CacheConfig {
            max_capacity: config.max_capacity.max(1),
            ..config
        };
        Self {
            entries: DashMap::new(),
            write_gate: Mutex::new(()),
            config,
            clock,
        }
    }

    /// Returns the configuration for this cache.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the live payload stored under `key`.
    ///
    /// An expired entry is removed and reported as absent.
    ///
    /// # Metrics
    ///
    /// - `invitegraph_cache_hits_total` - Incremented on a live hit
    /// - `invitegraph_cache_misses_total` - Incremented on absence or expiry
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = self.clock.now();
        let result = self.live_payload(key, now);
        if result.is_some() {
            metrics::counter!("invitegraph_cache_hits_total").increment(1);
        } else {
            metrics::counter!("invitegraph_cache_misses_total").increment(1);
        }
        result
    }

    /// Returns the live payload under `key` decoded as `T`.
    ///
    /// A payload that no longer decodes as `T` is treated as absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = self.get(key)?;
        match serde_json::from_value(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Cached payload has unexpected shape, ignoring");
                None
            }
        }
    }

    /// Stores `value` under `key` with the TTL of `category`.
    ///
    /// Overwrites any previous entry for the key.
    pub fn set(&self, key: impl Into<String>, value: serde_json::Value, category: CacheCategory) {
        let key = key.into();
        // A poisoned gate guards no data, so it is still usable.
        let _gate = self
            .write_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let now = self.clock.now();
        if self.entries.len() >= self.config.max_capacity {
            self.cleanup(now);
        }

        self.entries.insert(
            key,
            CacheEntry {
                payload: value,
                inserted_at: now,
                ttl: self.config.ttl_for(category),
            },
        );
    }

    /// Serializes `value` and stores it under `key`.
    pub fn set_as<T: Serialize>(
        &self,
        key: impl Into<String>,
        value: &T,
        category: CacheCategory,
    ) -> DomainResult<()> {
        let payload =
            serde_json::to_value(value).map_err(|e| DomainError::CacheSerialization {
                message: e.to_string(),
            })?;
        self.set(key, payload, category);
        Ok(())
    }

    /// Returns whether a live entry exists for `key`, evicting it if expired.
    pub fn has(&self, key: &str) -> bool {
        self.live_payload(key, self.clock.now()).is_some()
    }

    /// Removes the entry for `key`. Returns whether one was present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns the number of held entries, including not-yet-evicted expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns size, capacity and the expired/active split.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let size = self.entries.len();
        let expired = self
            .entries
            .iter()
            .filter(|entry| entry.is_expired(now))
            .count();

        CacheStats {
            size,
            capacity: self.config.max_capacity,
            expired,
            active: size.saturating_sub(expired),
        }
    }

    /// Removes every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    /// Returns the cached value for `key`, or runs `producer` and caches its result.
    ///
    /// Only successful results are stored, under the TTL of `category`.
    /// Producer errors are returned unchanged and leave the cache untouched.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        producer: F,
        category: CacheCategory,
    ) -> DomainResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        if let Some(value) = self.get_as::<T>(key) {
            debug!(key, "Cache hit");
            return Ok(value);
        }

        debug!(key, %category, "Cache miss, fetching");
        let value = producer().await?;
        self.set_as(key, &value, category)?;
        Ok(value)
    }

    /// Spawns a background task that purges expired entries every `interval`.
    ///
    /// The task runs until the returned handle is aborted or the runtime stops.
    pub fn spawn_cleanup_task(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.purge_expired();
                if removed > 0 {
                    debug!(removed, remaining = cache.len(), "Periodic cache cleanup");
                }
            }
        })
    }

    fn live_payload(&self, key: &str, now: Instant) -> Option<serde_json::Value> {
        let expired = match self.entries.get(key) {
            None => return None,
            Some(entry) if !entry.is_expired(now) => return Some(entry.payload.clone()),
            Some(_) => true,
        };

        // The read guard above is released before removal.
        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        None
    }

    /// Frees room before an insert: expired entries first, then the oldest by age.
    fn cleanup(&self, now: Instant) {
        self.entries.retain(|_, entry| !entry.is_expired(now));

        let len = self.entries.len();
        let capacity = self.config.max_capacity;
        if len < capacity {
            return;
        }

        let by_age = capacity * AGE_EVICTION_PERCENT / 100;
        let to_remove = by_age.max(len + 1 - capacity);

        let mut ages: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.inserted_at))
            .collect();
        ages.sort_by_key(|(_, inserted_at)| *inserted_at);

        for (key, _) in ages.into_iter().take(to_remove) {
            self.entries.remove(&key);
        }

        debug!(
            removed = to_remove,
            remaining = self.entries.len(),
            "Cache at capacity, evicted oldest entries"
        );
    }
}

/// Registers response cache metric descriptions.
///
/// Call once during startup, after the metrics recorder is installed.
pub fn register_cache_metrics() {
    metrics::describe_counter!(
        "invitegraph_cache_hits_total",
        "Total number of response cache hits"
    );
    metrics::describe_counter!(
        "invitegraph_cache_misses_total",
        "Total number of response cache misses"
    );
}
