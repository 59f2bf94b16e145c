use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::modules::anime::domain::entities::{
    AnimeRecord, EmptyResult, EpisodeRecord, SearchPage, StreamServer, StreamingBundle,
};
use crate::modules::anime::domain::value_objects::StreamCategory;
use crate::modules::provider::domain::value_objects::SearchFilters;

/// Per-operation time-to-live settings
#[derive(Debug, Clone)]
pub struct CacheTtlConfig {
    pub trending: Duration,
    pub search: Duration,
    pub details: Duration,
    pub episodes: Duration,
    pub servers: Duration,
    pub streaming: Duration,
    pub genre: Duration,
    /// Entry cap per operation cache
    pub max_entries: usize,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            trending: Duration::from_secs(5 * 60),
            search: Duration::from_secs(3 * 60),
            details: Duration::from_secs(15 * 60),
            episodes: Duration::from_secs(10 * 60),
            servers: Duration::from_secs(60 * 60),
            streaming: Duration::from_secs(2 * 60 * 60),
            genre: Duration::from_secs(5 * 60),
            max_entries: 1000,
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub source: String,
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
    pub expired_cleanups: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }

    fn absorb(&mut self, other: CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.entries += other.entries;
        self.evictions += other.evictions;
        self.expired_cleanups += other.expired_cleanups;
    }
}

/// Cached entry with an absolute expiry
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// TTL cache for one operation of one source
///
/// Only non-empty values are stored. Concurrent misses on the same key are
/// collapsed: later callers wait for the first fetch and then re-read.
#[derive(Debug)]
pub struct TtlCache<V> {
    operation: &'static str,
    entries: DashMap<String, CacheEntry<V>>,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    cleanups: AtomicU64,
}

impl<V> TtlCache<V>
where
    V: Clone + EmptyResult,
{
    pub fn new(operation: &'static str, ttl: Duration, max_entries: usize) -> Self {
        Self {
            operation,
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            cleanups: AtomicU64::new(0),
        }
    }

    /// Fresh value for `key`, dropping it lazily if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let cached = self
            .entries
            .get(key)
            .and_then(|entry| (!entry.is_expired(now)).then(|| entry.value.clone()));

        match cached {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for {}:{}", self.operation, key);
                Some(value)
            }
            None => {
                if self
                    .entries
                    .remove_if(key, |_, entry| entry.is_expired(now))
                    .is_some()
                {
                    self.cleanups.fetch_add(1, Ordering::Relaxed);
                    debug!("Removed expired cache entry for {}:{}", self.operation, key);
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value; empty values are ignored
    pub fn insert(&self, key: String, value: V) {
        if value.is_empty_result() {
            return;
        }

        let now = Instant::now();
        self.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                expires_at: now + self.ttl,
            },
        );

        if self.entries.len() > self.max_entries {
            self.evict_oldest_entries();
        }
    }

    /// Cached value for `key`, or the result of `fetch` (cached when non-empty)
    pub async fn get_or_fetch<F, Fut>(&self, key: String, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }

        let slot = InFlightSlot::claim(&self.in_flight, &key);
        let guard = slot.lock.lock().await;

        // Someone else may have filled it while we waited
        let value = match self.get(&key) {
            Some(value) => value,
            None => {
                let value = fetch().await;
                self.insert(key.clone(), value.clone());
                value
            }
        };

        drop(guard);
        drop(slot);
        value
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        self.release_idle_locks();
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            self.cleanups.fetch_add(removed as u64, Ordering::Relaxed);
            debug!("Cleaned up {} expired {} entries", removed, self.operation);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.release_idle_locks();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.cleanups.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            source: String::new(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
            expired_cleanups: self.cleanups.load(Ordering::Relaxed),
        }
    }

    /// Drop per-key locks only the map itself still holds
    fn release_idle_locks(&self) {
        self.in_flight.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Evict oldest entries down to 90% of capacity
    fn evict_oldest_entries(&self) {
        let current_size = self.entries.len();
        if current_size <= self.max_entries {
            return;
        }

        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().created_at))
            .collect();
        by_age.sort_by_key(|(_, created_at)| *created_at);

        let target_size = (self.max_entries * 9) / 10;
        let to_evict = current_size.saturating_sub(target_size).max(1);

        for (key, _) in by_age.into_iter().take(to_evict) {
            self.entries.remove(&key);
        }
        self.evictions.fetch_add(to_evict as u64, Ordering::Relaxed);

        debug!(
            "Evicted {} old {} entries (was {}, now {})",
            to_evict,
            self.operation,
            current_size,
            self.entries.len()
        );
    }
}

/// One caller's claim on the per-key fetch lock
///
/// Dropping it (normally or because the fetching future was cancelled)
/// removes the lock from the map once no other caller holds it.
struct InFlightSlot<'a> {
    in_flight: &'a DashMap<String, Arc<Mutex<()>>>,
    key: &'a str,
    lock: Arc<Mutex<()>>,
}

impl<'a> InFlightSlot<'a> {
    fn claim(in_flight: &'a DashMap<String, Arc<Mutex<()>>>, key: &'a str) -> Self {
        let lock = in_flight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self {
            in_flight,
            key,
            lock,
        }
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        // Map's handle plus ours: nobody else is waiting on this key
        self.in_flight.remove_if(self.key, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) <= 2
        });
    }
}

/// All operation caches owned by one source
#[derive(Debug)]
pub struct AdapterCache {
    pub trending: TtlCache<SearchPage>,
    pub search: TtlCache<SearchPage>,
    pub details: TtlCache<Option<AnimeRecord>>,
    pub episodes: TtlCache<Vec<EpisodeRecord>>,
    pub servers: TtlCache<Vec<StreamServer>>,
    pub streaming: TtlCache<StreamingBundle>,
    pub genre: TtlCache<SearchPage>,
}

impl AdapterCache {
    pub fn new(config: &CacheTtlConfig) -> Self {
        let cap = config.max_entries;
        Self {
            trending: TtlCache::new("trending", config.trending, cap),
            search: TtlCache::new("search", config.search, cap),
            details: TtlCache::new("details", config.details, cap),
            episodes: TtlCache::new("episodes", config.episodes, cap),
            servers: TtlCache::new("servers", config.servers, cap),
            streaming: TtlCache::new("streaming", config.streaming, cap),
            genre: TtlCache::new("genre", config.genre, cap),
        }
    }

    pub fn search_key(query: &str, page: u32, filters: &SearchFilters) -> String {
        format!(
            "{}|{}|{}",
            query.trim().to_lowercase(),
            page,
            filters.cache_key()
        )
    }

    pub fn streaming_key(
        episode_id: &str,
        server: Option<&str>,
        category: StreamCategory,
    ) -> String {
        format!(
            "{}|{}|{}",
            episode_id,
            server.map(str::to_lowercase).unwrap_or_default(),
            category
        )
    }

    pub fn genre_key(genre: &str, page: u32) -> String {
        format!("{}|{}", genre.trim().to_lowercase(), page)
    }

    pub fn purge_expired(&self) -> usize {
        self.trending.purge_expired()
            + self.search.purge_expired()
            + self.details.purge_expired()
            + self.episodes.purge_expired()
            + self.servers.purge_expired()
            + self.streaming.purge_expired()
            + self.genre.purge_expired()
    }

    pub fn clear(&self) {
        self.trending.clear();
        self.search.clear();
        self.details.clear();
        self.episodes.clear();
        self.servers.clear();
        self.streaming.clear();
        self.genre.clear();
    }

    /// Combined statistics over every operation cache
    pub fn stats(&self, source: &str) -> CacheStats {
        let mut total = CacheStats {
            source: source.to_string(),
            ..CacheStats::default()
        };
        total.absorb(self.trending.stats());
        total.absorb(self.search.stats());
        total.absorb(self.details.stats());
        total.absorb(self.episodes.stats());
        total.absorb(self.servers.stats());
        total.absorb(self.streaming.stats());
        total.absorb(self.genre.stats());
        total
    }
}
