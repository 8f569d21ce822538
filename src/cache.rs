// TTL cache for raw supplier feed payloads, sitting between the storefront
// and the catalog/tee-sheet suppliers. Keys look like
// `{category}:{scope}:{date}`; values are the undecoded payload bytes.

use crate::catalog::ItemCategory;
use bytes::Bytes;
use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            default_ttl: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicUsize,
    misses: AtomicUsize,
    expired: AtomicUsize,
    evictions: AtomicUsize,
    stores: AtomicUsize,
}

// Point-in-time snapshot of the counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub expired: usize,
    pub evictions: usize,
    pub stores: usize,
    pub entries: usize,
}

struct CacheEntry {
    payload: Bytes,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

pub fn catalog_key(category: ItemCategory, destination: &str) -> String {
    format!("{}:{}:-", category.key(), destination)
}

pub fn tee_sheet_key(course_id: &str, date: NaiveDate) -> String {
    format!("{}:{}:{}", ItemCategory::Golf.key(), course_id, date)
}

pub struct CatalogCache {
    entries: DashMap<String, CacheEntry>,
    // Insertion order, oldest first; drives eviction when full
    order: Mutex<VecDeque<String>>,
    config: CacheConfig,
    counters: CacheCounters,
}

impl CatalogCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            config,
            counters: CacheCounters::default(),
        }
    }

    pub fn store(&self, key: String, payload: Bytes, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let entry = CacheEntry {
            payload,
            stored_at: Instant::now(),
            ttl,
        };

        let replaced = self.entries.insert(key.clone(), entry).is_some();
        self.counters.stores.fetch_add(1, Ordering::Relaxed);
        debug!(%key, replaced, "cached feed payload");

        if !replaced {
            let mut order = self.order.lock();
            order.push_back(key);
            while self.entries.len() > self.config.max_entries {
                let Some(oldest) = order.pop_front() else {
                    break;
                };
                if self.entries.remove(&oldest).is_some() {
                    self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %oldest, "evicted oldest cache entry");
                }
            }
        }
    }

    // An expired entry counts as a miss and is dropped on the spot
    pub fn get(&self, key: &str) -> Option<Bytes> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.payload.clone())
            }
            Some(entry) => {
                drop(entry);
                self.entries.remove(key);
                self.counters.expired.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    // Drop every entry matching the given key parts; None matches anything.
    // Returns the number of entries removed.
    pub fn invalidate(&self, category: Option<ItemCategory>, scope: Option<&str>) -> usize {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| {
                let mut parts = entry.key().splitn(3, ':');
                let key_category = parts.next().unwrap_or_default();
                let key_scope = parts.next().unwrap_or_default();

                category.map_or(true, |c| key_category == c.key())
                    && scope.map_or(true, |s| key_scope == s)
            })
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in keys {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        debug!(removed, "invalidated cache entries");
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            stores: self.counters.stores.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}
