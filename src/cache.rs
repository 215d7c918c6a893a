// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bounded time-to-live cache for read-only report queries.

use crate::error::DealflowError;
use lru::LruCache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Deterministic cache key: query name plus its parameters in order.
pub fn fingerprint(query: &str, params: &[&dyn ToString]) -> String {
    let parts: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    format!("{}({})", query, parts.join("|"))
}

struct Entry {
    stored_at: Instant,
    value: serde_json::Value,
}

/// Least-recently-used cache with a time-to-live per entry. Values are
/// kept as JSON so one cache can hold every report type.
pub struct QueryCache {
    ttl: Duration,
    entries: Option<Mutex<LruCache<String, Entry>>>,
}

impl QueryCache {
    /// A zero `ttl` or `capacity` disables caching.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let entries = NonZeroUsize::new(capacity)
            .filter(|_| !ttl.is_zero())
            .map(|cap| Mutex::new(LruCache::new(cap)));
        QueryCache { ttl, entries }
    }

    pub fn disabled() -> Self {
        QueryCache::new(Duration::ZERO, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Option<MutexGuard<'_, LruCache<String, Entry>>> {
        // a panic mid-update leaves at worst a stale entry
        self.entries
            .as_ref()
            .map(|m| m.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Fresh value for `key`; a hit marks the entry as recently used.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.lock()?;
        if entries.peek(key)?.stored_at.elapsed() >= self.ttl {
            entries.pop(key);
            return None;
        }
        entries
            .get(key)
            .and_then(|e| serde_json::from_value(e.value.clone()).ok())
    }

    pub fn insert<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DealflowError> {
        let Some(mut entries) = self.lock() else {
            return Ok(());
        };
        let entry = Entry {
            stored_at: Instant::now(),
            value: serde_json::to_value(value)?,
        };
        if let Some((evicted, _)) = entries.push(key.to_string(), entry) {
            if evicted != key {
                tracing::trace!(key = %evicted, "cache eviction");
            }
        }
        Ok(())
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_try_insert<T, F>(&self, key: &str, compute: F) -> Result<T, DealflowError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, DealflowError>,
    {
        if let Some(hit) = self.get(key) {
            tracing::trace!(key, "cache hit");
            return Ok(hit);
        }
        let value = compute()?;
        self.insert(key, &value)?;
        Ok(value)
    }

    /// Drops every entry whose key starts with `prefix`.
    pub fn invalidate(&self, prefix: &str) {
        let Some(mut entries) = self.lock() else {
            return;
        };
        let stale: Vec<String> = entries
            .iter()
            .map(|(k, _)| k)
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in &stale {
            entries.pop(key);
        }
    }

    pub fn clear(&self) {
        if let Some(mut entries) = self.lock() {
            entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_order_sensitive() {
        assert_eq!(fingerprint("recent", &[&7, &"x"]), "recent(7|x)");
        assert_ne!(
            fingerprint("q", &[&1, &2]),
            fingerprint("q", &[&2, &1])
        );
    }

    #[test]
    fn computes_once_while_fresh() {
        let cache = QueryCache::new(Duration::from_secs(60), 8);
        let mut calls = 0;
        for _ in 0..3 {
            let v: i64 = cache
                .get_or_try_insert("k", || {
                    calls += 1;
                    Ok(42)
                })
                .unwrap();
            assert_eq!(v, 42);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn disabled_cache_never_stores() {
        let cache = QueryCache::disabled();
        cache.insert("k", &1).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.get::<i32>("k"), None);
    }

    #[test]
    fn evicts_least_recently_used_at_capacity() {
        let cache = QueryCache::new(Duration::from_secs(60), 2);
        cache.insert("a", &1).unwrap();
        cache.insert("b", &2).unwrap();
        cache.insert("c", &3).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get::<i32>("a"), None);
        assert_eq!(cache.get::<i32>("c"), Some(3));

        // reading "b" makes "c" the next to go
        assert_eq!(cache.get::<i32>("b"), Some(2));
        cache.insert("d", &4).unwrap();
        assert_eq!(cache.get::<i32>("c"), None);
        assert_eq!(cache.get::<i32>("b"), Some(2));
    }

    #[test]
    fn reinserting_a_key_replaces_in_place() {
        let cache = QueryCache::new(Duration::from_secs(60), 2);
        cache.insert("a", &1).unwrap();
        cache.insert("a", &2).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get::<i32>("a"), Some(2));
    }

    #[test]
    fn invalidate_by_prefix() {
        let cache = QueryCache::new(Duration::from_secs(60), 8);
        cache.insert("deals.metrics()", &1).unwrap();
        cache.insert("deals.volume(12)", &2).unwrap();
        cache.insert("alerts.list(u)", &3).unwrap();
        cache.invalidate("deals.");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get::<i32>("alerts.list(u)"), Some(3));
    }

    #[test]
    fn expired_entries_miss() {
        let cache = QueryCache::new(Duration::from_millis(1), 8);
        cache.insert("k", &1).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get::<i32>("k"), None);
        assert!(cache.is_empty());
    }
}
