//! Revalidation cache for fetched content
//!
//! Entries are served until they are older than the configured revalidation
//! window, after which the next request fetches them again. The cache also
//! remembers which keys are being fetched in the background so a slow post
//! is not requested once per waiting visitor.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Entries<V> {
    fresh: HashMap<String, (Instant, V)>,
    pending: HashSet<String>,
}

/// Time-bounded cache keyed by string
#[derive(Debug)]
pub struct RevalidateCache<V> {
    ttl: Duration,
    entries: Mutex<Entries<V>>,
}

impl<V: Clone> RevalidateCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(Entries {
                fresh: HashMap::new(),
                pending: HashSet::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries<V>> {
        // A panic while holding the lock cannot leave the maps half-updated
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached value, if still fresh
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        match entries.fresh.get(key) {
            Some((stored, value)) if stored.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                tracing::debug!("Cache entry {} expired", key);
                entries.fresh.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value and clear its pending mark
    pub fn insert(&self, key: &str, value: V) {
        let mut entries = self.lock();
        entries.pending.remove(key);
        entries.fresh.insert(key.to_string(), (Instant::now(), value));
    }

    /// Mark `key` as being fetched. Returns `false` if a fetch is already running.
    pub fn begin_fetch(&self, key: &str) -> bool {
        self.lock().pending.insert(key.to_string())
    }

    /// Clear the pending mark after a fetch that produced nothing to cache
    pub fn abandon_fetch(&self, key: &str) {
        self.lock().pending.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_insert() {
        let cache = RevalidateCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("a"), None);

        cache.insert("a", 1);
        assert_eq!(cache.get("a"), Some(1));

        cache.insert("a", 2);
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let cache = RevalidateCache::new(Duration::ZERO);
        cache.insert("a", "value".to_string());
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_pending_fetches() {
        let cache: RevalidateCache<u32> = RevalidateCache::new(Duration::from_secs(60));

        assert!(cache.begin_fetch("post/a"));
        assert!(!cache.begin_fetch("post/a"));

        // Storing the result clears the pending mark
        cache.insert("post/a", 7);
        assert!(cache.begin_fetch("post/a"));

        assert!(cache.begin_fetch("post/b"));
        cache.abandon_fetch("post/b");
        assert!(cache.begin_fetch("post/b"));
    }
}
