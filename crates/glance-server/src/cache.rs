//! TTL cache for derived dataset results.
//!
//! Entries expire lazily: an expired entry is evicted by the `get` that
//! finds it, never by a background sweeper. The cache is a plain injected
//! value, so each service owns its own instance and tests never share
//! state.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

pub struct DataCache<T> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<T>>>,
}

impl<T: Clone> DataCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry, evicting it if its TTL has elapsed.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                tracing::debug!(key, "cache entry expired");
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: impl Into<String>, value: T) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(
            key.into(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().expect("cache lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_within_ttl() {
        let cache = DataCache::new(Duration::from_secs(60));
        cache.put("k", 42);
        assert_eq!(cache.get("k"), Some(42));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_evicted_on_get() {
        let cache = DataCache::new(Duration::from_millis(10));
        cache.put("k", 42);
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_resets_ttl() {
        let cache = DataCache::new(Duration::from_millis(40));
        cache.put("k", 1);
        std::thread::sleep(Duration::from_millis(25));
        cache.put("k", 2);
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = DataCache::new(Duration::from_secs(60));
        cache.put("a", 1);
        cache.put("b", 2);
        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_instances_are_independent() {
        let one = DataCache::new(Duration::from_secs(60));
        let two: DataCache<i32> = DataCache::new(Duration::from_secs(60));
        one.put("k", 1);
        assert_eq!(two.get("k"), None);
    }
}
