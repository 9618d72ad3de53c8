use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Thread-safe LRU cache for serialized graph responses
///
/// Entries expire after a fixed TTL; an expired entry is treated as a miss
/// and dropped on lookup.
pub struct ResponseCache {
    cache: Mutex<LruCache<String, (Instant, String)>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a new response cache
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of responses to keep (0 is treated as 1)
    /// * `ttl` - How long a response stays valid
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, (Instant, String)>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a cached response body, if present and fresh
    pub fn get(&self, key: &str) -> Option<String> {
        let mut cache = self.lock();
        match cache.get(key) {
            Some((stored_at, body)) if stored_at.elapsed() < self.ttl => return Some(body.clone()),
            Some(_) => {}
            None => return None,
        }
        cache.pop(key);
        None
    }

    /// Store a response body
    pub fn put(&self, key: String, body: String) {
        self.lock().put(key, (Instant::now(), body));
    }

    /// Get the current number of cached entries (expired ones included)
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn test_cache_put_and_get() {
        let cache = ResponseCache::new(10, DAY);
        cache.put("q=okr".to_string(), "{}".to_string());
        assert_eq!(cache.get("q=okr").as_deref(), Some("{}"));
        assert!(cache.get("q=kpi").is_none());
    }

    #[test]
    fn test_cache_expiry() {
        let cache = ResponseCache::new(10, Duration::from_millis(20));
        cache.put("q=okr".to_string(), "{}".to_string());
        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get("q=okr").is_none());
        // expired entry is dropped on lookup
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_eviction() {
        let cache = ResponseCache::new(2, DAY);
        cache.put("a".to_string(), "1".to_string());
        cache.put("b".to_string(), "2".to_string());
        let _ = cache.get("a");
        cache.put("c".to_string(), "3".to_string());

        assert!(cache.get("a").is_some()); // recently used
        assert!(cache.get("b").is_none()); // evicted
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_cache_zero_capacity() {
        let cache = ResponseCache::new(0, DAY);
        cache.put("a".to_string(), "1".to_string());
        cache.put("b".to_string(), "2".to_string());
        assert_eq!(cache.len(), 1);
    }
}
