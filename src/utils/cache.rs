// src/utils/cache.rs

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Time source for the cache. Swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by `Instant::now`.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A small expiring key-value cache.
///
/// Entries live for a fixed TTL from insertion; reads past the deadline
/// behave as a miss. Inserting again resets the deadline, which doubles
/// as explicit invalidation-by-overwrite (e.g. after a profile update).
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Box<dyn Clock>,
    entries: Mutex<HashMap<K, (V, Instant)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Box::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Box<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, deadline)) if now < *deadline => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        let deadline = self.clock.now() + self.ttl;
        self.entries.lock().unwrap().insert(key, (value, deadline));
    }

    pub fn remove(&self, key: &K) {
        self.entries.lock().unwrap().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// A clock that only moves when told to.
    struct ManualClock {
        origin: Instant,
        offset_secs: Arc<AtomicU64>,
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.origin + Duration::from_secs(self.offset_secs.load(Ordering::SeqCst))
        }
    }

    fn manual_cache(ttl_secs: u64) -> (TtlCache<i64, String>, Arc<AtomicU64>) {
        let offset = Arc::new(AtomicU64::new(0));
        let clock = ManualClock {
            origin: Instant::now(),
            offset_secs: offset.clone(),
        };
        let cache = TtlCache::with_clock(Duration::from_secs(ttl_secs), Box::new(clock));
        (cache, offset)
    }

    #[test]
    fn hit_within_ttl() {
        let (cache, offset) = manual_cache(300);
        cache.insert(1, "alice".to_string());

        offset.store(299, Ordering::SeqCst);
        assert_eq!(cache.get(&1), Some("alice".to_string()));
    }

    #[test]
    fn miss_after_ttl() {
        let (cache, offset) = manual_cache(300);
        cache.insert(1, "alice".to_string());

        offset.store(300, Ordering::SeqCst);
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn insert_resets_deadline() {
        let (cache, offset) = manual_cache(300);
        cache.insert(1, "alice".to_string());

        offset.store(200, Ordering::SeqCst);
        cache.insert(1, "alice-updated".to_string());

        offset.store(400, Ordering::SeqCst);
        assert_eq!(cache.get(&1), Some("alice-updated".to_string()));
    }

    #[test]
    fn remove_invalidates() {
        let (cache, _offset) = manual_cache(300);
        cache.insert(1, "alice".to_string());
        cache.remove(&1);
        assert_eq!(cache.get(&1), None);
    }
}
