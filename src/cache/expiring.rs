//! TTL layer over [`LruCache`].
//!
//! Expiration is passive: an expired entry answers like a miss but keeps its
//! slot until a later `set`, `remove`, `clear` or capacity eviction takes it
//! out. The LRU bound is the memory backstop, there is no sweeper.

use chrono::Utc;

use super::lru::LruCache;

/// Sentinel expiry meaning "never expires".
const NO_EXPIRY: i64 = 0;

#[derive(Debug, Clone)]
struct Stored<V> {
    value: V,
    /// Absolute expiry in epoch millis, [`NO_EXPIRY`] for none.
    expires_at_ms: i64,
}

impl<V> Stored<V> {
    fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms != NO_EXPIRY && self.expires_at_ms < now_ms
    }
}

#[derive(Debug)]
pub struct ExpiringCache<V> {
    inner: LruCache<Stored<V>>,
}

impl<V> ExpiringCache<V> {
    pub fn new(limit: usize) -> Self {
        Self {
            inner: LruCache::new(limit),
        }
    }

    /// True iff the entry exists and its expiry has passed. Missing keys and
    /// never-expiring entries answer false.
    pub fn is_expired(&self, key: &str) -> bool {
        match self.inner.peek(key) {
            Some(stored) => stored.is_expired(now_ms()),
            None => false,
        }
    }

    /// Returns the value unless the key is missing or expired. The two cases
    /// are indistinguishable to the caller; neither removes anything.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let now = now_ms();
        match self.inner.get(key) {
            Some(stored) if !stored.is_expired(now) => Some(&stored.value),
            _ => None,
        }
    }

    /// Store a value with a TTL in seconds. `None` or `Some(0)` stores it
    /// without expiry. Any prior entry for the key is replaced outright.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl_secs: Option<u64>) {
        let expires_at_ms = match ttl_secs {
            Some(ttl) if ttl > 0 => now_ms() + (ttl as i64) * 1000,
            _ => NO_EXPIRY,
        };
        self.inner.put(key, Stored {
            value,
            expires_at_ms,
        });
    }

    pub fn remove(&mut self, key: &str) {
        self.inner.remove(key);
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    /// Test hook: store with an explicit absolute expiry to simulate elapsed
    /// time without sleeping.
    #[cfg(test)]
    fn set_with_expiry(&mut self, key: impl Into<String>, value: V, expires_at_ms: i64) {
        self.inner.put(key, Stored {
            value,
            expires_at_ms,
        });
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
