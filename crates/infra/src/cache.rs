//! Inventory Cache: TTL-bounded memoization of warehouse reads.
//!
//! Entries expire lazily: an expired entry is dropped by the lookup that
//! notices it. Time comes from `tokio::time`, so tests can pause the clock.
//! Concurrent misses for one key share a single fetch.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use stockbridge_core::{WarehouseId, WarehouseStock};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Longest TTL accepted; keeps `Instant + ttl` far from overflow.
pub const MAX_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Concurrent map with per-key atomic replace and lazy expiry.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    /// One slot per key with a fetch in flight.
    inflight: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
    ttl: Duration,
}

/// Warehouse stock snapshots keyed by warehouse product id.
pub type InventoryCache = TtlCache<WarehouseId, WarehouseStock>;

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// `ttl` is capped at [`MAX_TTL`].
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            ttl: ttl.min(MAX_TTL),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Unexpired value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().ok()?;
            match entries.get(key) {
                None => return None,
                Some(entry) if now < entry.expires_at => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Expired: drop it unless a writer refreshed it in the meantime.
        if let Ok(mut entries) = self.entries.write() {
            if entries.get(key).is_some_and(|e| now >= e.expires_at) {
                entries.remove(key);
            }
        }
        None
    }

    pub fn put(&self, key: K, value: V) {
        self.put_with_ttl(key, value, self.ttl);
    }

    pub fn put_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl.min(MAX_TTL),
        };
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, entry);
        }
    }

    pub fn invalidate(&self, key: &K) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Optional sweep; lookups never depend on it.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, e| now < e.expires_at);
        before - entries.len()
    }

    /// Return the cached value, or run `fetch` and cache its success.
    ///
    /// A caller that misses while another fetch for the same key is in
    /// flight waits for it and then reads the cache. Errors are not cached,
    /// so after a failed fetch the next waiter fetches again.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, key: &K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let slot = self.slot(key);
        let _turn = slot.lock().await;
        let result = match self.get(key) {
            Some(hit) => Ok(hit),
            None => {
                let fetched = fetch().await;
                if let Ok(value) = &fetched {
                    self.put(key.clone(), value.clone());
                }
                fetched
            }
        };
        self.release(key, &slot);
        result
    }

    fn slot(&self, key: &K) -> Arc<tokio::sync::Mutex<()>> {
        match self.inflight.lock() {
            Ok(mut inflight) => inflight.entry(key.clone()).or_default().clone(),
            // Poisoned: fall back to an unshared slot.
            Err(_) => Arc::default(),
        }
    }

    fn release(&self, key: &K, slot: &Arc<tokio::sync::Mutex<()>>) {
        if let Ok(mut inflight) = self.inflight.lock() {
            if inflight.get(key).is_some_and(|s| Arc::ptr_eq(s, slot)) {
                inflight.remove(key);
            }
        }
    }
}
