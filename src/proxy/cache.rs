//! In-memory object cache.
//!
//! Deliberately a flat `Vec<CacheEntry>` scanned linearly on every lookup
//! and every eviction decision rather than an indexed structure — the
//! working sets this proxy serves are small and a hash index would hide
//! the eviction policy instead of making it legible.

use std::sync::atomic::{AtomicU64, Ordering};

/// Largest single response body the cache will hold. Anything bigger is
/// still proxied, just never stored.
pub const MAX_OBJECT_SIZE: usize = 102_400;
/// Total bytes the cache budgets across every stored entry.
pub const MAX_CACHE_SIZE: usize = 1_049_000;

pub struct CacheEntry {
    pub key: String,
    pub body: Vec<u8>,
    /// Tick at which this entry was last read or inserted. `AtomicU64` so
    /// a lookup can stamp recency through a shared reference.
    access_time: AtomicU64,
}

impl CacheEntry {
    fn touch(&self, tick: u64) {
        self.access_time.store(tick, Ordering::Relaxed);
    }

    fn last_access(&self) -> u64 {
        self.access_time.load(Ordering::Relaxed)
    }
}

/// An LRU object cache bounded by both per-object and total size.
pub struct ObjectCache {
    entries: Vec<CacheEntry>,
    used: usize,
    tick: AtomicU64,
    max_object_size: usize,
    max_cache_size: usize,
}

impl ObjectCache {
    pub fn new() -> Self {
        Self::with_limits(MAX_OBJECT_SIZE, MAX_CACHE_SIZE)
    }

    pub fn with_limits(max_object_size: usize, max_cache_size: usize) -> Self {
        ObjectCache {
            entries: Vec::new(),
            used: 0,
            tick: AtomicU64::new(0),
            max_object_size,
            max_cache_size,
        }
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Look up `key`, stamping its recency on a hit.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entry = self.entries.iter().find(|e| e.key == key)?;
        entry.touch(self.next_tick());
        Some(entry.body.clone())
    }

    /// Insert or replace `key`'s body. Bodies larger than
    /// [`Self::max_object_size`] are silently not cached — the caller
    /// still serves the response, it just won't be stored. Evicts the
    /// least-recently-used entries, earliest-offset tie first, until the
    /// new body fits the total budget.
    pub fn put(&mut self, key: String, body: Vec<u8>) {
        if body.len() > self.max_object_size {
            return;
        }
        self.remove(&key);

        while !self.entries.is_empty() && self.used + body.len() > self.max_cache_size {
            let victim = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.last_access())
                .map(|(i, _)| i)
                .expect("entries is non-empty");
            let evicted = self.entries.remove(victim);
            self.used -= evicted.body.len();
        }

        if body.len() > self.max_cache_size {
            return;
        }

        let tick = self.next_tick();
        self.used += body.len();
        self.entries.push(CacheEntry {
            key,
            body,
            access_time: AtomicU64::new(tick),
        });
    }

    fn remove(&mut self, key: &str) {
        if let Some(idx) = self.entries.iter().position(|e| e.key == key) {
            let removed = self.entries.remove(idx);
            self.used -= removed.body.len();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used
    }
}

impl Default for ObjectCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_returns_stored_body() {
        let mut cache = ObjectCache::new();
        cache.put("a".into(), b"hello".to_vec());
        assert_eq!(cache.get("a"), Some(b"hello".to_vec()));
    }

    #[test]
    fn miss_returns_none() {
        let cache = ObjectCache::new();
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn oversized_object_is_not_stored() {
        let mut cache = ObjectCache::with_limits(16, 1024);
        cache.put("big".into(), vec![0u8; 32]);
        assert!(cache.is_empty());
    }

    #[test]
    fn eviction_prefers_least_recently_used() {
        let mut cache = ObjectCache::with_limits(1024, 24);
        cache.put("a".into(), vec![0u8; 10]);
        cache.put("b".into(), vec![0u8; 10]);
        // touch "a" so "b" becomes the least-recently-used entry
        cache.get("a");
        cache.put("c".into(), vec![0u8; 10]);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn touching_the_middle_entry_spares_it_from_eviction() {
        // Three entries fit together but a fourth of the same size doesn't;
        // touching the middle one should make the untouched oldest entry
        // the eviction victim, not the touched one.
        let mut cache = ObjectCache::with_limits(1000, 350);
        cache.put("a".into(), vec![0u8; 100]);
        cache.put("b".into(), vec![0u8; 100]);
        cache.put("c".into(), vec![0u8; 100]);
        cache.get("b");
        cache.put("d".into(), vec![0u8; 100]);

        assert!(cache.get("a").is_none(), "oldest untouched entry should be evicted");
        assert!(cache.get("b").is_some(), "touched middle entry should survive");
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn replacing_a_key_updates_its_body() {
        let mut cache = ObjectCache::new();
        cache.put("a".into(), b"first".to_vec());
        cache.put("a".into(), b"second".to_vec());
        assert_eq!(cache.get("a"), Some(b"second".to_vec()));
        assert_eq!(cache.len(), 1);
    }
}
