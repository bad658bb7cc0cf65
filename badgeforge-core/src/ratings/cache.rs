//! Shared TTL cache used by every rating/mapping/awards source, keeping
//! the process-wide maps safe for concurrent read/write.
//!
//! `dashmap` gives us sharded-lock concurrent reads/writes without a
//! bespoke mutex-per-key scheme, mirroring the pattern the media-server
//! side of this stack uses for its own in-memory bundle caches.

use std::time::Duration;

use badgeforge_model::CacheEntry;
use dashmap::DashMap;

/// `get(key)` returns `(value, fresh)` where `fresh = now - inserted_at <
/// ttl`; writes are last-writer-wins on the same key.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self { entries: DashMap::new() }
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<(V, bool)> {
        self.entries.get(key).map(|entry| (entry.value.clone(), entry.is_fresh()))
    }

    /// Convenience for the common case: `None` on miss or stale entry.
    pub fn get_fresh(&self, key: &str) -> Option<V> {
        self.get(key).and_then(|(value, fresh)| fresh.then_some(value))
    }

    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(key.into(), CacheEntry::new(value, ttl));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_entry_reports_not_fresh() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.insert("k", 7, Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(5));
        let (value, fresh) = cache.get("k").unwrap();
        assert_eq!(value, 7);
        assert!(!fresh);
        assert!(cache.get_fresh("k").is_none());
    }

    #[test]
    fn fresh_entry_round_trips() {
        let cache: TtlCache<&str> = TtlCache::new();
        cache.insert("k", "v", Duration::from_secs(60));
        assert_eq!(cache.get_fresh("k"), Some("v"));
    }
}
