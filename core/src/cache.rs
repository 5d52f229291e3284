use std::collections::{BTreeMap, HashMap};

/// Counters for how the cache served lookups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Bounded least-recently-used cache of term lookups.
///
/// Recency is a monotonically increasing tick per access; `order` maps ticks
/// back to keys so the oldest entry is found in O(log n). The capacity only
/// bounds the entry count; storage grows on demand. A capacity of zero
/// disables caching entirely.
#[derive(Debug)]
pub struct QueryCache<V> {
    capacity: usize,
    items: HashMap<String, (V, u64)>,
    order: BTreeMap<u64, String>,
    tick: u64,
    stats: CacheStats,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: HashMap::new(),
            order: BTreeMap::new(),
            tick: 0,
            stats: CacheStats::default(),
        }
    }

    /// Look up `key`, marking it most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.tick += 1;
        let tick = self.tick;
        match self.items.get_mut(key) {
            Some((value, last)) => {
                self.order.remove(&*last);
                *last = tick;
                self.order.insert(tick, key.to_string());
                self.stats.hits += 1;
                Some(value.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: String, value: V) {
        if self.capacity == 0 {
            return;
        }
        self.tick += 1;
        if let Some((_, last)) = self.items.remove(&key) {
            self.order.remove(&last);
        } else if self.items.len() >= self.capacity {
            if let Some((_, oldest)) = self.order.pop_first() {
                self.items.remove(&oldest);
                self.stats.evictions += 1;
            }
        }
        self.order.insert(self.tick, key.clone());
        self.items.insert(key, (value, self.tick));
    }

    /// Drop the entry for `key`. Returns whether one was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        match self.items.remove(key) {
            Some((_, last)) => {
                self.order.remove(&last);
                true
            }
            None => false,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache: QueryCache<u32> = QueryCache::new(3);
        cache.insert("one".into(), 1);
        cache.insert("two".into(), 2);
        cache.insert("three".into(), 3);
        assert_eq!(cache.len(), 3);

        // Insert 4th item, should evict oldest (one)
        cache.insert("four".into(), 4);
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains_key("one"));
        assert!(cache.contains_key("four"));

        // Touch two, making it most recent
        assert_eq!(cache.get("two"), Some(2));

        // Insert 5th item, should evict three (not two)
        cache.insert("five".into(), 5);
        assert!(!cache.contains_key("three"));
        assert!(cache.contains_key("two"));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn reinsert_replaces_without_eviction() {
        let mut cache: QueryCache<u32> = QueryCache::new(2);
        cache.insert("a".into(), 1);
        cache.insert("b".into(), 2);
        cache.insert("a".into(), 10);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn invalidate_removes_entry() {
        let mut cache: QueryCache<u32> = QueryCache::new(2);
        cache.insert("a".into(), 1);
        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.get("a"), None);
        // freed slot is reused without evicting
        cache.insert("b".into(), 2);
        cache.insert("c".into(), 3);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn huge_capacity_allocates_lazily() {
        let mut cache: QueryCache<u32> = QueryCache::new(usize::MAX);
        assert_eq!(cache.capacity(), usize::MAX);
        cache.insert("a".into(), 1);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_capacity_never_stores() {
        let mut cache: QueryCache<u32> = QueryCache::new(0);
        cache.insert("a".into(), 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 1, evictions: 0 });
    }
}
