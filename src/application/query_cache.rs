// Tag-scoped cache for read queries
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTag {
    Pipe,
    Stats,
}

/// Cached results of one query kind, keyed by query argument.
///
/// Entries live until a mutation invalidates the cache's tag. There is no
/// expiry; the lock is never held across an await.
///
/// Every invalidation bumps a generation. A fetch reads the generation before
/// it awaits upstream and passes it to `put`, which drops results that started
/// before the latest invalidation.
#[derive(Debug)]
pub struct QueryCache<V> {
    tag: CacheTag,
    state: RwLock<CacheState<V>>,
}

#[derive(Debug)]
struct CacheState<V> {
    generation: u64,
    entries: HashMap<String, V>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(tag: CacheTag) -> Self {
        Self {
            tag,
            state: RwLock::new(CacheState {
                generation: 0,
                entries: HashMap::new(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.entries.get(key).cloned()
    }

    pub fn generation(&self) -> u64 {
        self.state.read().unwrap_or_else(|e| e.into_inner()).generation
    }

    /// Stores `value` unless the cache was invalidated after `generation` was read.
    pub fn put(&self, key: &str, value: V, generation: u64) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.generation != generation {
            return false;
        }
        state.entries.insert(key.to_string(), value);
        true
    }

    /// Drops every entry if `tags` names this cache's tag.
    pub fn invalidate(&self, tags: &[CacheTag]) -> bool {
        if !tags.contains(&self.tag) {
            return false;
        }
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.generation += 1;
        state.entries.clear();
        true
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap_or_else(|e| e.into_inner()).entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_put() {
        let cache: QueryCache<u32> = QueryCache::new(CacheTag::Pipe);
        assert_eq!(cache.get("all"), None);
        assert!(cache.put("all", 3, cache.generation()));
        assert_eq!(cache.get("all"), Some(3));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_by_tag() {
        let pipes: QueryCache<u32> = QueryCache::new(CacheTag::Pipe);
        let stats: QueryCache<u32> = QueryCache::new(CacheTag::Stats);
        pipes.put("all", 1, pipes.generation());
        stats.put("all", 2, stats.generation());

        assert!(pipes.invalidate(&[CacheTag::Pipe]));
        assert!(!stats.invalidate(&[CacheTag::Pipe]));
        assert_eq!(pipes.get("all"), None);
        assert_eq!(stats.get("all"), Some(2));
    }

    #[test]
    fn test_put_after_invalidation_is_dropped() {
        let cache: QueryCache<u32> = QueryCache::new(CacheTag::Pipe);
        let started = cache.generation();

        cache.invalidate(&[CacheTag::Pipe]);
        assert!(!cache.put("all", 1, started));
        assert_eq!(cache.get("all"), None);

        assert!(cache.put("all", 2, cache.generation()));
        assert_eq!(cache.get("all"), Some(2));
    }
}
