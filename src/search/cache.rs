//! Bounded cache of compiled search patterns
use crate::error::Result;
use crate::pattern::Pattern;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

pub const DEFAULT_PATTERN_CACHE_SIZE: usize = 100;

/// Cache key for compiled patterns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: String,
    pub case_sensitive: bool,
}

pub struct PatternCache {
    patterns: Mutex<LruCache<CacheKey, Arc<Pattern>>>,
    capacity: usize,
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_CACHE_SIZE)
    }
}

impl PatternCache {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            patterns: Mutex::new(LruCache::new(capacity)),
            capacity: capacity.get(),
        }
    }

    /// Compiled pattern for `source`, compiling and caching it on a miss.
    pub fn get_or_compile(&self, source: &str, case_sensitive: bool) -> Result<Arc<Pattern>> {
        let key = CacheKey {
            source: source.to_string(),
            case_sensitive,
        };
        if let Some(pattern) = self.patterns.lock().get(&key) {
            return Ok(Arc::clone(pattern));
        }

        let pattern = Arc::new(Pattern::compile(source, case_sensitive)?);
        self.patterns.lock().put(key, Arc::clone(&pattern));
        Ok(pattern)
    }

    pub fn len(&self) -> usize {
        self.patterns.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.patterns.lock().clear();
    }
}
