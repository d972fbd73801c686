//! Bounded cache of compiled patterns
//!
//! Compiling a pattern is far more expensive than looking one up, so callers
//! that see the same pattern text repeatedly go through a [`PatternCache`].
//!
//! # Thread Safety
//! The map sits behind an `RwLock`. Hits take the read lock only and record
//! recency in an atomic per entry. Compilation happens with no lock held;
//! when two threads compile the same pattern at once, the second insert finds
//! the first entry and both callers end up sharing it.
//!
//! # Eviction
//! When the cache grows past its capacity the least recently used entry is
//! dropped. A [`Regex`] handed out earlier stays valid; it simply stops being
//! shared with later lookups.

use crate::engine::{Regex, RegexBuilder};
use crate::error::PatternSyntaxError;
use crate::options::RegexOptions;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, trace};

/// Default number of cached patterns
pub const DEFAULT_CAPACITY: usize = 15;

/// Cache configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of patterns to keep
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Cache performance statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Total cache lookups
    pub lookups: usize,
    /// Lookups answered from the cache
    pub hits: usize,
    /// Lookups that had to compile
    pub misses: usize,
    /// Successful pattern compilations
    pub compilations: usize,
    /// Entries dropped to stay within capacity
    pub evictions: usize,
}

type CacheKey = (String, RegexOptions, Option<Duration>);

#[derive(Debug)]
struct CacheEntry {
    regex: Regex,
    last_used: AtomicU64,
}

#[derive(Debug, Default)]
struct Counters {
    lookups: AtomicUsize,
    hits: AtomicUsize,
    misses: AtomicUsize,
    compilations: AtomicUsize,
    evictions: AtomicUsize,
}

/// A bounded, thread-safe LRU cache of compiled patterns
#[derive(Debug)]
pub struct PatternCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    capacity: AtomicUsize,
    /// Logical clock for recency
    clock: AtomicU64,
    counters: Counters,
}

impl PatternCache {
    /// Create a cache with the default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a cache with a custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: AtomicUsize::new(config.capacity),
            clock: AtomicU64::new(0),
            counters: Counters::default(),
        }
    }

    /// Get the compiled form of `pattern`, compiling it on a miss
    pub fn get_or_compile(
        &self,
        pattern: &str,
        options: RegexOptions,
    ) -> Result<Regex, PatternSyntaxError> {
        self.get_or_compile_with_timeout(pattern, options, None)
    }

    /// Like [`PatternCache::get_or_compile`], for a regex with a match timeout
    ///
    /// The timeout is part of the key: the same pattern with different
    /// timeouts is cached twice.
    pub fn get_or_compile_with_timeout(
        &self,
        pattern: &str,
        options: RegexOptions,
        timeout: Option<Duration>,
    ) -> Result<Regex, PatternSyntaxError> {
        self.counters.lookups.fetch_add(1, Ordering::Relaxed);
        let key = (pattern.to_string(), options, timeout);

        if let Some(regex) = self.lookup(&key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            trace!(pattern, "pattern cache hit");
            return Ok(regex);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        trace!(pattern, "pattern cache miss");

        let mut builder = RegexBuilder::new(pattern);
        builder.options(options);
        if let Some(timeout) = timeout {
            builder.match_timeout(timeout);
        }
        let regex = builder.build()?;
        self.counters.compilations.fetch_add(1, Ordering::Relaxed);

        Ok(self.insert(key, regex))
    }

    fn lookup(&self, key: &CacheKey) -> Option<Regex> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        Some(entry.regex.clone())
    }

    /// Insert a freshly compiled regex, or return the entry a racing thread
    /// inserted first
    fn insert(&self, key: CacheKey, regex: Regex) -> Regex {
        let capacity = self.capacity();
        if capacity == 0 {
            return regex;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(&key) {
            existing.last_used.store(self.tick(), Ordering::Relaxed);
            return existing.regex.clone();
        }

        entries.insert(
            key,
            CacheEntry {
                regex: regex.clone(),
                last_used: AtomicU64::new(self.tick()),
            },
        );
        self.evict_to(&mut entries, capacity);
        regex
    }

    /// Drop least recently used entries until at most `capacity` remain
    fn evict_to(&self, entries: &mut HashMap<CacheKey, CacheEntry>, capacity: usize) {
        while entries.len() > capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used.load(Ordering::Relaxed))
                .map(|(key, _)| key.clone());
            let Some(key) = oldest else {
                break;
            };
            entries.remove(&key);
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(pattern = %key.0, "evicted pattern from cache");
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Change the capacity. Shrinking evicts immediately.
    pub fn set_capacity(&self, capacity: usize) {
        self.capacity.store(capacity, Ordering::Relaxed);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        self.evict_to(&mut entries, capacity);
    }

    /// Number of cached patterns
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `pattern` with `options` and no timeout is cached
    pub fn contains(&self, pattern: &str, options: RegexOptions) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(pattern.to_string(), options, None))
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Snapshot of the cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            lookups: self.counters.lookups.load(Ordering::Relaxed),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            compilations: self.counters.compilations.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_cache_hit_and_miss() {
        let cache = PatternCache::new();
        let first = cache.get_or_compile(r"\d+", RegexOptions::NONE).unwrap();
        let second = cache.get_or_compile(r"\d+", RegexOptions::NONE).unwrap();
        assert_eq!(first.as_str(), second.as_str());

        let stats = cache.stats();
        assert_eq!(stats.lookups, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.compilations, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_options_are_part_of_the_key() {
        let cache = PatternCache::new();
        cache.get_or_compile("a", RegexOptions::NONE).unwrap();
        cache.get_or_compile("a", RegexOptions::from_flags("i")).unwrap();
        cache
            .get_or_compile_with_timeout("a", RegexOptions::NONE, Some(Duration::from_secs(1)))
            .unwrap();
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = PatternCache::with_config(CacheConfig { capacity: 2 });
        cache.get_or_compile("a", RegexOptions::NONE).unwrap();
        cache.get_or_compile("b", RegexOptions::NONE).unwrap();
        // touch "a" so "b" is the least recently used
        cache.get_or_compile("a", RegexOptions::NONE).unwrap();
        cache.get_or_compile("c", RegexOptions::NONE).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a", RegexOptions::NONE));
        assert!(!cache.contains("b", RegexOptions::NONE));
        assert!(cache.contains("c", RegexOptions::NONE));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_evicted_regex_stays_usable() {
        let cache = PatternCache::with_config(CacheConfig { capacity: 1 });
        let re = cache.get_or_compile("x+", RegexOptions::NONE).unwrap();
        cache.get_or_compile("y", RegexOptions::NONE).unwrap();
        assert!(!cache.contains("x+", RegexOptions::NONE));
        assert!(re.is_match("axxb").unwrap());
    }

    #[test]
    fn test_set_capacity_shrinks() {
        let cache = PatternCache::new();
        for p in ["a", "b", "c", "d"] {
            cache.get_or_compile(p, RegexOptions::NONE).unwrap();
        }
        cache.set_capacity(1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("d", RegexOptions::NONE));
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_zero_capacity_disables_caching() {
        let cache = PatternCache::with_config(CacheConfig { capacity: 0 });
        assert!(cache.get_or_compile("a", RegexOptions::NONE).unwrap().is_match("a").unwrap());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_syntax_error_not_cached() {
        let cache = PatternCache::new();
        assert!(cache.get_or_compile("(", RegexOptions::NONE).is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().compilations, 0);
    }

    #[test]
    fn test_clear() {
        let cache = PatternCache::new();
        cache.get_or_compile("a", RegexOptions::NONE).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(PatternCache::with_config(CacheConfig { capacity: 4 }));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..50 {
                        let pattern = format!("{}+", (i + j) % 6);
                        let re = cache.get_or_compile(&pattern, RegexOptions::NONE).unwrap();
                        assert_eq!(re.as_str(), pattern);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 4);
        let stats = cache.stats();
        assert_eq!(stats.lookups, 400);
        assert_eq!(stats.hits + stats.misses, 400);
    }
}
