#![forbid(unsafe_code)]

//! LRU cache for styled text width.
//!
//! Layout code measures the same styled fragments (prompts, labels, tails)
//! over and over. The cache maps the raw bytes of a fragment, escape
//! sequences included, to its printable width.
//!
//! # Example
//! ```
//! use ftui_reflow::WidthCache;
//!
//! let mut cache = WidthCache::new(64);
//! assert_eq!(cache.width("\x1b[1mhello\x1b[0m"), 5);
//! assert_eq!(cache.width("\x1b[1mhello\x1b[0m"), 5);
//!
//! let stats = cache.stats();
//! assert_eq!((stats.hits, stats.misses), (1, 1));
//! ```

use std::num::NonZeroUsize;

use lru::LruCache;
use rustc_hash::FxBuildHasher;

use crate::width::printable_width_bytes;

/// Default cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Current number of entries.
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Hit rate in `0.0..=1.0`; zero before the first lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of printable widths.
///
/// Keys are the input bytes, hashed with FxHash. Not thread-safe; see
/// `cached_width` (feature `thread_local_cache`) for a per-thread instance.
#[derive(Debug)]
pub struct WidthCache {
    cache: LruCache<Box<[u8]>, usize, FxBuildHasher>,
    hits: u64,
    misses: u64,
}

impl WidthCache {
    /// Create a cache holding up to `capacity` entries (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::with_hasher(non_zero(capacity), FxBuildHasher),
            hits: 0,
            misses: 0,
        }
    }

    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }

    /// Printable width of `text`, computed on a miss.
    #[inline]
    pub fn width(&mut self, text: &str) -> usize {
        self.width_bytes(text.as_bytes())
    }

    /// Printable width of raw bytes, computed on a miss.
    pub fn width_bytes(&mut self, bytes: &[u8]) -> usize {
        self.width_with(bytes, printable_width_bytes)
    }

    /// Look up `bytes`, computing with `compute` on a miss.
    pub fn width_with<F>(&mut self, bytes: &[u8], compute: F) -> usize
    where
        F: FnOnce(&[u8]) -> usize,
    {
        if let Some(&width) = self.cache.get(bytes) {
            self.hits += 1;
            return width;
        }

        self.misses += 1;
        let width = compute(bytes);
        self.cache.put(Box::from(bytes), width);
        width
    }

    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.cache.contains(text.as_bytes())
    }

    /// Cached width without touching LRU order or counters.
    #[must_use]
    pub fn peek(&self, text: &str) -> Option<usize> {
        self.cache.peek(text.as_bytes()).copied()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.cache.len(),
            capacity: self.cache.cap().get(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    /// Change capacity, evicting least recently used entries if needed.
    pub fn resize(&mut self, capacity: usize) {
        self.cache.resize(non_zero(capacity));
    }
}

impl Default for WidthCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[inline]
fn non_zero(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

#[cfg(feature = "thread_local_cache")]
thread_local! {
    static THREAD_CACHE: std::cell::RefCell<WidthCache> =
        std::cell::RefCell::new(WidthCache::with_default_capacity());
}

/// Printable width through a per-thread cache.
#[cfg(feature = "thread_local_cache")]
pub fn cached_width(text: &str) -> usize {
    THREAD_CACHE.with(|cache| cache.borrow_mut().width(text))
}

/// Empty the per-thread cache.
#[cfg(feature = "thread_local_cache")]
pub fn clear_thread_cache() {
    THREAD_CACHE.with(|cache| cache.borrow_mut().clear());
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::width::printable_width;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cached_matches_uncached(inputs in proptest::collection::vec("[a-z\u{4e00}-\u{4e05}]{0,4}(\u{1b}\\[1m)?", 1..40), cap in 1usize..8) {
            let mut cache = WidthCache::new(cap);
            for s in &inputs {
                prop_assert_eq!(cache.width(s), printable_width(s));
                prop_assert!(cache.len() <= cap);
            }
        }
    }
}
