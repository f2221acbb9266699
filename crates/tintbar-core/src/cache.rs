//! Artifact cache.
//!
//! Rendered artifacts are kept in an LRU keyed by artifact kind, normalized
//! icon key and rail. Retention is soft: entries disappear when the capacity is reached,
//! when the host reports memory pressure ([`IconArtifactCache::trim_memory`]),
//! or when evicted explicitly. A lookup for an evicted entry is a plain
//! miss; callers always rebuild on `None`.
//!
//! The cache never decides freshness on its own. The owner clears it
//! synchronously whenever a rendering-affecting style field changes.

use std::num::NonZeroUsize;
use std::rc::Rc;

use lru::LruCache;
use tracing::{debug, trace};

use crate::artifact::Artifact;

/// Default number of artifacts kept.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Resolution path an artifact was built by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Signal strength icon.
    Signal,
    /// Basic status icon (alarm, headset, ...).
    Basic,
    /// Cellular data-type glyph.
    DataType,
}

/// Cache identity of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ArtifactKind,
    /// Normalized icon key.
    pub name: String,
    /// Tint rail the artifact was colored for.
    pub rail: usize,
}

impl CacheKey {
    pub fn new(kind: ArtifactKind, name: impl Into<String>, rail: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            rail,
        }
    }

    /// Key of a signal strength artifact.
    pub fn signal(name: impl Into<String>, rail: usize) -> Self {
        Self::new(ArtifactKind::Signal, name, rail)
    }
}

/// Counters for cache traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Calls to `get`.
    pub lookups: u64,
    pub hits: u64,
    pub misses: u64,
    /// Calls to `put`.
    pub stores: u64,
    /// Calls to `clear` that dropped at least one entry.
    pub clears: u64,
    /// Current number of entries.
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }
}

#[derive(Debug)]
pub struct IconArtifactCache {
    entries: LruCache<CacheKey, Rc<Artifact>>,
    stats: CacheStats,
}

impl IconArtifactCache {
    /// Create a cache holding at most `capacity` artifacts (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats {
                capacity: capacity.get(),
                ..CacheStats::default()
            },
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<Rc<Artifact>> {
        self.stats.lookups += 1;
        match self.entries.get(key) {
            Some(artifact) => {
                self.stats.hits += 1;
                trace!("cache hit: {:?} {}@{}", key.kind, key.name, key.rail);
                Some(Rc::clone(artifact))
            }
            None => {
                self.stats.misses += 1;
                trace!("cache miss: {:?} {}@{}", key.kind, key.name, key.rail);
                None
            }
        }
    }

    /// Store an artifact, replacing any previous entry for the key.
    pub fn put(&mut self, key: CacheKey, artifact: Rc<Artifact>) {
        self.stats.stores += 1;
        debug!("caching {:?} artifact {}@{}", key.kind, key.name, key.rail);
        self.entries.put(key, artifact);
    }

    /// Check presence without touching LRU order or counters.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.stats.clears += 1;
            debug!("artifact cache cleared ({} entries)", self.entries.len());
        }
        self.entries.clear();
    }

    /// Drop one entry; returns true if it was present.
    pub fn evict(&mut self, key: &CacheKey) -> bool {
        self.entries.pop(key).is_some()
    }

    /// Low-memory hook for the host.
    pub fn trim_memory(&mut self) {
        debug!("trimming artifact cache on memory pressure");
        self.entries.clear();
    }

    /// Change the capacity, evicting least recently used entries if needed.
    pub fn resize(&mut self, capacity: usize) {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        self.entries.resize(capacity);
        self.stats.capacity = capacity.get();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys currently held, most recently used first.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            ..self.stats
        }
    }
}

impl Default for IconArtifactCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
