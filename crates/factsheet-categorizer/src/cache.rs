//! Categorization cache
//!
//! One cache is shared by every categorization task of a run. Lookups and
//! inserts take a single lock, and the hit/miss counters are updated under
//! that same lock, so statistics stay exact under concurrency. Two tasks
//! missing on the same key at once both call the LLM; the second insert
//! overwrites the first.

use factsheet_domain::Categorization;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Cache key: trimmed, lowercased (name, unit)
///
/// The value is deliberately left out so the same kind of fact reported
/// with different magnitudes is categorized once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: String,
    unit: String,
}

impl CacheKey {
    /// Build a key from a fact's name and raw unit
    pub fn new(name: &str, unit: &str) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            unit: unit.trim().to_lowercase(),
        }
    }

    /// Normalized name part
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized unit part
    pub fn unit(&self) -> &str {
        &self.unit
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,

    /// Lookups that required an LLM call
    pub misses: u64,

    /// hits / (hits + misses), 0.0 before any lookup
    pub hit_rate: f64,

    /// Number of cached categorizations
    pub cache_size: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, Categorization>,
    hits: u64,
    misses: u64,
}

/// Thread-safe categorization cache with hit/miss accounting
#[derive(Debug, Default)]
pub struct CategorizationCache {
    inner: Mutex<CacheInner>,
}

impl CategorizationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // No critical section can leave the state half-written
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up a key, counting a hit or a miss
    pub fn lookup(&self, key: &CacheKey) -> Option<Categorization> {
        let mut inner = self.lock();
        let found = inner.entries.get(key).cloned();
        match found {
            Some(found) => {
                inner.hits += 1;
                Some(found)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Look up a key without touching the counters
    pub fn peek(&self, key: &CacheKey) -> Option<Categorization> {
        self.lock().entries.get(key).cloned()
    }

    /// Store a categorization
    pub fn insert(&self, key: CacheKey, categorization: Categorization) {
        self.lock().entries.insert(key, categorization);
    }

    /// Number of cached categorizations
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current statistics; safe to call at any point during a run
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let total = inner.hits + inner.misses;
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                inner.hits as f64 / total as f64
            },
            cache_size: inner.entries.len(),
        }
    }

    /// Drop all entries and reset the counters
    pub fn clear(&self) {
        *self.lock() = CacheInner::default();
    }
}
