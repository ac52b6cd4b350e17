//! Concurrent memoization of sandhi resolutions
//!
//! While parsing, many parents reach the same sub-problem: the same
//! content split into the same left and right texts across the same
//! sandhi boundary. [`SandhiMemo`] maps such a sub-problem to the
//! solution built for it, so every parent shares one node.
//!
//! # Concurrency
//!
//! Lookups and inserts are lock-free from the caller's point of view
//! (sharded `DashMap`). The value is built *outside* the map, because
//! building it recurses into the parser and may touch the map again.
//! When two workers race on one key the first insert wins and the later
//! result is discarded; both callers get the winning handle back.

use super::arena::SolutionId;
use super::model::{MorphBase, SandhiMatch};
use super::parameters::ParameterVector;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Concurrent map with the fast non-cryptographic hasher
pub type FastDashMap<K, V> = DashMap<K, V, ahash::RandomState>;

/// Identity of one sandhi resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SandhiKey {
    /// Dictionary id of the parent content
    pub content_id: u64,
    /// Parameters of the parent content after the rule was merged in
    pub parameters: ParameterVector,
    /// Base of the parent content
    pub base: MorphBase,
    /// Virtual flag of the parent content
    pub is_virtual: Option<bool>,
    /// Applied rule
    pub rule_id: u64,
    /// Left text
    pub left: String,
    /// Right text
    pub right: String,
    /// Sandhi boundary
    pub sandhi: SandhiMatch,
    /// Recursion depth of the resolution (0 in depth-limited keys)
    pub depth: usize,
    /// Set when the resolution hit the depth limit
    pub errored: bool,
}

impl SandhiKey {
    /// Key for the depth-limited variant of the same resolution
    ///
    /// Every depth beyond the limit yields the same terminal solution, so
    /// the depth is dropped from the key.
    pub fn errored(&self) -> Self {
        Self {
            depth: 0,
            errored: true,
            ..self.clone()
        }
    }
}

/// Per-request memoization map
#[derive(Debug, Default)]
pub struct SandhiMemo {
    entries: FastDashMap<SandhiKey, SolutionId>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SandhiMemo {
    /// Create an empty memo
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a resolution, counting the hit or miss
    #[inline]
    pub fn get(&self, key: &SandhiKey) -> Option<SolutionId> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(*entry)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert unless another worker already did; returns the stored handle
    #[inline]
    pub fn insert_first(&self, key: SandhiKey, id: SolutionId) -> SolutionId {
        *self.entries.entry(key).or_insert(id)
    }

    /// Get or build a resolution
    ///
    /// `build` runs without holding any lock. Returns the stored handle and
    /// whether it was a cache hit.
    pub fn get_or_insert_with<F, E>(&self, key: SandhiKey, build: F) -> Result<(SolutionId, bool), E>
    where
        F: FnOnce() -> Result<SolutionId, E>,
    {
        if let Some(id) = self.get(&key) {
            return Ok((id, true));
        }
        let id = build()?;
        Ok((self.insert_first(key, id), false))
    }

    /// Number of memoized resolutions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is memoized
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every resolution and reset statistics
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Get cache statistics
    pub fn stats(&self) -> MemoStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };
        MemoStats {
            hits,
            misses,
            hit_rate,
            entries: self.entries.len(),
        }
    }
}

/// Memo statistics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MemoStats {
    /// Lookups answered from the memo
    pub hits: u64,
    /// Lookups that had to build a resolution
    pub misses: u64,
    /// `hits / (hits + misses)`
    pub hit_rate: f64,
    /// Stored resolutions
    pub entries: usize,
}
