//! NFP cache: canonical pair keys and the per-generation store.
//!
//! A key identifies `(idA, idB, rotation bucket A, rotation bucket B,
//! inside)`. Two requests with the same key are guaranteed to produce the
//! same NFP, so each key is computed at most once per generation. The cache
//! is rebuilt every generation: entries survive only if their key is
//! requested again, which keeps it from growing without bound.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::nfp::Nfp;

/// Canonical, bit-packed NFP pair key.
///
/// Layout (low to high): idA+1 (10 bits), idB+1 (9 bits), rotation bucket A
/// (4 bits), rotation bucket B (4 bits), inside flag (1 bit). Injective for
/// ids below 2^9-1 and rotation counts up to 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NfpKey(u64);

impl NfpKey {
    /// Builds the key, bucketing each rotation to the nearest multiple of
    /// `360 / rotations` degrees.
    pub fn new(
        rotations: u32,
        inside: bool,
        id_a: usize,
        id_b: usize,
        rotation_a: f64,
        rotation_b: f64,
    ) -> Self {
        let step = 360.0 / rotations as f64;
        let bucket_a = (rotation_a / step).round() as u64 % rotations as u64;
        let bucket_b = (rotation_b / step).round() as u64 % rotations as u64;

        let key = ((id_a as u64 + 1) & 0x3ff)
            | (((id_b as u64 + 1) & 0x1ff) << 10)
            | (bucket_a << 19)
            | (bucket_b << 23)
            | ((inside as u64) << 27);

        NfpKey(key)
    }

    /// Key for the inner NFP of a part against the bin. The bin occupies the
    /// zero slot of the idA field, which no part id can produce, and is never
    /// rotated.
    pub fn bin(rotations: u32, id_b: usize, rotation_b: f64) -> Self {
        let step = 360.0 / rotations as f64;
        let bucket_b = (rotation_b / step).round() as u64 % rotations as u64;

        let key = (((id_b as u64 + 1) & 0x1ff) << 10) | (bucket_b << 23) | (1u64 << 27);

        NfpKey(key)
    }

    /// Raw packed value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Shared NFP store for one generation.
///
/// Read-mostly: placement evaluation only reads; the batch computation phase
/// populates it with insert-if-absent semantics, so concurrent fan-out
/// cannot duplicate work for the same key. Values are `Arc`-shared, so readers
/// never clone the loops.
#[derive(Debug, Default)]
pub struct NfpCache {
    entries: RwLock<HashMap<NfpKey, Arc<Nfp>>>,
}

impl NfpCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached NFP for `key`, if present.
    pub fn get(&self, key: NfpKey) -> Option<Arc<Nfp>> {
        self.entries.read().unwrap().get(&key).cloned()
    }

    /// Returns true if `key` has a cached value.
    pub fn contains(&self, key: NfpKey) -> bool {
        self.entries.read().unwrap().contains_key(&key)
    }

    /// Inserts a value for `key` unless one is already present, returning
    /// the entry that ends up in the cache.
    pub fn insert(&self, key: NfpKey, nfp: Nfp) -> Arc<Nfp> {
        let mut entries = self.entries.write().unwrap();
        entries.entry(key).or_insert_with(|| Arc::new(nfp)).clone()
    }

    /// Looks up `key`, computing and caching the value on a miss. The
    /// computation may legitimately yield `None` (ungenerateable NFP); such
    /// results are not cached and the miss repeats.
    pub fn get_or_compute<F>(&self, key: NfpKey, compute: F) -> Option<Arc<Nfp>>
    where
        F: FnOnce() -> Option<Nfp>,
    {
        if let Some(existing) = self.get(key) {
            return Some(existing);
        }
        compute().map(|nfp| self.insert(key, nfp))
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds the next generation's cache: only entries whose key appears in
    /// `requested` are carried forward, everything else is dropped.
    pub fn retain_requested(&self, requested: &HashSet<NfpKey>) -> NfpCache {
        let entries = self.entries.read().unwrap();
        let kept: HashMap<NfpKey, Arc<Nfp>> = requested
            .iter()
            .filter_map(|key| entries.get(key).map(|v| (*key, v.clone())))
            .collect();

        NfpCache {
            entries: RwLock::new(kept),
        }
    }
}
