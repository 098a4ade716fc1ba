// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory value cache for a store
//!
//! Holds the serialized form of values the store has confirmed against its
//! backend. The cache has its own lock, separate from any backend lock, so a
//! lookup never waits on file or database I/O.

use crate::storage::persistent::StoredValue;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hit/miss counters for a [`ValueCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        if self.total_requests() == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_requests() as f64
        }
    }
}

/// Key-to-value cache scoped to one store instance
#[derive(Debug, Default)]
pub struct ValueCache {
    entries: RwLock<HashMap<String, StoredValue>>,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`, counting the hit or miss
    pub fn get(&self, key: &str) -> Option<StoredValue> {
        let value = self.entries.read().get(key).cloned();
        let counter = if value.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    pub fn insert(&self, key: &str, value: StoredValue) {
        self.entries.write().insert(key.to_string(), value);
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop `key`; returns whether an entry was present
    pub fn evict(&self, key: &str) -> bool {
        let removed = self.entries.write().remove(key).is_some();
        if removed {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Drop `key` and every entry whose dotted path overlaps it
    ///
    /// Overlap means the same key, a descendant (`key.` prefix) or an
    /// ancestor (a prefix of `key` ending at a `.`). Returns how many
    /// entries were removed.
    pub fn evict_tree(&self, key: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|cached, _| !paths_overlap(cached, key));
        let removed = before - entries.len();
        drop(entries);
        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Whether one dotted path equals, contains or lies inside the other
fn paths_overlap(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    match long.strip_prefix(short) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}
