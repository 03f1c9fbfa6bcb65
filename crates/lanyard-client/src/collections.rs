//! Concurrent tables with wholesale-replace semantics.
//!
//! Incremental gateway events touch single keys; snapshot and sync events
//! replace whole tables. Per-key operations go straight to the live
//! `DashMap`; a replace swaps the `Arc` holding it, so a reader sampling the
//! table mid-swap sees either the old or the new table in full.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;

/// A concurrent map whose whole table can be swapped out atomically.
#[derive(Debug)]
pub struct SwapMap<K: Eq + Hash, V> {
    inner: RwLock<Arc<DashMap<K, V>>>,
}

impl<K: Eq + Hash, V: Clone> SwapMap<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Arc::new(DashMap::new())),
        }
    }

    /// A reference to the current table. Holders keep observing this table
    /// even across a later `replace`.
    pub fn load(&self) -> Arc<DashMap<K, V>> {
        Arc::clone(&self.inner.read())
    }

    /// Swap in a freshly built table.
    pub fn replace(&self, table: DashMap<K, V>) -> Arc<DashMap<K, V>> {
        std::mem::replace(&mut *self.inner.write(), Arc::new(table))
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.load().get(key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.load().insert(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.load().remove(key).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }

    /// Clone-out snapshot of the current values.
    pub fn values(&self) -> Vec<V> {
        self.load()
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl<K: Eq + Hash, V: Clone> Default for SwapMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A concurrent id set with the same replace semantics as [`SwapMap`].
#[derive(Debug)]
pub struct SwapSet<T: Eq + Hash> {
    inner: RwLock<Arc<DashSet<T>>>,
}

impl<T: Eq + Hash + Clone> SwapSet<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Arc::new(DashSet::new())),
        }
    }

    pub fn load(&self) -> Arc<DashSet<T>> {
        Arc::clone(&self.inner.read())
    }

    pub fn replace(&self, set: DashSet<T>) -> Arc<DashSet<T>> {
        std::mem::replace(&mut *self.inner.write(), Arc::new(set))
    }

    pub fn insert(&self, value: T) -> bool {
        self.load().insert(value)
    }

    pub fn remove(&self, value: &T) -> bool {
        self.load().remove(value).is_some()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.load().contains(value)
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }

    pub fn items(&self) -> Vec<T> {
        self.load().iter().map(|entry| entry.key().clone()).collect()
    }
}

impl<T: Eq + Hash + Clone> Default for SwapSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_key_ops_hit_the_live_table() {
        let map: SwapMap<i64, &str> = SwapMap::new();
        map.insert(1, "a");
        map.insert(2, "b");
        assert_eq!(map.get(&1), Some("a"));
        assert_eq!(map.remove(&2), Some("b"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn replace_leaves_held_references_intact() {
        let map: SwapMap<i64, &str> = SwapMap::new();
        map.insert(1, "old");

        let held = map.load();
        let fresh = DashMap::new();
        fresh.insert(2, "new");
        map.replace(fresh);

        // Old reference still sees the old table in full.
        assert_eq!(held.get(&1).map(|e| *e.value()), Some("old"));
        assert!(held.get(&2).is_none());
        // New loads see only the new table.
        assert_eq!(map.get(&2), Some("new"));
        assert_eq!(map.get(&1), None);
    }

    #[test]
    fn tables_are_debug_formattable() {
        let map: SwapMap<i64, &str> = SwapMap::new();
        map.insert(1, "a");
        let set: SwapSet<i64> = SwapSet::new();
        set.insert(2);
        assert!(format!("{map:?}").contains('1'));
        assert!(format!("{set:?}").contains('2'));
    }

    #[test]
    fn set_replace_and_membership() {
        let set: SwapSet<i64> = SwapSet::new();
        set.insert(10);
        assert!(set.contains(&10));

        let fresh = DashSet::new();
        fresh.insert(20);
        set.replace(fresh);
        assert!(!set.contains(&10));
        assert!(set.contains(&20));
    }
}
