//! Explicit memoization tables.
//!
//! A [`Memo`] maps an argument tuple to a previously computed result. It is
//! owned by whoever needs the cache and passed in explicitly; there is no
//! process-wide table.
//!
//! Policy: unbounded and eviction-free. Every distinct key computed stays
//! cached for the lifetime of the `Memo` (or until [`Memo::clear`]). Callers
//! are expected to use small, finite key spaces.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct Memo<K, V> {
    entries: RefCell<HashMap<K, V>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl<K: Eq + Hash, V: Clone> Memo<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// `compute` runs without the table borrowed, so it may consult this
    /// `Memo` (or another one) recursively.
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce(&K) -> V) -> V {
        if let Some(value) = self.entries.borrow().get(&key) {
            self.hits.set(self.hits.get() + 1);
            return value.clone();
        }
        let value = compute(&key);
        self.misses.set(self.misses.get() + 1);
        self.entries.borrow_mut().insert(key, value.clone());
        value
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn stats(&self) -> MemoStats {
        MemoStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
        }
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
        self.hits.set(0);
        self.misses.set(0);
    }
}

impl<K: Eq + Hash, V: Clone> Default for Memo<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for Memo<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("len", &self.entries.borrow().len())
            .field("hits", &self.hits.get())
            .field("misses", &self.misses.get())
            .finish()
    }
}
