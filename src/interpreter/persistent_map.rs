//! A copy-on-write bucket hash table. Mutating operations return a new map
//! that shares every untouched bucket with the original; entries themselves
//! are shared handles, so `assign` writes made through one copy are visible
//! through every other copy holding the same entry. Environments rely on
//! exactly that to propagate assignments into closure captures.

use std::cell::{Ref, RefCell};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::lexer::Token;

/// A key/value slot shared between every map copy that contains it.
#[derive(Debug)]
pub struct Entry<V> {
    key: Token,
    value: RefCell<V>,
}

impl<V> Entry<V> {
    pub fn key(&self) -> &Token {
        &self.key
    }

    pub fn value(&self) -> Ref<'_, V> {
        self.value.borrow()
    }

    pub fn set_value(&self, value: V) {
        *self.value.borrow_mut() = value;
    }
}

type Bucket<V> = Rc<Vec<Rc<Entry<V>>>>;

#[derive(Debug)]
pub struct PersistentMap<V, const N: usize = 1024> {
    buckets: Vec<Bucket<V>>,
}

impl<V, const N: usize> Clone for PersistentMap<V, N> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
        }
    }
}

impl<V, const N: usize> Default for PersistentMap<V, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, const N: usize> PersistentMap<V, N> {
    pub fn new() -> Self {
        Self {
            buckets: vec![Rc::new(vec![]); N],
        }
    }

    fn bucket_index(key: &Token) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish() as usize % N
    }

    /// Returns a map with `value` bound to `key`. The fresh entry is placed
    /// in front of its bucket, so it shadows any previous binding of the
    /// same key on lookup.
    pub fn insert(&self, key: Token, value: V) -> Self {
        let index = Self::bucket_index(&key);
        let mut entries = vec![Rc::new(Entry {
            key,
            value: RefCell::new(value),
        })];
        entries.extend(self.buckets[index].iter().cloned());

        let mut buckets = self.buckets.clone();
        buckets[index] = Rc::new(entries);
        Self { buckets }
    }

    /// Updates the first entry matching `key` in place; every map sharing
    /// the entry observes the new value. Returns `None` when the key is
    /// absent.
    pub fn assign(&self, key: &Token, value: V) -> Option<Self> {
        let entry = self.get_entry(key)?;
        entry.set_value(value);
        Some(self.clone())
    }

    pub fn get(&self, key: &Token) -> Option<V>
    where
        V: Clone,
    {
        self.get_entry(key).map(|entry| entry.value().clone())
    }

    pub fn get_entry(&self, key: &Token) -> Option<Rc<Entry<V>>> {
        let index = Self::bucket_index(key);
        self.buckets[index]
            .iter()
            .find(|entry| *entry.key() == *key)
            .cloned()
    }

    /// Re-inserts every entry of `other` on top of this map, preserving
    /// `other`'s own shadowing order. The copies are fresh entries: later
    /// `assign`s through the result do not write back into `other`.
    pub fn copy_over(&self, other: &Self) -> Self
    where
        V: Clone,
    {
        let mut map = self.clone();
        for bucket in &other.buckets {
            for entry in bucket.iter().rev() {
                map = map.insert(entry.key().clone(), entry.value().clone());
            }
        }
        map
    }

    /// Bucket-wise concatenation of `maps`. Entries stay shared, and on
    /// lookup the earliest map's binding wins.
    pub fn unionize(maps: &[Self]) -> Self {
        let mut buckets = Vec::with_capacity(N);
        for index in 0..N {
            let mut entries = vec![];
            for map in maps {
                entries.extend(map.buckets[index].iter().cloned());
            }
            buckets.push(Rc::new(entries));
        }
        Self { buckets }
    }
}
