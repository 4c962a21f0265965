use std::{borrow::Borrow, collections::HashMap, hash::Hash};

/// A memo table with an explicit lifecycle.
///
/// Callers construct one per computation, share it through `Rc<RefCell<_>>` when a recursive
/// computation threads it, and clear or drop it when the inputs it was keyed against change.
#[derive(Clone, Default)]
pub struct Memo<K, V> {
    map: HashMap<K, V>,
}

impl<K: Eq + Hash, V> Memo<K, V> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.map.get(key)
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, f: F) -> &V {
        self.map.entry(key).or_insert_with(f)
    }
}
