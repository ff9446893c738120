use std::collections::HashMap;
use std::hash::Hash;

/// Keyed accumulators that remember first-seen order.
pub(crate) struct Buckets<K, V> {
    index: HashMap<K, usize>,
    items: Vec<V>,
}

impl<K: Eq + Hash, V> Buckets<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            index: HashMap::new(),
            items: Vec::new(),
        }
    }

    /// The bucket for `key`, created with `init` on first sight.
    pub(crate) fn entry(&mut self, key: K, init: impl FnOnce() -> V) -> &mut V {
        let items = &mut self.items;
        let i = *self.index.entry(key).or_insert_with(|| {
            items.push(init());
            items.len() - 1
        });
        &mut self.items[i]
    }

    pub(crate) fn into_vec(self) -> Vec<V> {
        self.items
    }
}
