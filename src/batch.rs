// =============================================================================
// Batch operations
// =============================================================================
//
// Each batch applies the single-key operation to every input in order and
// keeps only the `Some` results. Nothing is rolled back: an absent key simply
// contributes nothing to the output. The output is allocated for the full
// input length up front.

use crate::{BpTree, Comparator};

impl<K, C: Comparator<K>> BpTree<K, C> {
    /// Looks up every key, returning the stored keys that were found.
    pub fn lookup_batch<'k, I>(&self, keys: I) -> Vec<&K>
    where
        I: IntoIterator<Item = &'k K>,
        I::IntoIter: ExactSizeIterator,
        K: 'k,
    {
        let keys = keys.into_iter();
        let mut found = Vec::with_capacity(keys.len());
        found.extend(keys.filter_map(|key| self.get(key)));
        found
    }
}

impl<K: Clone, C: Comparator<K>> BpTree<K, C> {
    /// Inserts every key, returning the keys that were replaced.
    pub fn insert_batch<I>(&mut self, keys: I) -> Vec<K>
    where
        I: IntoIterator<Item = K>,
        I::IntoIter: ExactSizeIterator,
    {
        let keys = keys.into_iter();
        let mut replaced = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(old) = self.insert(key) {
                replaced.push(old);
            }
        }
        replaced
    }

    /// Removes every key, returning the keys that were present.
    pub fn delete_batch<'k, I>(&mut self, keys: I) -> Vec<K>
    where
        I: IntoIterator<Item = &'k K>,
        I::IntoIter: ExactSizeIterator,
        K: 'k,
    {
        let keys = keys.into_iter();
        let mut removed = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(old) = self.remove(key) {
                removed.push(old);
            }
        }
        removed
    }
}
