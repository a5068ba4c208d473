use std::iter::FusedIterator;

use crate::node::{NodeArena, NodeId};

/// Ascending iterator over the keys of a [`BpTree`](crate::BpTree).
///
/// Walks the leaf sibling chain left to right from the front and right to
/// left from the back; the two ends stop once they have yielded `len` keys
/// between them.
pub struct Iter<'a, K> {
    nodes: &'a NodeArena<K>,
    /// Leaf and index of the next key to yield from the front.
    front: Option<(NodeId, usize)>,
    /// Leaf and one past the index of the next key to yield from the back.
    back: Option<(NodeId, usize)>,
    remaining: usize,
}

impl<'a, K> Iter<'a, K> {
    pub(crate) fn new(nodes: &'a NodeArena<K>, first: NodeId, last: NodeId, len: usize) -> Self {
        Self {
            nodes,
            front: Some((first, 0)),
            back: Some((last, nodes[last].size())),
            remaining: len,
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        while let Some((leaf, pos)) = self.front {
            let keys = &nodes[leaf].keys;
            if pos < keys.len() {
                self.front = Some((leaf, pos + 1));
                self.remaining -= 1;
                return Some(&keys[pos]);
            }
            self.front = nodes[leaf].right.map(|next| (next, 0));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K> DoubleEndedIterator for Iter<'a, K> {
    fn next_back(&mut self) -> Option<&'a K> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        while let Some((leaf, end)) = self.back {
            if end > 0 {
                self.back = Some((leaf, end - 1));
                self.remaining -= 1;
                return Some(&nodes[leaf].keys[end - 1]);
            }
            self.back = nodes[leaf]
                .left
                .map(|prev| (prev, nodes[prev].size()));
        }
        None
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}

/// Read-only cursor over one leaf of a tree.
///
/// Obtained from [`BpTree::min_leaf`](crate::BpTree::min_leaf) or
/// [`BpTree::max_leaf`](crate::BpTree::max_leaf); step along the leaf level
/// with [`right_sibling`](Self::right_sibling) and
/// [`left_sibling`](Self::left_sibling).
pub struct LeafRef<'a, K> {
    nodes: &'a NodeArena<K>,
    id: NodeId,
}

impl<'a, K> LeafRef<'a, K> {
    pub(crate) fn new(nodes: &'a NodeArena<K>, id: NodeId) -> Self {
        debug_assert!(nodes[id].is_leaf());
        Self { nodes, id }
    }

    /// Keys of this leaf in ascending order.
    pub fn keys(&self) -> &'a [K] {
        &self.nodes[self.id].keys
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    pub fn right_sibling(&self) -> Option<LeafRef<'a, K>> {
        self.nodes[self.id].right.map(|id| LeafRef::new(self.nodes, id))
    }

    pub fn left_sibling(&self) -> Option<LeafRef<'a, K>> {
        self.nodes[self.id].left.map(|id| LeafRef::new(self.nodes, id))
    }
}

impl<K> Clone for LeafRef<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for LeafRef<'_, K> {}
