// =============================================================================
// Removal, borrow and merge
// =============================================================================
//
// A non-root node holding fewer than `degree / 2` keys is deficient. It is
// repaired with the first applicable step:
//
//   1. take the last entry of the left sibling
//   2. take the first entry of the right sibling
//   3. fold itself into the left sibling
//   4. absorb the right sibling
//
// Borrowing needs a sibling with at least `degree / 2` keys. Only siblings
// under the same parent qualify for any step; the level chain also links
// cousins, and moving entries across a parent boundary would leave both
// parents with wrong guide keys. A merge removes one key and one child from
// the parent, which may leave the parent deficient in turn.

use tracing::{debug, trace};

use crate::node::{NodeId, NodeKind};
use crate::{BpTree, Comparator};

impl<K: Clone, C: Comparator<K>> BpTree<K, C> {
    /// Removes and returns the stored key comparing equal to `key`.
    pub fn remove(&mut self, key: &K) -> Option<K> {
        let leaf = self.find_leaf(key);
        let pos = self.search(&self.nodes[leaf].keys, key).ok()?;
        Some(self.remove_at(leaf, pos))
    }

    /// Same as [`remove`](Self::remove).
    #[inline]
    pub fn delete(&mut self, key: &K) -> Option<K> {
        self.remove(key)
    }

    /// Removes and returns the minimum key.
    pub fn pop_first(&mut self) -> Option<K> {
        let leaf = self.leftmost_leaf(self.root);
        if self.nodes[leaf].keys.is_empty() {
            return None;
        }
        Some(self.remove_at(leaf, 0))
    }

    /// Removes and returns the maximum key.
    pub fn pop_last(&mut self) -> Option<K> {
        let leaf = self.rightmost_leaf(self.root);
        let pos = self.nodes[leaf].size().checked_sub(1)?;
        Some(self.remove_at(leaf, pos))
    }

    fn remove_at(&mut self, leaf: NodeId, pos: usize) -> K {
        let key = self.nodes[leaf].keys.remove(pos);
        self.len -= 1;
        if pos == 0 {
            self.refresh_guides(leaf);
        }
        self.rebalance(leaf);
        key
    }

    fn rebalance(&mut self, mut id: NodeId) {
        let min = self.degree / 2;
        loop {
            let Some(parent) = self.nodes[id].parent else {
                self.collapse_root();
                return;
            };
            if self.nodes[id].size() >= min {
                return;
            }

            let same_parent = |sibling: &NodeId| self.nodes[*sibling].parent == Some(parent);
            let left = self.nodes[id].left.filter(same_parent);
            let right = self.nodes[id].right.filter(same_parent);
            let leaf = self.nodes[id].is_leaf();
            debug_assert!(
                left.is_some() || right.is_some(),
                "non-root node {id} has no sibling under {parent}"
            );

            if let Some(left) = left.filter(|&l| self.nodes[l].size() >= min) {
                if leaf {
                    self.stats.borrow_left_leaf += 1;
                } else {
                    self.stats.borrow_left_internal += 1;
                }
                self.borrow_from_left(left, id);
                return;
            }
            if let Some(right) = right.filter(|&r| self.nodes[r].size() >= min) {
                if leaf {
                    self.stats.borrow_right_leaf += 1;
                } else {
                    self.stats.borrow_right_internal += 1;
                }
                self.borrow_from_right(id, right);
                return;
            }

            if let Some(left) = left {
                if leaf {
                    self.stats.merge_left_leaf += 1;
                } else {
                    self.stats.merge_left_internal += 1;
                }
                self.merge(left, id);
            } else if let Some(right) = right {
                if leaf {
                    self.stats.merge_right_leaf += 1;
                } else {
                    self.stats.merge_right_internal += 1;
                }
                self.merge(id, right);
            } else {
                return;
            }
            id = parent;
        }
    }

    /// Moves the last entry of `left` to the front of `id`.
    fn borrow_from_left(&mut self, left: NodeId, id: NodeId) {
        trace!(node = %id, sibling = %left, "bptree.borrow_left");
        let key = self.nodes[left]
            .keys
            .pop()
            .expect("lending sibling holds keys");
        if !self.nodes[id].is_leaf() {
            let child = self.nodes[left]
                .children_mut()
                .pop()
                .expect("lending sibling holds children");
            self.nodes[id].children_mut().insert(0, child);
            self.nodes[child].parent = Some(id);
        }
        // For an internal node `key` is only a placeholder; the refresh below
        // rewrites it to the minimum of the old first child.
        self.nodes[id].keys.insert(0, key);
        self.refresh_guides(id);
    }

    /// Moves the first entry of `right` to the end of `id`.
    fn borrow_from_right(&mut self, id: NodeId, right: NodeId) {
        trace!(node = %id, sibling = %right, "bptree.borrow_right");
        let key = self.nodes[right].keys.remove(0);
        if !self.nodes[id].is_leaf() {
            let child = self.nodes[right].children_mut().remove(0);
            self.nodes[id].children_mut().push(child);
            self.nodes[child].parent = Some(id);
        }
        self.nodes[id].keys.push(key);
        // `id` and `right` share a parent, so this also fixes the guide that
        // points at `right`.
        self.refresh_guides(id);
    }

    /// Folds `right` into `left` and drops it from the parent and the level
    /// chain. Both must be children of the same parent, `right` directly after
    /// `left`.
    fn merge(&mut self, left: NodeId, right: NodeId) {
        trace!(node = %left, consumed = %right, "bptree.merge");
        let parent = self.nodes[right]
            .parent
            .expect("merged node has a parent");
        let pos = self.child_index(parent, right);
        debug_assert!(pos > 0 && self.nodes[parent].children()[pos - 1] == left);

        let separator = self.nodes[parent].keys.remove(pos - 1);
        self.nodes[parent].children_mut().remove(pos);

        let consumed = self.nodes.free(right);
        match consumed.kind {
            NodeKind::Leaf => {
                self.nodes[left].keys.extend(consumed.keys);
            }
            NodeKind::Internal { children } => {
                for &child in &children {
                    self.nodes[child].parent = Some(left);
                }
                // The separator was the minimum of `right`, which is the guide
                // for `right`'s first child once the children are joined.
                let node = &mut self.nodes[left];
                node.keys.push(separator);
                node.keys.extend(consumed.keys);
                node.children_mut().extend(children);
            }
        }

        self.nodes[left].right = consumed.right;
        if let Some(next) = consumed.right {
            self.nodes[next].left = Some(left);
        }
        self.refresh_guides(left);
    }

    /// Replaces an internal root that has run out of keys by its only child.
    fn collapse_root(&mut self) {
        while !self.nodes[self.root].is_leaf() && self.nodes[self.root].size() == 0 {
            let old = self.root;
            let child = self.nodes[old].children()[0];
            self.nodes.free(old);
            self.nodes[child].parent = None;
            self.root = child;
            debug!(root = %child, height = self.height(), "bptree.root_collapse");
        }
    }
}
