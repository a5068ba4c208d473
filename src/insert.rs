// =============================================================================
// Insertion and split
// =============================================================================

use tracing::{debug, trace};

use crate::node::NodeId;
use crate::{BpTree, Comparator};

impl<K: Clone, C: Comparator<K>> BpTree<K, C> {
    /// Inserts `key`.
    ///
    /// If a stored key compares equal, it is replaced in place and returned;
    /// the length does not change. Otherwise returns `None`.
    pub fn insert(&mut self, key: K) -> Option<K> {
        let leaf = self.find_leaf(&key);
        match self.search(&self.nodes[leaf].keys, &key) {
            Ok(pos) => {
                let old = std::mem::replace(&mut self.nodes[leaf].keys[pos], key);
                // Guide keys are clones of leaf minimums; keep them in step
                // with the replacement.
                if pos == 0 {
                    self.refresh_guides(leaf);
                }
                Some(old)
            }
            Err(pos) => {
                self.nodes[leaf].keys.insert(pos, key);
                self.len += 1;
                if pos == 0 {
                    self.refresh_guides(leaf);
                }
                if self.nodes[leaf].size() >= self.degree {
                    self.split(leaf);
                }
                None
            }
        }
    }

    /// Splits `id` and every ancestor that overflows as a result.
    ///
    /// With `t = degree / 2`, a leaf keeps `[0, t)` and its new right sibling
    /// takes `[t, size)`, promoting a clone of key `t`. An internal node keeps
    /// keys `[0, t)` and children `[0, t + 1)`; the sibling takes keys
    /// `[t + 1, size)` and children `[t + 1, size + 1)`, and key `t` itself
    /// moves up. In both cases the promoted key is the minimum of the new
    /// sibling's subtree, so it is already a valid guide key in the parent.
    fn split(&mut self, mut id: NodeId) {
        while self.nodes[id].size() >= self.degree {
            let t = self.degree / 2;

            let (sibling, separator) = if self.nodes[id].is_leaf() {
                self.stats.split_leaf += 1;
                let sibling = self.nodes.alloc_leaf();
                let moved = self.nodes[id].keys.split_off(t);
                let separator = moved[0].clone();
                self.nodes[sibling].keys.extend(moved);
                (sibling, separator)
            } else {
                self.stats.split_internal += 1;
                let sibling = self.nodes.alloc_internal();
                let mut moved_keys = self.nodes[id].keys.split_off(t);
                let separator = moved_keys.remove(0);
                let moved_children = self.nodes[id].children_mut().split_off(t + 1);
                for &child in &moved_children {
                    self.nodes[child].parent = Some(sibling);
                }
                let node = &mut self.nodes[sibling];
                node.keys.extend(moved_keys);
                node.children_mut().extend(moved_children);
                (sibling, separator)
            };
            trace!(
                node = %id,
                sibling = %sibling,
                leaf = self.nodes[id].is_leaf(),
                "bptree.split"
            );

            let right = self.nodes[id].right;
            self.nodes[sibling].left = Some(id);
            self.nodes[sibling].right = right;
            if let Some(right) = right {
                self.nodes[right].left = Some(sibling);
            }
            self.nodes[id].right = Some(sibling);

            let Some(parent) = self.nodes[id].parent else {
                let root = self.nodes.alloc_internal();
                let node = &mut self.nodes[root];
                node.keys.push(separator);
                node.children_mut().extend([id, sibling]);
                self.nodes[id].parent = Some(root);
                self.nodes[sibling].parent = Some(root);
                self.root = root;
                debug!(root = %root, height = self.height(), "bptree.root_grow");
                return;
            };

            let pos = self.child_index(parent, id);
            self.nodes[sibling].parent = Some(parent);
            let node = &mut self.nodes[parent];
            node.keys.insert(pos, separator);
            node.children_mut().insert(pos + 1, sibling);
            id = parent;
        }
    }
}
