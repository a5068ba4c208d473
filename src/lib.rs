//! # bptree-rs
//!
//! An arena-backed B+ tree holding a set of unique keys ordered by a
//! caller-supplied three-way comparator.
//!
//! Keys carry their own payload: two keys are "the same" when the comparator
//! says `Equal`, and inserting an equal key replaces the stored one and hands
//! the old one back. Internal nodes hold guide keys, clones of the minimum key
//! of each child subtree to the right of the first, which is why the mutating
//! API needs `K: Clone` (use `Rc<T>`/`Arc<T>` for heavy payloads).
//!
//! ## Example
//!
//! ```rust
//! use bptree_rs::BpTree;
//!
//! let mut tree: BpTree<u64> = BpTree::new();
//! tree.insert(3);
//! tree.insert(1);
//! tree.insert(2);
//!
//! assert_eq!(tree.get(&2), Some(&2));
//! assert_eq!(tree.min_key(), Some(&1));
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
//! ```
//!
//! A custom ordering is any `Fn(&K, &K) -> Ordering`:
//!
//! ```rust
//! use bptree_rs::BpTree;
//!
//! let mut tree = BpTree::with_degree(4, |a: &i32, b: &i32| b.cmp(a)).unwrap();
//! tree.insert_batch(vec![1, 5, 3]);
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![5, 3, 1]);
//! ```

#![forbid(unsafe_code)]

mod batch;
mod compare;
mod error;
mod insert;
mod iter;
mod node;
mod remove;

pub use compare::{Comparator, NaturalOrder};
pub use error::{Error, Result};
pub use iter::{Iter, LeafRef};

use std::cmp::Ordering;
use std::fmt;
use std::io;

use node::{NodeArena, NodeId, NodeKind};
use tracing::debug;

// =============================================================================
// Configuration
// =============================================================================

/// Smallest degree the split/merge arithmetic supports.
pub const MIN_DEGREE: usize = 4;

/// Degree used by [`BpTree::new`] and [`Config::default`].
pub const DEFAULT_DEGREE: usize = 32;

/// Tree construction parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum keys per node; a node reaching this many keys splits.
    pub degree: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            degree: DEFAULT_DEGREE,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.degree < MIN_DEGREE {
            return Err(Error::InvalidDegree {
                degree: self.degree,
                min: MIN_DEGREE,
            });
        }
        Ok(())
    }
}

/// Structural change counters, kept per tree for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub split_leaf: u64,
    pub split_internal: u64,
    /// A deficient node took the last entry of its left sibling.
    pub borrow_left_leaf: u64,
    pub borrow_left_internal: u64,
    /// A deficient node took the first entry of its right sibling.
    pub borrow_right_leaf: u64,
    pub borrow_right_internal: u64,
    /// A deficient node was folded into its left sibling.
    pub merge_left_leaf: u64,
    pub merge_left_internal: u64,
    /// A deficient node absorbed its right sibling.
    pub merge_right_leaf: u64,
    pub merge_right_internal: u64,
}

// =============================================================================
// BpTree
// =============================================================================

/// A B+ tree set ordered by the comparator `C`.
///
/// All keys live in leaves. Leaves on the same level, and internal nodes on
/// the same level, form a doubly linked sibling chain; ascending iteration
/// walks the leaf chain. The tree owns every node; keys moved out by
/// [`remove`](Self::remove) or replaced by [`insert`](Self::insert) are handed
/// back to the caller.
pub struct BpTree<K, C = NaturalOrder> {
    nodes: NodeArena<K>,
    root: NodeId,
    degree: usize,
    len: usize,
    cmp: C,
    stats: Stats,
}

impl<K: Ord> BpTree<K, NaturalOrder> {
    /// Creates an empty tree with [`DEFAULT_DEGREE`], ordered by `K: Ord`.
    pub fn new() -> Self {
        Self::build(DEFAULT_DEGREE, NaturalOrder)
    }
}

impl<K: Ord> Default for BpTree<K, NaturalOrder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C: Comparator<K>> BpTree<K, C> {
    /// Creates an empty tree; fails if `degree < MIN_DEGREE`.
    pub fn with_degree(degree: usize, cmp: C) -> Result<Self> {
        Self::with_config(Config { degree }, cmp)
    }

    pub fn with_config(config: Config, cmp: C) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config.degree, cmp))
    }

    fn build(degree: usize, cmp: C) -> Self {
        let mut nodes = NodeArena::new(degree);
        let root = nodes.alloc_leaf();
        debug!(degree, "bptree.init");
        Self {
            nodes,
            root,
            degree,
            len: 0,
            cmp,
            stats: Stats::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Number of levels, counting the leaf level; an empty tree has height 1.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.root;
        while let Some(&child) = self.nodes[current].children().first() {
            height += 1;
            current = child;
        }
        height
    }

    /// Number of structural nodes currently allocated.
    pub fn node_count(&self) -> usize {
        self.nodes.live()
    }

    /// Returns the stored key comparing equal to `key`.
    pub fn get(&self, key: &K) -> Option<&K> {
        let leaf = self.find_leaf(key);
        let keys = &self.nodes[leaf].keys;
        self.search(keys, key).ok().map(|pos| &keys[pos])
    }

    /// Same as [`get`](Self::get).
    #[inline]
    pub fn lookup(&self, key: &K) -> Option<&K> {
        self.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn min_key(&self) -> Option<&K> {
        self.subtree_min(self.root)
    }

    pub fn max_key(&self) -> Option<&K> {
        self.nodes[self.rightmost_leaf(self.root)].keys.last()
    }

    /// The leftmost leaf; on an empty tree this is the empty root leaf.
    pub fn min_leaf(&self) -> LeafRef<'_, K> {
        LeafRef::new(&self.nodes, self.leftmost_leaf(self.root))
    }

    /// The rightmost leaf; on an empty tree this is the empty root leaf.
    pub fn max_leaf(&self) -> LeafRef<'_, K> {
        LeafRef::new(&self.nodes, self.rightmost_leaf(self.root))
    }

    /// Ascending iterator over every key.
    ///
    /// The iterator borrows the tree, so the tree cannot be modified until it
    /// is dropped.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter::new(
            &self.nodes,
            self.leftmost_leaf(self.root),
            self.rightmost_leaf(self.root),
            self.len,
        )
    }

    // =========================================================================
    // Descent helpers
    // =========================================================================

    /// Leaf that holds `key` if it is present, or where it would be inserted.
    ///
    /// At each internal node the search takes the child just before the first
    /// guide key greater than `key`.
    pub(crate) fn find_leaf(&self, key: &K) -> NodeId {
        let mut current = self.root;
        loop {
            let node = &self.nodes[current];
            match &node.kind {
                NodeKind::Leaf => return current,
                NodeKind::Internal { children } => {
                    let idx = node
                        .keys
                        .partition_point(|guide| self.cmp.compare(guide, key) != Ordering::Greater);
                    current = children[idx];
                }
            }
        }
    }

    #[inline]
    pub(crate) fn search(&self, keys: &[K], key: &K) -> std::result::Result<usize, usize> {
        keys.binary_search_by(|probe| self.cmp.compare(probe, key))
    }

    pub(crate) fn leftmost_leaf(&self, mut id: NodeId) -> NodeId {
        while let Some(&child) = self.nodes[id].children().first() {
            id = child;
        }
        id
    }

    pub(crate) fn rightmost_leaf(&self, mut id: NodeId) -> NodeId {
        while let Some(&child) = self.nodes[id].children().last() {
            id = child;
        }
        id
    }

    /// Minimum key under `id`, or `None` while that subtree's leftmost leaf is
    /// empty (only the root, or a leaf in the middle of a rebalance).
    pub(crate) fn subtree_min(&self, id: NodeId) -> Option<&K> {
        self.nodes[self.leftmost_leaf(id)].keys.first()
    }

    /// Position of `child` in `parent`'s child list.
    pub(crate) fn child_index(&self, parent: NodeId, child: NodeId) -> usize {
        self.nodes[parent]
            .children()
            .iter()
            .position(|&c| c == child)
            .expect("child must be linked from its parent")
    }

    // =========================================================================
    // Debug output
    // =========================================================================

    /// Writes the tree level by level, root first, one line per level with
    /// every node of that level rendered as `[k k k]` in sibling-chain order.
    pub fn write_levels<W, D, F>(&self, out: &mut W, render: F) -> io::Result<()>
    where
        W: io::Write,
        D: fmt::Display,
        F: Fn(&K) -> D,
    {
        let mut level = Some(self.root);
        while let Some(head) = level {
            let mut current = Some(head);
            let mut first = true;
            while let Some(id) = current {
                let node = &self.nodes[id];
                if !first {
                    write!(out, " ")?;
                }
                first = false;
                write!(out, "[")?;
                for (i, key) in node.keys.iter().enumerate() {
                    if i > 0 {
                        write!(out, " ")?;
                    }
                    write!(out, "{}", render(key))?;
                }
                write!(out, "]")?;
                current = node.right;
            }
            writeln!(out)?;
            level = self.nodes[head].children().first().copied();
        }
        Ok(())
    }

    /// [`write_levels`](Self::write_levels) to stdout.
    pub fn print<D, F>(&self, render: F) -> io::Result<()>
    where
        D: fmt::Display,
        F: Fn(&K) -> D,
    {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.write_levels(&mut lock, render)
    }
}

// =============================================================================
// Shared maintenance
// =============================================================================

impl<K: Clone, C: Comparator<K>> BpTree<K, C> {
    /// Recomputes every guide key from `from` up to the root.
    ///
    /// Guide `keys[i]` of an internal node becomes a clone of the minimum of
    /// `children[i + 1]`. A guide whose subtree is momentarily empty keeps its
    /// old value; the rebalance that follows refreshes it again.
    pub(crate) fn refresh_guides(&mut self, from: NodeId) {
        let mut current = Some(from);
        while let Some(id) = current {
            let guides = if self.nodes[id].is_leaf() {
                0
            } else {
                self.nodes[id].size()
            };
            for i in 0..guides {
                let child = self.nodes[id].children()[i + 1];
                if let Some(min) = self.subtree_min(child) {
                    let min = min.clone();
                    self.nodes[id].keys[i] = min;
                }
            }
            current = self.nodes[id].parent;
        }
    }

    /// Removes every key, releasing each one to `release` in ascending order.
    ///
    /// Keys are taken out one by one through the regular removal path, so the
    /// tree stays balanced until the last one is gone.
    pub fn free(mut self, mut release: impl FnMut(K)) {
        while let Some(key) = self.pop_first() {
            release(key);
        }
        debug_assert_eq!(self.nodes.live(), 1);
    }

    /// Drops every key and resets the tree to a single empty leaf.
    pub fn clear(&mut self) {
        self.nodes = NodeArena::new(self.degree);
        self.root = self.nodes.alloc_leaf();
        self.len = 0;
    }

    /// Releases arena slots freed by merges.
    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }
}

impl<K: Clone, C: Comparator<K> + Clone> Clone for BpTree<K, C> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            degree: self.degree,
            len: self.len,
            cmp: self.cmp.clone(),
            stats: self.stats,
        }
    }
}

impl<K: fmt::Debug, C: Comparator<K>> fmt::Debug for BpTree<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: Clone, C: Comparator<K>> Extend<K> for BpTree<K, C> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord + Clone> FromIterator<K> for BpTree<K, NaturalOrder> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, K, C: Comparator<K>> IntoIterator for &'a BpTree<K, C> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


#[cfg(test)]
mod proptests;
