// =============================================================================
// Node arena
// =============================================================================
//
// Every structural node lives in a slot of `NodeArena` and is addressed by a
// `NodeId`. Parent, sibling and child links are ids, so splicing a node out of
// the tree never leaves a dangling reference: a freed slot is only reachable
// again after `alloc` hands it out for a new node.
//
// Leaf:      keys = the stored keys
// Internal:  keys[i] = min key of subtree children[i + 1]
//            children.len() == keys.len() + 1

use std::fmt;

/// Index of a node inside the tree's arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub(crate) enum NodeKind {
    Leaf,
    Internal { children: Vec<NodeId> },
}

#[derive(Clone, Debug)]
pub(crate) struct Node<K> {
    pub(crate) keys: Vec<K>,
    pub(crate) kind: NodeKind,
    /// Same-level neighbours, possibly under a different parent.
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl<K> Node<K> {
    fn leaf(degree: usize) -> Self {
        Self {
            keys: Vec::with_capacity(degree),
            kind: NodeKind::Leaf,
            left: None,
            right: None,
            parent: None,
        }
    }

    fn internal(degree: usize) -> Self {
        Self {
            keys: Vec::with_capacity(degree),
            kind: NodeKind::Internal {
                children: Vec::with_capacity(degree + 1),
            },
            left: None,
            right: None,
            parent: None,
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.keys.len()
    }

    /// Child ids of an internal node; empty for a leaf.
    #[inline]
    pub(crate) fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Leaf => &[],
            NodeKind::Internal { children } => children,
        }
    }

    #[inline]
    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        match &mut self.kind {
            NodeKind::Internal { children } => children,
            NodeKind::Leaf => unreachable!("children_mut on a leaf node"),
        }
    }
}

/// Slot arena owning every node of one tree, with a free list for reuse.
#[derive(Clone)]
pub(crate) struct NodeArena<K> {
    slots: Vec<Option<Node<K>>>,
    free: Vec<NodeId>,
    degree: usize,
}

impl<K> NodeArena<K> {
    pub(crate) fn new(degree: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            degree,
        }
    }

    fn alloc(&mut self, node: Node<K>) -> NodeId {
        if let Some(id) = self.free.pop() {
            debug_assert!(self.slots[id.index()].is_none());
            self.slots[id.index()] = Some(node);
            return id;
        }
        let id = NodeId(u32::try_from(self.slots.len()).expect("node arena exhausted u32 ids"));
        self.slots.push(Some(node));
        id
    }

    pub(crate) fn alloc_leaf(&mut self) -> NodeId {
        let node = Node::leaf(self.degree);
        self.alloc(node)
    }

    pub(crate) fn alloc_internal(&mut self) -> NodeId {
        let node = Node::internal(self.degree);
        self.alloc(node)
    }

    /// Releases a node's slot and returns whatever keys it still held.
    pub(crate) fn free(&mut self, id: NodeId) -> Node<K> {
        let node = self.slots[id.index()]
            .take()
            .unwrap_or_else(|| panic!("double free of node {id}"));
        self.free.push(id);
        node
    }

    /// Number of live nodes.
    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        let len = self.slots.len();
        self.free.retain(|id| id.index() < len);
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
    }
}

impl<K> std::ops::Index<NodeId> for NodeArena<K> {
    type Output = Node<K>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<K> {
        match &self.slots[id.index()] {
            Some(node) => node,
            None => panic!("access to freed node {id}"),
        }
    }
}

impl<K> std::ops::IndexMut<NodeId> for NodeArena<K> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<K> {
        match &mut self.slots[id.index()] {
            Some(node) => node,
            None => panic!("access to freed node {id}"),
        }
    }
}
