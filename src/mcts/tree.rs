//! Arena-based MCTS tree.
//!
//! Uses a flat `Vec<Node>` with index-based references. A parent owns its
//! children through edge indices; the whole tree is dropped at once when the
//! decision it served is made.

use serde::{Deserialize, Serialize};

use super::node::{Edge, Node, NodeId};

/// Arena-based MCTS tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MCTSTree<M> {
    /// All nodes in the tree; the root is at index 0.
    nodes: Vec<Node<M>>,
}

impl<M> MCTSTree<M> {
    /// Create a tree owning `root`.
    pub fn new(root: Node<M>) -> Self {
        Self::with_capacity(root, 256)
    }

    /// Create a tree with custom initial capacity.
    pub fn with_capacity(root: Node<M>, capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(root);
        Self { nodes }
    }

    /// Get the root node ID.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Get a node by ID.
    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &Node<M> {
        &self.nodes[id.0 as usize]
    }

    /// Get a mutable node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<M> {
        &mut self.nodes[id.0 as usize]
    }

    /// Store `node` as the child behind `parent`'s edge `edge`.
    pub fn attach(&mut self, parent: NodeId, edge: usize, node: Node<M>) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        self.get_mut(parent).edges[edge].child = id;
        id
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the root node.
    #[must_use]
    pub fn root_node(&self) -> &Node<M> {
        self.get(self.root())
    }

    /// Explored children of `id` with the edge that leads to each.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (&Edge<M>, &Node<M>)> + '_ {
        self.get(id)
            .edges
            .iter()
            .filter(|e| e.is_expanded())
            .map(move |e| (e, self.get(e.child)))
    }

    /// Sum of the visit counts of `id`'s explored children.
    #[must_use]
    pub fn child_visits(&self, id: NodeId) -> u32 {
        self.children(id).map(|(_, n)| n.visit_count).sum()
    }

    /// Get statistics about the tree.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let max_depth = self.nodes.iter().map(|n| n.depth).max().unwrap_or(0);
        let blocked_count = self.nodes.iter().filter(|n| n.is_blocked()).count();
        let total_edges: usize = self.nodes.iter().map(|n| n.edges.len()).sum();
        let expanded_edges = self
            .nodes
            .iter()
            .flat_map(|n| n.edges.iter())
            .filter(|e| e.is_expanded())
            .count();

        TreeStats {
            node_count: self.nodes.len(),
            max_depth,
            blocked_count,
            total_edges,
            expanded_edges,
        }
    }
}

/// Shape of a finished tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Total number of nodes.
    pub node_count: usize,

    /// Maximum depth reached.
    pub max_depth: u16,

    /// Nodes without legal moves (finished or blocked positions).
    pub blocked_count: usize,

    /// Total number of edges (moves).
    pub total_edges: usize,

    /// Number of explored edges.
    pub expanded_edges: usize,
}

impl TreeStats {
    /// Get the branching factor (average edges per node).
    #[must_use]
    pub fn branching_factor(&self) -> f64 {
        if self.node_count == 0 {
            0.0
        } else {
            self.total_edges as f64 / self.node_count as f64
        }
    }

    /// Get the expansion ratio (expanded edges / total edges).
    #[must_use]
    pub fn expansion_ratio(&self) -> f64 {
        if self.total_edges == 0 {
            0.0
        } else {
            self.expanded_edges as f64 / self.total_edges as f64
        }
    }
}
