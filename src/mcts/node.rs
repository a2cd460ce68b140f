//! MCTS node and edge structures.
//!
//! Uses arena-based allocation with index references (NodeId) for efficiency
//! and serializability.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::Color;

/// Index into the [`MCTSTree`](super::MCTSTree) node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value representing no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Create a new node ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Check if this is the NONE sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Get the raw index value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "NodeId(NONE)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// A legal move out of a node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge<M> {
    /// The move this edge represents.
    pub mv: M,

    /// Child node (NONE until first explored).
    pub child: NodeId,

    /// Masked, renormalized predictor probability.
    pub prior: f32,
}

impl<M> Edge<M> {
    /// Unexplored edge.
    pub fn new(mv: M, prior: f32) -> Self {
        Self {
            mv,
            child: NodeId::NONE,
            prior,
        }
    }

    /// Check if the child exists.
    #[inline]
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        !self.child.is_none()
    }
}

/// One position reached during search.
///
/// `value_estimate` is kept from the perspective of the side that moved
/// *into* this node, so a parent reads its children's Q as its own value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node<M> {
    /// Side to move at this node.
    pub to_move: Color,

    /// Depth in tree (root = 0).
    pub depth: u16,

    /// Outgoing edges, one per legal move, in rule-engine order.
    pub edges: SmallVec<[Edge<M>; 8]>,

    /// Simulations that passed through this node.
    pub visit_count: u32,

    /// Running mean of backed-up values (Q).
    pub value_estimate: f32,

    /// Predictor value at creation, from `to_move`'s perspective.
    pub predicted_value: f32,
}

impl<M> Node<M> {
    /// Unvisited node.
    pub fn new(
        to_move: Color,
        depth: u16,
        edges: SmallVec<[Edge<M>; 8]>,
        predicted_value: f32,
    ) -> Self {
        Self {
            to_move,
            depth,
            edges,
            visit_count: 0,
            value_estimate: 0.0,
            predicted_value,
        }
    }

    /// Fold one backed-up value into the running mean.
    #[inline]
    pub fn record(&mut self, value: f32) {
        let n = self.visit_count as f32;
        self.value_estimate = (n * self.value_estimate + value) / (n + 1.0);
        self.visit_count += 1;
    }

    /// Legal moves in order.
    pub fn moves(&self) -> impl Iterator<Item = &M> + '_ {
        self.edges.iter().map(|e| &e.mv)
    }

    /// Priors in move order.
    pub fn priors(&self) -> impl Iterator<Item = f32> + '_ {
        self.edges.iter().map(|e| e.prior)
    }

    /// A node with no legal moves.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_node_id() {
        let id = NodeId::new(5);
        assert_eq!(id.raw(), 5);
        assert!(!id.is_none());
        assert_eq!(format!("{}", id), "NodeId(5)");

        assert!(NodeId::NONE.is_none());
        assert_eq!(format!("{}", NodeId::NONE), "NodeId(NONE)");
    }

    #[test]
    fn test_edge_new() {
        let edge = Edge::new('a', 0.25);
        assert!(edge.child.is_none());
        assert!(!edge.is_expanded());
        assert_eq!(edge.prior, 0.25);
    }

    #[test]
    fn test_record_is_running_mean() {
        let mut node: Node<char> = Node::new(Color::Black, 0, SmallVec::new(), 0.0);
        for v in [1.0, -1.0, 0.5, 0.5] {
            node.record(v);
        }
        assert_eq!(node.visit_count, 4);
        assert!((node.value_estimate - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_moves_and_priors() {
        let node = Node::new(
            Color::White,
            1,
            smallvec![Edge::new('a', 0.75), Edge::new('b', 0.25)],
            -0.3,
        );
        assert_eq!(node.moves().copied().collect::<Vec<_>>(), vec!['a', 'b']);
        assert_eq!(node.priors().collect::<Vec<_>>(), vec![0.75, 0.25]);
        assert!(!node.is_blocked());
        assert_eq!(node.predicted_value, -0.3);
    }

    #[test]
    fn test_serialization() {
        let mut node = Node::new(Color::White, 2, smallvec![Edge::new(3u8, 1.0)], 0.1);
        node.record(0.5);

        let json = serde_json::to_string(&node).unwrap();
        let deserialized: Node<u8> = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.to_move, Color::White);
        assert_eq!(deserialized.visit_count, 1);
        assert_eq!(deserialized.edges.len(), 1);
    }
}
