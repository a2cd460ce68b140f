//! Core PUCT search.
//!
//! One [`MCTSSearch`] serves one move decision. It borrows the live position
//! mutably, applies moves in place while descending and relies on
//! [`MoveGuard`](crate::rules::MoveGuard) to revert them, so the position is
//! unchanged between simulations no matter how a simulation ends.
//!
//! ## Value convention
//!
//! `descend` returns values from the perspective of the side to move at the
//! node it was called on. Each node's Q is stored from the perspective of the
//! side that moved into it, which makes a child's Q directly comparable by
//! its parent during selection.

use std::time::Instant;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{trace, warn};

use crate::core::Color;
use crate::nn::{Predictor, PredictorError};
use crate::rules::RulesEngine;

use super::config::MCTSConfig;
use super::node::{Edge, Node, NodeId};
use super::stats::SearchStats;
use super::tree::{MCTSTree, TreeStats};

/// Errors raised by search and distribution extraction.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Predictor failed: {0}")]
    Predictor(#[from] PredictorError),

    #[error("Root has no explored children; run at least one simulation first")]
    Unsearched,

    #[error("Root position has no legal moves")]
    NoLegalMoves,

    #[error("Root position is already decided")]
    GameOver,
}

/// Visit statistics for one explored root move.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildReport<M> {
    /// The move.
    pub mv: M,
    /// Simulations through this move.
    pub visits: u32,
    /// Mean value for the root's side to move.
    pub value: f32,
    /// Prior after masking.
    pub prior: f32,
}

/// Raw statistics of a finished search, returned alongside a decision.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchReport<M> {
    /// Side to move at the root.
    pub to_move: Color,
    /// Simulations through the root.
    pub root_visits: u32,
    /// Mean backed-up value for the root's side to move.
    pub root_value: f32,
    /// Explored root moves in move order.
    pub children: Vec<ChildReport<M>>,
    /// Search counters.
    pub stats: SearchStats,
    /// Tree shape.
    pub tree: TreeStats,
}

/// PUCT search rooted at a borrowed position.
pub struct MCTSSearch<'a, E: RulesEngine, P: ?Sized> {
    engine: &'a E,
    predictor: &'a P,
    cpuct: f32,
    position: &'a mut E::Position,
    tree: MCTSTree<E::Move>,
    stats: SearchStats,
}

impl<'a, E, P> MCTSSearch<'a, E, P>
where
    E: RulesEngine,
    P: Predictor<E> + ?Sized,
{
    /// Expand the root for the side to move in `position`.
    ///
    /// Fails with [`SearchError::GameOver`] on a finished position and with
    /// [`SearchError::NoLegalMoves`] if the side to move cannot move.
    pub fn new(
        engine: &'a E,
        predictor: &'a P,
        config: &MCTSConfig,
        position: &'a mut E::Position,
    ) -> Result<Self, SearchError> {
        if engine.is_ended(position) {
            return Err(SearchError::GameOver);
        }

        let mut stats = SearchStats::new();
        let to_move = engine.to_move(position);
        let root = expand(engine, predictor, &*position, to_move, 0, &mut stats)?;
        if root.is_blocked() {
            return Err(SearchError::NoLegalMoves);
        }

        let capacity = config.simulations as usize + 1;
        Ok(Self {
            engine,
            predictor,
            cpuct: config.cpuct,
            position,
            tree: MCTSTree::with_capacity(root, capacity),
            stats,
        })
    }

    /// Run one simulation from the root.
    ///
    /// Returns the simulation's value for the root's side to move. On error
    /// no statistics are updated and the position is left as it was.
    pub fn simulate(&mut self) -> Result<f32, SearchError> {
        let start = Instant::now();
        let root = self.tree.root();
        let color = self.tree.get(root).to_move;

        let mut simulation = Simulation {
            engine: self.engine,
            predictor: self.predictor,
            cpuct: self.cpuct,
            tree: &mut self.tree,
            stats: &mut self.stats,
        };
        let value = simulation.descend(&mut *self.position, root, color)?;

        self.stats.simulations += 1;
        self.stats.time_us += start.elapsed().as_micros() as u64;

        debug_assert_eq!(
            self.tree.root_node().visit_count,
            self.tree.child_visits(root),
            "root visits must equal the sum of child visits"
        );
        trace!(value, simulations = self.stats.simulations, "Simulation complete");

        Ok(value)
    }

    /// Run `simulations` simulations.
    pub fn run(&mut self, simulations: u32) -> Result<(), SearchError> {
        for _ in 0..simulations {
            self.simulate()?;
        }
        Ok(())
    }

    /// The search tree.
    #[must_use]
    pub fn tree(&self) -> &MCTSTree<E::Move> {
        &self.tree
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// The position being searched (always in its root state between calls).
    #[must_use]
    pub fn position(&self) -> &E::Position {
        self.position
    }

    /// Snapshot of root statistics.
    #[must_use]
    pub fn report(&self) -> SearchReport<E::Move> {
        let root = self.tree.root_node();
        let children = self
            .tree
            .children(self.tree.root())
            .map(|(edge, child)| ChildReport {
                mv: edge.mv.clone(),
                visits: child.visit_count,
                value: child.value_estimate,
                prior: edge.prior,
            })
            .collect();

        SearchReport {
            to_move: root.to_move,
            root_visits: root.visit_count,
            root_value: -root.value_estimate,
            children,
            stats: self.stats.clone(),
            tree: self.tree.stats(),
        }
    }
}

/// Index of the edge with the strictly greatest PUCT score.
///
/// Ties go to the earliest edge. Unexplored edges score with Q = 0, so at an
/// unvisited node the first move is chosen. Returns `None` for a node
/// without edges.
pub fn select_edge<M>(tree: &MCTSTree<M>, id: NodeId, cpuct: f32) -> Option<usize> {
    let node = tree.get(id);
    if node.edges.is_empty() {
        return None;
    }

    let sqrt_n = (node.visit_count as f32).sqrt();
    let mut best = f32::NEG_INFINITY;
    let mut best_index = 0;

    for (i, edge) in node.edges.iter().enumerate() {
        let score = if edge.is_expanded() {
            let child = tree.get(edge.child);
            child.value_estimate + cpuct * edge.prior * sqrt_n / (1.0 + child.visit_count as f32)
        } else {
            cpuct * edge.prior * sqrt_n
        };
        if score > best {
            best = score;
            best_index = i;
        }
    }

    Some(best_index)
}

/// Query the predictor and build an unvisited node for `color` to move.
fn expand<E, P>(
    engine: &E,
    predictor: &P,
    position: &E::Position,
    color: Color,
    depth: u16,
    stats: &mut SearchStats,
) -> Result<Node<E::Move>, SearchError>
where
    E: RulesEngine,
    P: Predictor<E> + ?Sized,
{
    let prediction = predictor.predict(position, color)?;
    let legal = engine.legal_moves(position, color);

    let mut masked: FxHashMap<&E::Move, f32> = FxHashMap::default();
    for (mv, p) in &prediction.moves {
        if p.is_finite() && *p > 0.0 {
            *masked.entry(mv).or_insert(0.0) += p;
        }
    }
    let mut priors: Vec<f32> = legal
        .iter()
        .map(|mv| masked.get(mv).copied().unwrap_or(0.0))
        .collect();

    let total: f32 = priors.iter().sum();
    if total > 0.0 {
        for p in &mut priors {
            *p /= total;
        }
    } else if !legal.is_empty() {
        warn!(
            legal_moves = legal.len(),
            depth, "Predictor assigned no probability to any legal move, using uniform priors"
        );
        stats.uniform_fallbacks += 1;
        priors.fill(1.0 / legal.len() as f32);
    }

    let edges: SmallVec<[Edge<E::Move>; 8]> = legal
        .into_iter()
        .zip(priors)
        .map(|(mv, prior)| Edge::new(mv, prior))
        .collect();

    stats.nodes_created += 1;
    stats.max_depth = stats.max_depth.max(depth);

    Ok(Node::new(color, depth, edges, prediction.value.clamp(-1.0, 1.0)))
}

/// Split borrows for one simulation: the tree and counters are mutated while
/// the position travels down the recursion separately.
struct Simulation<'s, E: RulesEngine, P: ?Sized> {
    engine: &'s E,
    predictor: &'s P,
    cpuct: f32,
    tree: &'s mut MCTSTree<E::Move>,
    stats: &'s mut SearchStats,
}

impl<E, P> Simulation<'_, E, P>
where
    E: RulesEngine,
    P: Predictor<E> + ?Sized,
{
    /// Value of `id` for `color`, the side to move there.
    fn descend(
        &mut self,
        position: &mut E::Position,
        id: NodeId,
        color: Color,
    ) -> Result<f32, SearchError> {
        let value = if self.engine.is_ended(position) {
            self.stats.terminal_hits += 1;
            color.outcome(self.engine.winner(position))
        } else if let Some(index) = select_edge(&*self.tree, id, self.cpuct) {
            let node = self.tree.get(id);
            let edge = &node.edges[index];
            let (mv, child, depth) = (edge.mv.clone(), edge.child, node.depth + 1);

            let mut guard = self.engine.play(position, &mv);
            if child.is_none() {
                let mut leaf = expand(
                    self.engine,
                    self.predictor,
                    &*guard,
                    color.opponent(),
                    depth,
                    &mut *self.stats,
                )?;
                let value = -leaf.predicted_value;
                leaf.record(value);
                self.tree.attach(id, index, leaf);
                value
            } else {
                -self.descend(&mut *guard, child, color.opponent())?
            }
        } else {
            // Blocked: unable to move loses.
            self.stats.terminal_hits += 1;
            -1.0
        };

        self.tree.get_mut(id).record(-value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::connect_four::{Column, ConnectFour};
    use crate::nn::UniformPredictor;

    fn config(simulations: u32) -> MCTSConfig {
        MCTSConfig::default().with_simulations(simulations)
    }

    #[test]
    fn test_root_expansion() {
        let game = ConnectFour::new();
        let predictor = UniformPredictor::new(game.clone());
        let mut position = game.initial_position();
        let search = MCTSSearch::new(&game, &predictor, &config(10), &mut position).unwrap();

        let root = search.tree().root_node();
        assert_eq!(root.edges.len(), 7);
        assert_eq!(root.visit_count, 0);
        let sum: f32 = root.priors().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(search.stats().nodes_created, 1);
    }

    #[test]
    fn test_first_simulation_takes_first_move() {
        let game = ConnectFour::new();
        let predictor = UniformPredictor::new(game.clone()).with_value(0.25);
        let mut position = game.initial_position();
        let mut search = MCTSSearch::new(&game, &predictor, &config(1), &mut position).unwrap();

        let value = search.simulate().unwrap();
        let tree = search.tree();
        let first = &tree.root_node().edges[0];
        assert_eq!(first.mv, Column(0));
        assert!(first.is_expanded());
        assert!(tree.root_node().edges[1..].iter().all(|e| !e.is_expanded()));

        // The new child is scored by the predictor from the opponent's side.
        assert_eq!(value, -0.25);
        assert_eq!(tree.get(first.child).value_estimate, -0.25);
        assert_eq!(tree.root_node().value_estimate, 0.25);
    }

    #[test]
    fn test_select_prefers_high_prior_then_order() {
        let mut tree = MCTSTree::new(Node::new(
            Color::Black,
            0,
            smallvec::smallvec![Edge::new(0u8, 0.2), Edge::new(1u8, 0.4), Edge::new(2u8, 0.4)],
            0.0,
        ));
        // Unvisited root: every score is zero, first edge wins.
        assert_eq!(select_edge(&tree, tree.root(), 1.0), Some(0));

        tree.get_mut(tree.root()).record(0.0);
        assert_eq!(select_edge(&tree, tree.root(), 1.0), Some(1));
    }

    #[test]
    fn test_select_on_blocked_node() {
        let tree: MCTSTree<u8> = MCTSTree::new(Node::new(Color::Black, 0, SmallVec::new(), 0.0));
        assert_eq!(select_edge(&tree, tree.root(), 1.0), None);
    }

    #[test]
    fn test_finds_immediate_win() {
        let game = ConnectFour::new();
        let predictor = UniformPredictor::new(game.clone());
        let mut position = game.position_from_moves(&[0, 1, 0, 1, 0, 1]).unwrap();
        let before = position.clone();

        let mut search = MCTSSearch::new(&game, &predictor, &config(200), &mut position).unwrap();
        search.run(200).unwrap();

        let report = search.report();
        assert_eq!(report.root_visits, 200);
        let best = report.children.iter().max_by_key(|c| c.visits).unwrap();
        assert_eq!(best.mv, Column(0));
        assert!(best.value > 0.9);
        assert!(report.stats.terminal_hits > 0);

        drop(search);
        assert_eq!(position, before);
    }

    #[test]
    fn test_rejects_finished_root() {
        let game = ConnectFour::new();
        let predictor = UniformPredictor::new(game.clone());
        let mut position = game.position_from_moves(&[0, 1, 0, 1, 0, 1, 0]).unwrap();
        let result = MCTSSearch::new(&game, &predictor, &config(1), &mut position);
        assert!(matches!(result, Err(SearchError::GameOver)));
    }

    #[test]
    fn test_report_visits_match() {
        let game = ConnectFour::with_size(4, 4, 3);
        let predictor = UniformPredictor::new(game.clone());
        let mut position = game.initial_position();
        let mut search = MCTSSearch::new(&game, &predictor, &config(64), &mut position).unwrap();
        search.run(64).unwrap();

        let report = search.report();
        assert_eq!(report.to_move, Color::Black);
        assert_eq!(report.children.iter().map(|c| c.visits).sum::<u32>(), 64);
        assert_eq!(report.stats.simulations, 64);
        assert_eq!(report.tree.node_count as u32, report.stats.nodes_created);
    }
}
