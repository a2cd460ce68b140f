//! Agent API for move selection.

use thiserror::Error;

use crate::core::{Color, GameRng};
use crate::mcts::SearchError;
use crate::rules::RulesEngine;

/// Errors an agent can report instead of a move.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("No legal moves for {0}")]
    NoLegalMoves(Color),

    #[error("Game is already over")]
    GameOver,

    #[error("Search failed: {0}")]
    Search(SearchError),
}

impl From<SearchError> for AgentError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::GameOver => AgentError::GameOver,
            other => AgentError::Search(other),
        }
    }
}

/// Anything that can choose a move for the side to move.
///
/// `position` may be mutated while thinking but is restored before
/// `select_move` returns, on success and on error.
pub trait Agent<E: RulesEngine> {
    /// Choose a legal move for the side to move in `position`.
    fn select_move(&mut self, position: &mut E::Position) -> Result<E::Move, AgentError>;
}

/// Uniformly random legal moves.
#[derive(Clone, Debug)]
pub struct RandomAgent<'e, E> {
    engine: &'e E,
    rng: GameRng,
}

impl<'e, E: RulesEngine> RandomAgent<'e, E> {
    /// Random agent drawing from `rng`.
    pub fn new(engine: &'e E, rng: GameRng) -> Self {
        Self { engine, rng }
    }
}

impl<E: RulesEngine> Agent<E> for RandomAgent<'_, E> {
    fn select_move(&mut self, position: &mut E::Position) -> Result<E::Move, AgentError> {
        if self.engine.is_ended(position) {
            return Err(AgentError::GameOver);
        }
        let color = self.engine.to_move(position);
        let moves = self.engine.legal_moves(position, color);
        self.rng
            .choose(&moves)
            .cloned()
            .ok_or(AgentError::NoLegalMoves(color))
    }
}
