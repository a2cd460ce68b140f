//! Non-learning baseline opponent.
//!
//! Depth-limited negamax with alpha-beta pruning over a game-specific
//! [`Heuristic`]. With probability `exploration` it plays a random legal move
//! instead, which keeps evaluation matches from replaying one line.

use serde::{Deserialize, Serialize};

use crate::core::{Color, GameRng};
use crate::rules::RulesEngine;

use super::agent::{Agent, AgentError};

/// Score of a decided game, larger than any heuristic value.
const WIN_SCORE: f32 = 1.0e6;

/// Static evaluation of a non-terminal position.
pub trait Heuristic<E: RulesEngine>: Send + Sync {
    /// Score for `color`; positive favors `color`. Must be antisymmetric.
    fn evaluate(&self, position: &E::Position, color: Color) -> f32;
}

/// Baseline tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Plies searched.
    pub depth: u32,

    /// Probability of a uniformly random move.
    pub exploration: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            depth: 4,
            exploration: 0.05,
        }
    }
}

impl BaselineConfig {
    /// Set the search depth.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Set the random move probability, clamped to `[0, 1]`.
    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration.clamp(0.0, 1.0);
        self
    }
}

/// Alpha-beta agent over a heuristic.
pub struct BaselineAgent<'e, E, H> {
    engine: &'e E,
    heuristic: H,
    config: BaselineConfig,
    rng: GameRng,
}

impl<'e, E, H> BaselineAgent<'e, E, H>
where
    E: RulesEngine,
    H: Heuristic<E>,
{
    /// Baseline agent.
    pub fn new(engine: &'e E, heuristic: H, config: BaselineConfig, rng: GameRng) -> Self {
        Self {
            engine,
            heuristic,
            config,
            rng,
        }
    }

    /// Negamax value of `position` for `color`, the side to move.
    fn negamax(
        &self,
        position: &mut E::Position,
        color: Color,
        depth: u32,
        mut alpha: f32,
        beta: f32,
    ) -> f32 {
        if self.engine.is_ended(position) {
            // Prefer quicker wins and slower losses.
            return color.outcome(self.engine.winner(position)) * (WIN_SCORE + depth as f32);
        }
        if depth == 0 {
            return self.heuristic.evaluate(position, color);
        }

        let moves = self.engine.legal_moves(position, color);
        if moves.is_empty() {
            return -(WIN_SCORE + depth as f32);
        }

        let mut best = f32::NEG_INFINITY;
        for mv in &moves {
            let mut guard = self.engine.play(position, mv);
            let score = -self.negamax(&mut *guard, color.opponent(), depth - 1, -beta, -alpha);
            drop(guard);

            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }
        best
    }
}

impl<E, H> Agent<E> for BaselineAgent<'_, E, H>
where
    E: RulesEngine,
    H: Heuristic<E>,
{
    fn select_move(&mut self, position: &mut E::Position) -> Result<E::Move, AgentError> {
        if self.engine.is_ended(position) {
            return Err(AgentError::GameOver);
        }
        let color = self.engine.to_move(position);
        let moves = self.engine.legal_moves(position, color);
        if moves.is_empty() {
            return Err(AgentError::NoLegalMoves(color));
        }

        if self.config.exploration > 0.0 && self.rng.gen_bool(self.config.exploration) {
            return self
                .rng
                .choose(&moves)
                .cloned()
                .ok_or(AgentError::NoLegalMoves(color));
        }

        let depth = self.config.depth.max(1);
        let mut best_score = f32::NEG_INFINITY;
        let mut best: Vec<usize> = Vec::new();
        for (i, mv) in moves.iter().enumerate() {
            let mut guard = self.engine.play(position, mv);
            // Full window at the root so equal moves are not pruned away.
            let score = -self.negamax(
                &mut *guard,
                color.opponent(),
                depth - 1,
                f32::NEG_INFINITY,
                f32::INFINITY,
            );
            drop(guard);

            if score > best_score {
                best_score = score;
                best.clear();
                best.push(i);
            } else if score == best_score {
                best.push(i);
            }
        }

        let index = self.rng.choose(&best).copied().unwrap_or(0);
        Ok(moves[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::connect_four::{Column, ConnectFour, ConnectFourHeuristic};

    fn agent(
        game: &ConnectFour,
        depth: u32,
    ) -> BaselineAgent<'_, ConnectFour, ConnectFourHeuristic> {
        BaselineAgent::new(
            game,
            ConnectFourHeuristic::new(game),
            BaselineConfig::default().with_depth(depth).with_exploration(0.0),
            GameRng::new(5),
        )
    }

    #[test]
    fn test_takes_immediate_win() {
        let game = ConnectFour::new();
        let mut position = game.position_from_moves(&[3, 0, 3, 0, 3, 6]).unwrap();
        assert_eq!(agent(&game, 2).select_move(&mut position).unwrap(), Column(3));
    }

    #[test]
    fn test_blocks_opponent_win() {
        let game = ConnectFour::new();
        // White threatens to complete column 0 next move.
        let mut position = game.position_from_moves(&[6, 0, 5, 0, 1, 0]).unwrap();
        let before = position.clone();

        assert_eq!(agent(&game, 3).select_move(&mut position).unwrap(), Column(0));
        assert_eq!(position, before);
    }

    #[test]
    fn test_full_exploration_is_random_but_legal() {
        let game = ConnectFour::new();
        let mut position = game.initial_position();
        let mut agent = BaselineAgent::new(
            &game,
            ConnectFourHeuristic::new(&game),
            BaselineConfig::default().with_exploration(1.0),
            GameRng::new(8),
        );
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            seen.insert(agent.select_move(&mut position).unwrap());
        }
        assert!(seen.len() > 3);
    }

    #[test]
    fn test_config_builders() {
        let config = BaselineConfig::default().with_depth(6).with_exploration(2.0);
        assert_eq!(config.depth, 6);
        assert_eq!(config.exploration, 1.0);
    }
}
