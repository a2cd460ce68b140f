//! Training examples produced by self-play.
//!
//! One example is recorded per search-driven decision. The value target is
//! unknown until the episode ends, so examples start at 0 and are labeled in
//! one pass with [`label_examples`].

use std::fmt;

use crate::core::Color;
use crate::rules::RulesEngine;

/// Position snapshot with search-derived policy target and outcome label.
pub struct TrainingExample<E: RulesEngine> {
    /// Position at decision time, including game metadata.
    pub position: E::Position,

    /// The side that acted.
    pub to_move: Color,

    /// Explored root moves with their share of the root's visits.
    pub policy: Vec<(E::Move, f32)>,

    /// Game outcome from `to_move`'s perspective: +1 win, -1 loss, 0 draw.
    pub value: f32,
}

impl<E: RulesEngine> TrainingExample<E> {
    /// Unlabeled example.
    pub fn new(position: E::Position, to_move: Color, policy: Vec<(E::Move, f32)>) -> Self {
        Self {
            position,
            to_move,
            policy,
            value: 0.0,
        }
    }

    /// Policy target for `mv`, 0 if the move was never explored.
    #[must_use]
    pub fn policy_for(&self, mv: &E::Move) -> f32 {
        self.policy
            .iter()
            .find(|(m, _)| m == mv)
            .map_or(0.0, |(_, p)| *p)
    }
}

impl<E: RulesEngine> Clone for TrainingExample<E> {
    fn clone(&self) -> Self {
        Self {
            position: self.position.clone(),
            to_move: self.to_move,
            policy: self.policy.clone(),
            value: self.value,
        }
    }
}

impl<E: RulesEngine> fmt::Debug for TrainingExample<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingExample")
            .field("position", &self.position)
            .field("to_move", &self.to_move)
            .field("policy", &self.policy)
            .field("value", &self.value)
            .finish()
    }
}

/// Attach the episode outcome to every example.
pub fn label_examples<E: RulesEngine>(examples: &mut [TrainingExample<E>], winner: Option<Color>) {
    for example in examples {
        example.value = example.to_move.outcome(winner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::connect_four::{Column, ConnectFour};

    fn examples(game: &ConnectFour) -> Vec<TrainingExample<ConnectFour>> {
        let mut position = game.initial_position();
        let mut out = Vec::new();
        for column in [3u8, 2, 3, 2] {
            let to_move = game.to_move(&position);
            out.push(TrainingExample::new(
                position.clone(),
                to_move,
                vec![(Column(column), 1.0)],
            ));
            game.make_move(&mut position, &Column(column));
        }
        out
    }

    #[test]
    fn test_new_example_is_unlabeled() {
        let game = ConnectFour::new();
        let examples = examples(&game);
        assert!(examples.iter().all(|e| e.value == 0.0));
        assert_eq!(examples[0].policy_for(&Column(3)), 1.0);
        assert_eq!(examples[0].policy_for(&Column(4)), 0.0);
    }

    #[test]
    fn test_label_decisive() {
        let game = ConnectFour::new();
        let mut examples = examples(&game);
        label_examples(&mut examples, Some(Color::White));

        for example in &examples {
            let expected = if example.to_move == Color::White { 1.0 } else { -1.0 };
            assert_eq!(example.value, expected);
        }
    }

    #[test]
    fn test_label_draw() {
        let game = ConnectFour::new();
        let mut examples = examples(&game);
        label_examples(&mut examples, None);
        assert!(examples.iter().all(|e| e.value == 0.0));
    }
}
