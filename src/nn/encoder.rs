//! State encoding for predictor input.
//!
//! Transforms positions into flat feature vectors and maps moves onto a fixed
//! action index space, so a predictor can be written once against numbers
//! instead of game types.

use crate::core::Color;
use crate::games::connect_four::{Column, ConnectFour, ConnectFourPosition};
use crate::nn::traits::EncodedState;
use crate::rules::RulesEngine;

/// Encodes positions and moves for a predictor.
///
/// Each encoder defines:
/// - How to convert a position to features from the mover's perspective
/// - The size of the feature vector
/// - A bijection between moves and `0..action_space_size()`
pub trait StateEncoder<E: RulesEngine>: Send + Sync {
    /// Encode `position` as seen by `perspective`.
    fn encode(&self, position: &E::Position, perspective: Color) -> EncodedState;

    /// Number of features produced by `encode`.
    fn feature_count(&self) -> usize;

    /// Number of distinct move indices.
    fn action_space_size(&self) -> usize;

    /// Index of a move, `None` if the move is outside the action space.
    fn move_index(&self, mv: &E::Move) -> Option<usize>;

    /// Move for an index, `None` if out of range.
    fn index_move(&self, index: usize) -> Option<E::Move>;
}

/// Encoder for Connect Four.
///
/// Features, in order:
/// - One per cell (row-major, bottom row first): +1 own piece, -1 opponent
///   piece, 0 empty
/// - Fraction of the board filled
///
/// Action `i` is a drop into column `i`.
#[derive(Clone, Debug)]
pub struct ConnectFourEncoder {
    columns: usize,
    rows: usize,
}

impl ConnectFourEncoder {
    /// Encoder matching the given rules' board size.
    pub fn new(game: &ConnectFour) -> Self {
        Self {
            columns: game.columns(),
            rows: game.rows(),
        }
    }
}

impl StateEncoder<ConnectFour> for ConnectFourEncoder {
    fn encode(&self, position: &ConnectFourPosition, perspective: Color) -> EncodedState {
        debug_assert_eq!(position.columns(), self.columns);
        debug_assert_eq!(position.rows(), self.rows);

        let cells = self.columns * self.rows;
        let mut tensor = vec![0.0f32; cells + 1];

        for row in 0..self.rows {
            for column in 0..self.columns {
                tensor[row * self.columns + column] = match position.cell(column, row) {
                    Some(c) if c == perspective => 1.0,
                    Some(_) => -1.0,
                    None => 0.0,
                };
            }
        }
        tensor[cells] = position.info.ply as f32 / cells as f32;

        EncodedState::new(tensor, vec![cells + 1])
    }

    fn feature_count(&self) -> usize {
        self.columns * self.rows + 1
    }

    fn action_space_size(&self) -> usize {
        self.columns
    }

    fn move_index(&self, mv: &Column) -> Option<usize> {
        (mv.index() < self.columns).then_some(mv.index())
    }

    fn index_move(&self, index: usize) -> Option<Column> {
        (index < self.columns).then(|| Column(index as u8))
    }
}
