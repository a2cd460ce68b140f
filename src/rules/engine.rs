//! Rules engine trait for game implementations.
//!
//! Games implement `RulesEngine` to define their rules:
//! - What moves are legal for a side
//! - How moves modify (and un-modify) a position
//! - When the game is over and who won
//!
//! Search never clones positions per simulation. It applies moves in place
//! through [`RulesEngine::play`] and relies on the returned [`MoveGuard`] to
//! put the position back when the guard goes out of scope.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{Deref, DerefMut};

use crate::core::Color;

/// Rules engine trait.
///
/// ## Implementation Notes
///
/// - `legal_moves`: Return an empty vec if the side cannot move. The order
///   must be deterministic; search breaks ties by it.
/// - `apply_move` / `undo_move`: `undo_move(apply_move(p, m))` must restore
///   `p` exactly (including any game metadata such as ply counters).
/// - `is_ended` / `winner`: `winner` is only meaningful once `is_ended`.
pub trait RulesEngine: Send + Sync {
    /// Board plus game metadata (side to move, counters, ...).
    type Position: Clone + PartialEq + Debug + Send + Sync;

    /// A single move.
    type Move: Clone + PartialEq + Eq + Hash + Debug + Send + Sync;

    /// Whatever `undo_move` needs to reverse one `apply_move`.
    type Undo;

    /// The starting position of a new game.
    fn initial_position(&self) -> Self::Position;

    /// The side whose turn it is according to the position's metadata.
    fn to_move(&self, position: &Self::Position) -> Color;

    /// Legal moves for `color` in `position`.
    fn legal_moves(&self, position: &Self::Position, color: Color) -> Vec<Self::Move>;

    /// Apply a move in place, returning the information needed to undo it.
    fn apply_move(&self, position: &mut Self::Position, mv: &Self::Move) -> Self::Undo;

    /// Reverse a previous `apply_move`.
    fn undo_move(&self, position: &mut Self::Position, undo: Self::Undo);

    /// Has the game ended (win, loss or draw)?
    fn is_ended(&self, position: &Self::Position) -> bool;

    /// The winner of an ended game, `None` for a draw or an unfinished game.
    fn winner(&self, position: &Self::Position) -> Option<Color>;

    // === Convenience Methods ===

    /// Apply `mv` for the duration of the returned guard.
    ///
    /// The guard derefs to the mutated position. Dropping it (normally, on
    /// early return, or while unwinding) undoes the move.
    fn play<'a>(&'a self, position: &'a mut Self::Position, mv: &Self::Move) -> MoveGuard<'a, Self>
    where
        Self: Sized,
    {
        let undo = self.apply_move(position, mv);
        MoveGuard {
            engine: self,
            position,
            undo: Some(undo),
        }
    }

    /// Apply a move permanently (the game advances).
    fn make_move(&self, position: &mut Self::Position, mv: &Self::Move) {
        let _ = self.apply_move(position, mv);
    }
}

/// Scoped, self-reverting move application.
///
/// Created by [`RulesEngine::play`].
pub struct MoveGuard<'a, E: RulesEngine> {
    engine: &'a E,
    position: &'a mut E::Position,
    undo: Option<E::Undo>,
}

impl<E: RulesEngine> Deref for MoveGuard<'_, E> {
    type Target = E::Position;

    fn deref(&self) -> &E::Position {
        self.position
    }
}

impl<E: RulesEngine> DerefMut for MoveGuard<'_, E> {
    fn deref_mut(&mut self) -> &mut E::Position {
        self.position
    }
}

impl<E: RulesEngine> Drop for MoveGuard<'_, E> {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            self.engine.undo_move(self.position, undo);
        }
    }
}
