//! Side identification for two-player games.
//!
//! ## Color
//!
//! The two sides of a zero-sum game. Black moves first by convention.
//!
//! ## ByColor
//!
//! Fixed-size per-side storage indexed by `Color`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two sides in a two-player game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// Both colors in turn order.
    pub const ALL: [Color; 2] = [Color::Black, Color::White];

    /// The other side.
    ///
    /// ```
    /// use rust_azero::core::Color;
    ///
    /// assert_eq!(Color::Black.opponent(), Color::White);
    /// assert_eq!(Color::White.opponent(), Color::Black);
    /// ```
    #[inline]
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// 0 for black, 1 for white.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }

    /// Game-theoretic outcome for this side given the winner of a finished game.
    ///
    /// +1 for a win, -1 for a loss, 0 when nobody won.
    #[must_use]
    pub fn outcome(self, winner: Option<Color>) -> f32 {
        match winner {
            Some(w) if w == self => 1.0,
            Some(_) => -1.0,
            None => 0.0,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

/// Per-side data storage.
///
/// ```
/// use rust_azero::core::{ByColor, Color};
///
/// let mut wins = ByColor::with_value(0u32);
/// wins[Color::White] += 1;
/// assert_eq!(wins[Color::Black], 0);
/// assert_eq!(wins[Color::White], 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByColor<T> {
    data: [T; 2],
}

impl<T> ByColor<T> {
    /// Create from explicit black and white values.
    pub fn new(black: T, white: T) -> Self {
        Self {
            data: [black, white],
        }
    }

    /// Create with both sides set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(value.clone(), value)
    }

    /// Iterate over `(Color, &T)` pairs in turn order.
    pub fn iter(&self) -> impl Iterator<Item = (Color, &T)> {
        Color::ALL.into_iter().zip(self.data.iter())
    }
}

impl<T> Index<Color> for ByColor<T> {
    type Output = T;

    #[inline]
    fn index(&self, color: Color) -> &T {
        &self.data[color.index()]
    }
}

impl<T> IndexMut<Color> for ByColor<T> {
    #[inline]
    fn index_mut(&mut self, color: Color) -> &mut T {
        &mut self.data[color.index()]
    }
}
