//! Core types shared by every layer: sides and randomness.

pub mod color;
pub mod rng;

pub use color::{ByColor, Color};
pub use rng::GameRng;
