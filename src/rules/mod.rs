//! Rules engine trait for game implementations.
//!
//! Games implement `RulesEngine` to define:
//! - Legal moves for each position and side
//! - How moves modify a position and how to reverse them
//! - End-of-game and winner detection
//!
//! Search and self-play call into `RulesEngine` but never interpret
//! game-specific concepts directly.

pub mod engine;

pub use engine::{MoveGuard, RulesEngine};
