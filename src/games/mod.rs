//! Bundled game implementations.
//!
//! - `connect_four`: Connect Four with configurable board size, used by the
//!   binaries, benchmarks and tests

pub mod connect_four;

pub use connect_four::{Column, ConnectFour, ConnectFourHeuristic, ConnectFourPosition};
