//! PUCT Monte Carlo Tree Search guided by a [`Predictor`](crate::nn::Predictor).
//!
//! ## Overview
//!
//! - **Arena tree**: nodes live in a flat vector addressed by [`NodeId`]
//! - **Lazy expansion**: a node is created (and the predictor queried) the
//!   first time a simulation reaches it; its predicted value is backed up
//!   immediately without further descent
//! - **In-place descent**: moves are applied to the caller's position and
//!   reverted by a scoped guard on every exit path
//! - **Negamax backup**: values flip sign at every ply
//!
//! ## Usage
//!
//! ```rust
//! use rust_azero::core::GameRng;
//! use rust_azero::games::ConnectFour;
//! use rust_azero::mcts::{move_distribution, MCTSConfig, MCTSSearch};
//! use rust_azero::nn::UniformPredictor;
//! use rust_azero::rules::RulesEngine;
//!
//! let game = ConnectFour::new();
//! let predictor = UniformPredictor::new(game.clone());
//! let config = MCTSConfig::default().with_simulations(100);
//! let mut position = game.initial_position();
//!
//! let mut search = MCTSSearch::new(&game, &predictor, &config, &mut position).unwrap();
//! search.run(config.simulations).unwrap();
//!
//! let mut rng = GameRng::new(7);
//! let distribution = move_distribution(search.tree(), 1.0, &mut rng).unwrap();
//! let total: f32 = distribution.iter().map(|p| p.probability).sum();
//! assert!((total - 1.0).abs() < 1e-5);
//! ```

pub mod config;
pub mod distribution;
pub mod node;
pub mod search;
pub mod stats;
pub mod tree;

// Re-export main types
pub use config::MCTSConfig;
pub use distribution::{move_distribution, sample_move, training_policy, MoveProbability};
pub use node::{Edge, Node, NodeId};
pub use search::{select_edge, ChildReport, MCTSSearch, SearchError, SearchReport};
pub use stats::SearchStats;
pub use tree::{MCTSTree, TreeStats};
