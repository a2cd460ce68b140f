//! Self-play data generation, the training loop and evaluation matches.
//!
//! ## Overview
//!
//! - **TrainingExample**: position, visit-share policy target, outcome label
//! - **SelfPlayWorker**: plays one game with search on both sides
//! - **TrainingLoop**: concurrent self-play, one training batch, save, repeat
//! - **Arena**: learned agent against the baseline, tallied as `MatchStats`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rust_azero::games::ConnectFour;
//! use rust_azero::mcts::MCTSConfig;
//! use rust_azero::nn::{ConnectFourEncoder, LinearPredictorConfig, LinearPredictorFactory};
//! use rust_azero::training::{SelfPlayConfig, TrainingConfig, TrainingLoop};
//!
//! let game = ConnectFour::new();
//! let factory = LinearPredictorFactory::new(
//!     ConnectFourEncoder::new(&game),
//!     LinearPredictorConfig::default(),
//! );
//! let mcts = MCTSConfig::default().with_simulations(100);
//! let self_play = SelfPlayConfig::default().with_mcts(mcts);
//! let config = TrainingConfig::default()
//!     .with_model_path("connect_four.bin")
//!     .with_iterations(10)
//!     .with_self_play(self_play);
//!
//! let reports = TrainingLoop::new(game, factory, config).run()?;
//! println!("last iteration saw {} examples", reports[reports.len() - 1].examples);
//! # Ok::<(), rust_azero::training::TrainingError>(())
//! ```

pub mod arena;
pub mod coordinator;
pub mod example;
pub mod self_play;

// Re-export main types
pub use arena::{play_game, play_round, run_matches, ArenaConfig, GameRecord, MatchStats};
pub use coordinator::{
    default_workers, IterationReport, TrainingConfig, TrainingError, TrainingLoop,
};
pub use example::{label_examples, TrainingExample};
pub use self_play::{Episode, SelfPlayConfig, SelfPlayWorker};
