//! # rust-azero
//!
//! Self-play reinforcement learning for two-player, zero-sum,
//! perfect-information board games.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: Search and training only see the `RulesEngine`
//!    trait. Games plug in their own positions and moves.
//!
//! 2. **Model-Agnostic**: The learned evaluator is an opaque `Predictor`
//!    (predict, train, save). A linear reference model is bundled.
//!
//! 3. **No Position Cloning in Search**: Simulations mutate the caller's
//!    position in place; a scoped guard reverts every move on every exit path.
//!
//! ## Architecture
//!
//! - **PUCT MCTS**: Arena tree, lazy expansion with predictor priors,
//!   negamax backup, temperature-controlled move distribution.
//!
//! - **Explicit Decisions**: A search-driven decision returns its move
//!   distribution and root statistics instead of notifying observers.
//!
//! - **Concurrent Self-Play**: A rayon pool runs episodes against a shared
//!   predictor; examples are merged under one lock after each worker finishes.
//!
//! ## Modules
//!
//! - `core`: Sides and deterministic RNG
//! - `rules`: RulesEngine trait and the scoped move guard
//! - `games`: Connect Four reference implementation
//! - `nn`: Predictor boundary, encoders, linear and uniform predictors
//! - `mcts`: Tree, search, distribution extraction
//! - `agents`: Search-driven, baseline and random agents
//! - `training`: Self-play, the training loop and evaluation matches

pub mod agents;
pub mod core;
pub mod games;
pub mod mcts;
pub mod nn;
pub mod rules;
pub mod training;

// Re-export commonly used types
pub use crate::core::{ByColor, Color, GameRng};

pub use crate::rules::{MoveGuard, RulesEngine};

pub use crate::games::{Column, ConnectFour, ConnectFourHeuristic, ConnectFourPosition};

pub use crate::nn::{
    ConnectFourEncoder, EncodedState, LinearPredictor, LinearPredictorConfig,
    LinearPredictorFactory, Prediction, Predictor, PredictorError, PredictorFactory, Serialized,
    StateEncoder, TrainReport, UniformPredictor,
};

pub use crate::mcts::{
    move_distribution, sample_move, training_policy, Edge, MCTSConfig, MCTSSearch, MCTSTree,
    MoveProbability, Node, NodeId, SearchError, SearchReport, SearchStats, TreeStats,
};

pub use crate::agents::{
    Agent, AgentError, BaselineAgent, BaselineConfig, Decision, Heuristic, MCTSAgent, RandomAgent,
};

pub use crate::training::{
    label_examples, run_matches, ArenaConfig, Episode, IterationReport, MatchStats,
    SelfPlayConfig, SelfPlayWorker, TrainingConfig, TrainingError, TrainingExample, TrainingLoop,
};
