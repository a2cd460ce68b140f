//! Move-selecting agents.
//!
//! - **MCTSAgent**: PUCT search with a predictor; the learned player
//! - **BaselineAgent**: alpha-beta over a hand-written heuristic; the
//!   evaluation opponent
//! - **RandomAgent**: uniform over legal moves

pub mod agent;
pub mod baseline;
pub mod mcts_agent;

pub use agent::{Agent, AgentError, RandomAgent};
pub use baseline::{BaselineAgent, BaselineConfig, Heuristic};
pub use mcts_agent::{Decision, MCTSAgent};
