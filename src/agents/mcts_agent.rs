//! Search-driven agent.
//!
//! Each decision builds a fresh tree, runs the configured simulation budget
//! and samples the move from the visit distribution. The finished search is
//! handed back as a [`Decision`] so callers (self-play in particular) can
//! record training data without hooking into the agent.

use crate::core::GameRng;
use crate::mcts::{
    move_distribution, sample_move, training_policy, MCTSConfig, MCTSSearch, MoveProbability,
    SearchError, SearchReport,
};
use crate::nn::Predictor;
use crate::rules::RulesEngine;

use super::agent::{Agent, AgentError};

/// Everything produced by one decision.
#[derive(Clone, Debug)]
pub struct Decision<M> {
    /// The move to play.
    pub chosen: M,

    /// Distribution the move was sampled from (configured temperature).
    pub distribution: Vec<MoveProbability<M>>,

    /// Visit shares at temperature 1, the policy training target.
    pub policy: Vec<(M, f32)>,

    /// Root statistics of the finished search.
    pub report: SearchReport<M>,
}

/// Agent that picks moves with PUCT search.
pub struct MCTSAgent<'a, E, P: ?Sized> {
    engine: &'a E,
    predictor: &'a P,
    config: MCTSConfig,
    rng: GameRng,
}

impl<'a, E, P> MCTSAgent<'a, E, P>
where
    E: RulesEngine,
    P: Predictor<E> + ?Sized,
{
    /// Agent searching with `predictor` under `config`.
    pub fn new(engine: &'a E, predictor: &'a P, config: MCTSConfig, rng: GameRng) -> Self {
        Self {
            engine,
            predictor,
            config,
            rng,
        }
    }

    /// Search parameters.
    pub fn config(&self) -> &MCTSConfig {
        &self.config
    }

    /// Search `position` and choose a move, keeping the search results.
    pub fn decide(&mut self, position: &mut E::Position) -> Result<Decision<E::Move>, AgentError> {
        let color = self.engine.to_move(position);
        let search = MCTSSearch::new(self.engine, self.predictor, &self.config, position);
        let mut search = match search {
            Err(SearchError::NoLegalMoves) => return Err(AgentError::NoLegalMoves(color)),
            other => other?,
        };
        search.run(self.config.simulations)?;

        let distribution =
            move_distribution(search.tree(), self.config.temperature, &mut self.rng)?;
        let policy = training_policy(search.tree())?;
        let chosen = sample_move(&distribution, &mut self.rng)
            .cloned()
            .ok_or(SearchError::Unsearched)?;

        Ok(Decision {
            chosen,
            distribution,
            policy,
            report: search.report(),
        })
    }
}

impl<E, P> Agent<E> for MCTSAgent<'_, E, P>
where
    E: RulesEngine,
    P: Predictor<E> + ?Sized,
{
    fn select_move(&mut self, position: &mut E::Position) -> Result<E::Move, AgentError> {
        self.decide(position).map(|d| d.chosen)
    }
}
