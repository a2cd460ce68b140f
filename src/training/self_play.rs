//! Self-play episodes for generating training data.
//!
//! Both sides are played by [`MCTSAgent`]s sharing one predictor, possibly
//! with different search settings. Every decision yields one
//! [`TrainingExample`]; the whole episode is labeled once the game ends.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agents::{AgentError, MCTSAgent};
use crate::core::{ByColor, Color, GameRng};
use crate::mcts::{MCTSConfig, SearchError};
use crate::nn::Predictor;
use crate::rules::RulesEngine;

use super::example::{label_examples, TrainingExample};

/// Configuration for self-play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelfPlayConfig {
    /// Search settings for black.
    pub black: MCTSConfig,

    /// Search settings for white.
    pub white: MCTSConfig,

    /// Maximum moves per game; a capped game counts as a draw.
    pub max_moves: usize,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            black: MCTSConfig::default(),
            white: MCTSConfig::default(),
            max_moves: 512,
        }
    }
}

impl SelfPlayConfig {
    /// Create a new self-play config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` for both sides.
    pub fn with_mcts(mut self, config: MCTSConfig) -> Self {
        self.black = config.clone();
        self.white = config;
        self
    }

    /// Search settings for black only.
    pub fn with_black(mut self, config: MCTSConfig) -> Self {
        self.black = config;
        self
    }

    /// Search settings for white only.
    pub fn with_white(mut self, config: MCTSConfig) -> Self {
        self.white = config;
        self
    }

    /// Set maximum moves per game.
    pub fn with_max_moves(mut self, max: usize) -> Self {
        self.max_moves = max;
        self
    }
}

/// A finished self-play game.
pub struct Episode<E: RulesEngine> {
    /// Labeled examples, one per decision, in play order.
    pub examples: Vec<TrainingExample<E>>,

    /// Winner, `None` for a draw or a capped game.
    pub winner: Option<Color>,

    /// Moves played.
    pub moves: usize,

    /// Whether the move cap ended the game.
    pub truncated: bool,
}

/// Plays self-play episodes with a shared predictor.
pub struct SelfPlayWorker<'a, E, P: ?Sized> {
    engine: &'a E,
    predictor: &'a P,
    config: SelfPlayConfig,
}

impl<'a, E, P> SelfPlayWorker<'a, E, P>
where
    E: RulesEngine,
    P: Predictor<E> + ?Sized,
{
    /// Create a new self-play worker.
    pub fn new(engine: &'a E, predictor: &'a P, config: SelfPlayConfig) -> Self {
        Self {
            engine,
            predictor,
            config,
        }
    }

    /// Play one game from the initial position.
    ///
    /// A side with no legal move in an unfinished game loses. Errors from
    /// the predictor abort the episode.
    pub fn play_episode(&self, seed: u64) -> Result<Episode<E>, SearchError> {
        let mut rng = GameRng::new(seed);
        let mut agents = ByColor::new(
            MCTSAgent::new(self.engine, self.predictor, self.config.black.clone(), rng.fork()),
            MCTSAgent::new(self.engine, self.predictor, self.config.white.clone(), rng.fork()),
        );

        let mut position = self.engine.initial_position();
        let mut examples = Vec::new();
        let mut moves = 0;
        let mut truncated = false;

        let winner = loop {
            if self.engine.is_ended(&position) {
                break self.engine.winner(&position);
            }
            if moves >= self.config.max_moves {
                truncated = true;
                break None;
            }

            let color = self.engine.to_move(&position);
            let decision = match agents[color].decide(&mut position) {
                Ok(decision) => decision,
                Err(AgentError::NoLegalMoves(stuck)) => break Some(stuck.opponent()),
                Err(AgentError::GameOver) => break self.engine.winner(&position),
                Err(AgentError::Search(err)) => return Err(err),
            };

            examples.push(TrainingExample::new(position.clone(), color, decision.policy));
            self.engine.make_move(&mut position, &decision.chosen);
            moves += 1;
        };

        label_examples(&mut examples, winner);
        debug!(
            seed,
            moves,
            winner = winner.map_or("none".to_string(), |c| c.to_string()),
            truncated,
            "Episode finished"
        );

        Ok(Episode {
            examples,
            winner,
            moves,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::connect_four::ConnectFour;
    use crate::nn::UniformPredictor;

    fn fast() -> SelfPlayConfig {
        SelfPlayConfig::default().with_mcts(MCTSConfig::default().with_simulations(8))
    }

    #[test]
    fn test_config_builders() {
        let config = SelfPlayConfig::new()
            .with_black(MCTSConfig::default().with_cpuct(2.0))
            .with_white(MCTSConfig::default().with_temperature(0.0))
            .with_max_moves(10);

        assert_eq!(config.black.cpuct, 2.0);
        assert_eq!(config.white.temperature, 0.0);
        assert_eq!(config.max_moves, 10);
    }

    #[test]
    fn test_episode_is_labeled() {
        let game = ConnectFour::with_size(4, 4, 3);
        let predictor = UniformPredictor::new(game.clone());
        let worker = SelfPlayWorker::new(&game, &predictor, fast());

        let episode = worker.play_episode(17).unwrap();
        assert_eq!(episode.examples.len(), episode.moves);
        assert!(!episode.truncated);

        for example in &episode.examples {
            assert_eq!(example.value, example.to_move.outcome(episode.winner));
            let sum: f32 = example.policy.iter().map(|(_, p)| p).sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_examples_alternate_sides() {
        let game = ConnectFour::new();
        let predictor = UniformPredictor::new(game.clone());
        let worker = SelfPlayWorker::new(&game, &predictor, fast());

        let episode = worker.play_episode(3).unwrap();
        for (i, example) in episode.examples.iter().enumerate() {
            let expected = if i % 2 == 0 { Color::Black } else { Color::White };
            assert_eq!(example.to_move, expected);
        }
    }

    #[test]
    fn test_move_cap_is_a_draw() {
        let game = ConnectFour::new();
        let predictor = UniformPredictor::new(game.clone());
        let worker = SelfPlayWorker::new(&game, &predictor, fast().with_max_moves(3));

        let episode = worker.play_episode(5).unwrap();
        assert!(episode.truncated);
        assert_eq!(episode.moves, 3);
        assert_eq!(episode.winner, None);
        assert!(episode.examples.iter().all(|e| e.value == 0.0));
    }

    #[test]
    fn test_same_seed_same_game() {
        let game = ConnectFour::with_size(5, 4, 3);
        let predictor = UniformPredictor::new(game.clone());
        let worker = SelfPlayWorker::new(&game, &predictor, fast());

        let a = worker.play_episode(99).unwrap();
        let b = worker.play_episode(99).unwrap();
        let positions = |e: &Episode<ConnectFour>| -> Vec<_> {
            e.examples.iter().map(|x| x.position.clone()).collect()
        };
        assert_eq!(positions(&a), positions(&b));
        assert_eq!(a.winner, b.winner);
    }
}
