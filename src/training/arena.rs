//! Evaluation matches between the learned agent and the baseline.
//!
//! Rounds are independent games with a random color assignment for the
//! learned agent, played in parallel on a rayon pool and folded into one
//! [`MatchStats`].

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agents::{Agent, AgentError, BaselineAgent, BaselineConfig, Heuristic, MCTSAgent};
use crate::core::{ByColor, Color, GameRng};
use crate::mcts::MCTSConfig;
use crate::nn::Predictor;
use crate::rules::RulesEngine;

use super::coordinator::{default_workers, TrainingError};

/// A finished game.
#[derive(Clone, Debug, PartialEq)]
pub struct GameRecord<M> {
    /// Winner, `None` for a draw or a capped game.
    pub winner: Option<Color>,
    /// Moves in play order.
    pub moves: Vec<M>,
}

/// Play one game between two agents.
///
/// `observe` sees the initial position and the position after every move.
/// A side with no legal move loses; reaching `max_moves` is a draw.
pub fn play_game<E: RulesEngine>(
    engine: &E,
    mut agents: ByColor<&mut dyn Agent<E>>,
    max_moves: usize,
    mut observe: impl FnMut(&E::Position),
) -> Result<GameRecord<E::Move>, AgentError> {
    let mut position = engine.initial_position();
    let mut moves = Vec::new();
    observe(&position);

    let winner = loop {
        if engine.is_ended(&position) {
            break engine.winner(&position);
        }
        if moves.len() >= max_moves {
            break None;
        }

        let color = engine.to_move(&position);
        let mv = match agents[color].select_move(&mut position) {
            Ok(mv) => mv,
            Err(AgentError::NoLegalMoves(stuck)) => break Some(stuck.opponent()),
            Err(err) => return Err(err),
        };

        engine.make_move(&mut position, &mv);
        moves.push(mv);
        observe(&position);
    };

    Ok(GameRecord { winner, moves })
}

/// Win/loss/draw counts from the learned agent's side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    /// Games won.
    pub wins: usize,
    /// Games lost.
    pub losses: usize,
    /// Games without a winner.
    pub draws: usize,
}

impl MatchStats {
    /// Games played.
    #[must_use]
    pub fn total(&self) -> usize {
        self.wins + self.losses + self.draws
    }

    /// Fraction of games won.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.wins as f64 / self.total() as f64
        }
    }

    /// Fraction of games not lost.
    #[must_use]
    pub fn not_lost_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            (self.wins + self.draws) as f64 / self.total() as f64
        }
    }

    /// Count one game for the side playing `color`.
    pub fn record(&mut self, color: Color, winner: Option<Color>) {
        match winner {
            Some(w) if w == color => self.wins += 1,
            Some(_) => self.losses += 1,
            None => self.draws += 1,
        }
    }

    /// Sum of two tallies.
    #[must_use]
    pub fn merge(self, other: MatchStats) -> MatchStats {
        MatchStats {
            wins: self.wins + other.wins,
            losses: self.losses + other.losses,
            draws: self.draws + other.draws,
        }
    }
}

impl fmt::Display for MatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Win Rate: {:.2}%", self.win_rate() * 100.0)?;
        writeln!(f, "Not Lost Rate: {:.2}%", self.not_lost_rate() * 100.0)?;
        writeln!(f, "Win: {}", self.wins)?;
        writeln!(f, "Lost: {}", self.losses)?;
        write!(f, "Stalemate: {}", self.draws)
    }
}

/// Evaluation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Search settings for the learned agent.
    pub mcts: MCTSConfig,
    /// Baseline tuning.
    pub baseline: BaselineConfig,
    /// Games to play.
    pub rounds: usize,
    /// Concurrent games (0 = available parallelism).
    pub workers: usize,
    /// Maximum moves per game.
    pub max_moves: usize,
    /// Seed for color assignment and agent streams.
    pub seed: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            mcts: MCTSConfig::default(),
            baseline: BaselineConfig::default(),
            rounds: 100,
            workers: 0,
            max_moves: 512,
            seed: 0,
        }
    }
}

impl ArenaConfig {
    /// Set the learned agent's search settings.
    pub fn with_mcts(mut self, mcts: MCTSConfig) -> Self {
        self.mcts = mcts;
        self
    }

    /// Set the baseline tuning.
    pub fn with_baseline(mut self, baseline: BaselineConfig) -> Self {
        self.baseline = baseline;
        self
    }

    /// Set the number of games.
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    /// Set the concurrency (0 = available parallelism).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Play one round: learned agent against the baseline on `learned`'s color.
pub fn play_round<E, P, H>(
    engine: &E,
    predictor: &P,
    heuristic: H,
    config: &ArenaConfig,
    learned: Color,
    rng: &mut GameRng,
) -> Result<GameRecord<E::Move>, AgentError>
where
    E: RulesEngine,
    P: Predictor<E> + ?Sized,
    H: Heuristic<E>,
{
    let mut mcts = MCTSAgent::new(engine, predictor, config.mcts.clone(), rng.fork());
    let mut baseline = BaselineAgent::new(engine, heuristic, config.baseline.clone(), rng.fork());

    let agents: ByColor<&mut dyn Agent<E>> = match learned {
        Color::Black => ByColor::new(&mut mcts, &mut baseline),
        Color::White => ByColor::new(&mut baseline, &mut mcts),
    };
    play_game(engine, agents, config.max_moves, |_| {})
}

/// Play `config.rounds` games in parallel and tally them.
pub fn run_matches<E, P, H>(
    engine: &E,
    predictor: &P,
    heuristic: &H,
    config: &ArenaConfig,
) -> Result<MatchStats, TrainingError>
where
    E: RulesEngine,
    P: Predictor<E> + Sync + ?Sized,
    H: Heuristic<E> + Clone,
{
    let workers = if config.workers == 0 {
        default_workers()
    } else {
        config.workers
    };
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;

    let mut rng = GameRng::new(config.seed);
    let round_rngs: Vec<GameRng> = (0..config.rounds).map(|_| rng.fork()).collect();

    let results = pool.install(|| {
        round_rngs
            .into_par_iter()
            .enumerate()
            .map(|(round, mut round_rng)| -> Result<MatchStats, TrainingError> {
                let learned = if round_rng.gen_bool(0.5) {
                    Color::Black
                } else {
                    Color::White
                };
                let record = play_round(
                    engine,
                    predictor,
                    heuristic.clone(),
                    config,
                    learned,
                    &mut round_rng,
                )?;

                let mut stats = MatchStats::default();
                stats.record(learned, record.winner);
                debug!(
                    round,
                    learned = %learned,
                    moves = record.moves.len(),
                    ?stats,
                    "Round finished"
                );
                Ok(stats)
            })
            .collect::<Result<Vec<_>, TrainingError>>()
    })?;

    let stats = results.into_iter().fold(MatchStats::default(), MatchStats::merge);
    info!(
        rounds = stats.total(),
        wins = stats.wins,
        losses = stats.losses,
        draws = stats.draws,
        "Matches complete"
    );
    Ok(stats)
}
