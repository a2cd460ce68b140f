//! Iterative self-play / train / save loop.
//!
//! Each iteration runs `workers` self-play workers on a rayon pool. Workers
//! collect examples locally and append them to one shared aggregate under a
//! single lock when they finish. The aggregate is read only after the pool
//! has joined, then submitted as one training batch and the model is saved
//! over the same path.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::agents::AgentError;
use crate::core::{Color, GameRng};
use crate::mcts::SearchError;
use crate::nn::{Predictor, PredictorError, PredictorFactory, TrainReport};
use crate::rules::RulesEngine;

use super::example::TrainingExample;
use super::self_play::{SelfPlayConfig, SelfPlayWorker};

/// Errors that abort training or evaluation.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Predictor error: {0}")]
    Predictor(#[from] PredictorError),

    #[error("Self-play failed: {0}")]
    SelfPlay(#[from] SearchError),

    #[error("Match failed: {0}")]
    Agent(#[from] AgentError),

    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("Example aggregate lock poisoned")]
    Poisoned,
}

/// Worker count matching the machine's available parallelism.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Training loop configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Model artifact, loaded or created at start and overwritten every
    /// iteration.
    pub model_path: PathBuf,

    /// Train/save iterations.
    pub iterations: u32,

    /// Self-play settings.
    pub self_play: SelfPlayConfig,

    /// Concurrent episode workers (0 = available parallelism).
    pub workers: usize,

    /// Episodes each worker plays per iteration.
    pub episodes_per_worker: usize,

    /// Seed for all episode streams.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.bin"),
            iterations: 100,
            self_play: SelfPlayConfig::default(),
            workers: 0,
            episodes_per_worker: 1,
            seed: 0,
        }
    }
}

impl TrainingConfig {
    /// Set the model path.
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    /// Set the number of iterations.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the self-play settings.
    pub fn with_self_play(mut self, self_play: SelfPlayConfig) -> Self {
        self.self_play = self_play;
        self
    }

    /// Set the worker count (0 = available parallelism).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the episodes per worker.
    pub fn with_episodes_per_worker(mut self, episodes: usize) -> Self {
        self.episodes_per_worker = episodes;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Worker count with 0 resolved.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            default_workers()
        } else {
            self.workers
        }
    }
}

/// Outcome counts and training summary for one iteration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IterationReport {
    /// Zero-based iteration index.
    pub iteration: u32,
    /// Episodes played.
    pub episodes: usize,
    /// Examples submitted to training.
    pub examples: usize,
    /// Episodes won by black.
    pub black_wins: usize,
    /// Episodes won by white.
    pub white_wins: usize,
    /// Episodes without a winner.
    pub draws: usize,
    /// Episodes ended by the move cap.
    pub truncated: usize,
    /// Predictor training summary.
    pub train: TrainReport,
    /// Wall time (milliseconds).
    pub time_ms: u64,
}

impl IterationReport {
    fn count(&mut self, winner: Option<Color>, truncated: bool) {
        self.episodes += 1;
        match winner {
            Some(Color::Black) => self.black_wins += 1,
            Some(Color::White) => self.white_wins += 1,
            None => self.draws += 1,
        }
        if truncated {
            self.truncated += 1;
        }
    }
}

/// Drives self-play, training and persistence.
pub struct TrainingLoop<E, F> {
    engine: E,
    factory: F,
    config: TrainingConfig,
}

impl<E, F> TrainingLoop<E, F>
where
    E: RulesEngine,
    F: PredictorFactory<E>,
    F::Output: Sync,
{
    /// Create a training loop.
    pub fn new(engine: E, factory: F, config: TrainingConfig) -> Self {
        Self {
            engine,
            factory,
            config,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Load or create the model, then run every iteration.
    pub fn run(&self) -> Result<Vec<IterationReport>, TrainingError> {
        let mut predictor = self.factory.load_or_create(&self.config.model_path)?;
        let workers = self.config.effective_workers();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
        let mut rng = GameRng::new(self.config.seed);

        info!(
            iterations = self.config.iterations,
            workers,
            episodes_per_worker = self.config.episodes_per_worker,
            model = %self.config.model_path.display(),
            "Starting training"
        );

        let mut reports = Vec::with_capacity(self.config.iterations as usize);
        for iteration in 0..self.config.iterations {
            let report = self.iteration(&pool, &mut predictor, workers, iteration, &mut rng)?;
            reports.push(report);
        }
        Ok(reports)
    }

    /// One self-play round, one training pass, one save.
    pub fn iteration(
        &self,
        pool: &rayon::ThreadPool,
        predictor: &mut F::Output,
        workers: usize,
        iteration: u32,
        rng: &mut GameRng,
    ) -> Result<IterationReport, TrainingError> {
        let start = Instant::now();
        let worker_seeds = episode_seeds(rng, workers, self.config.episodes_per_worker);
        let aggregate: Mutex<Vec<TrainingExample<E>>> = Mutex::new(Vec::new());

        let shared: &F::Output = predictor;
        let engine = &self.engine;
        let self_play = &self.config.self_play;

        let outcomes = pool.install(|| {
            worker_seeds
                .into_par_iter()
                .enumerate()
                .map(
                    |(worker, seeds)| -> Result<Vec<(Option<Color>, bool)>, TrainingError> {
                        let runner = SelfPlayWorker::new(engine, shared, self_play.clone());
                        let mut local = Vec::new();
                        let mut outcomes = Vec::with_capacity(seeds.len());

                        for seed in seeds {
                            let episode = runner.play_episode(seed)?;
                            outcomes.push((episode.winner, episode.truncated));
                            local.extend(episode.examples);
                        }

                        debug!(worker, examples = local.len(), "Worker finished");
                        aggregate
                            .lock()
                            .map_err(|_| TrainingError::Poisoned)?
                            .extend(local);
                        Ok(outcomes)
                    },
                )
                .collect::<Result<Vec<_>, TrainingError>>()
        })?;

        let examples = aggregate.into_inner().map_err(|_| TrainingError::Poisoned)?;
        let mut report = IterationReport {
            iteration,
            examples: examples.len(),
            ..IterationReport::default()
        };
        for (winner, truncated) in outcomes.into_iter().flatten() {
            report.count(winner, truncated);
        }

        report.train = predictor.train(&examples)?;
        predictor.save(&self.config.model_path)?;
        report.time_ms = start.elapsed().as_millis() as u64;

        info!(
            iteration = iteration + 1,
            of = self.config.iterations,
            episodes = report.episodes,
            examples = report.examples,
            black_wins = report.black_wins,
            white_wins = report.white_wins,
            draws = report.draws,
            policy_loss = report.train.policy_loss,
            value_loss = report.train.value_loss,
            time_ms = report.time_ms,
            "Iteration complete, model saved"
        );

        Ok(report)
    }
}

/// Episode seeds for one iteration, one row per worker.
///
/// Each worker gets a forked stream and each episode a fork of that, so no
/// two episodes in the iteration start from the same seed.
fn episode_seeds(
    rng: &mut GameRng,
    workers: usize,
    episodes_per_worker: usize,
) -> Vec<Vec<u64>> {
    (0..workers)
        .map(|_| {
            let mut worker_rng = rng.fork();
            (0..episodes_per_worker).map(|_| worker_rng.fork().seed()).collect()
        })
        .collect()
}
