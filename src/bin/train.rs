//! Train - iterative self-play training for Connect Four.
//!
//! Loads the model at the given path (creating it if absent), then repeats:
//! concurrent self-play, one training pass over all new examples, save.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;
use tracing::info;

use rust_azero::games::ConnectFour;
use rust_azero::mcts::MCTSConfig;
use rust_azero::nn::{ConnectFourEncoder, LinearPredictorConfig, LinearPredictorFactory};
use rust_azero::training::{SelfPlayConfig, TrainingConfig, TrainingLoop};

#[derive(Debug, Parser)]
#[command(name = "train", about = "Train a Connect Four predictor by self-play")]
struct Args {
    /// Model file; created if it does not exist, overwritten every iteration
    model: PathBuf,

    /// Training iterations
    #[arg(short = 'i', long, default_value_t = 100)]
    iterations: u32,

    /// Simulations per move
    #[arg(short = 's', long, default_value_t = 50)]
    simulations: u32,

    /// PUCT exploration constant
    #[arg(short = 'c', long, default_value_t = 1.0)]
    cpuct: f32,

    /// Move sampling temperature
    #[arg(short = 't', long, default_value_t = 1.0)]
    temperature: f32,

    /// Training mini-batch size
    #[arg(short = 'b', long = "batch-size", default_value_t = 1)]
    batch_size: usize,

    /// Training epochs per iteration
    #[arg(short = 'e', long, default_value_t = 1)]
    epochs: usize,

    /// SGD learning rate
    #[arg(long, default_value_t = 0.01)]
    learning_rate: f32,

    /// Concurrent self-play workers (0 = available parallelism)
    #[arg(short = 'j', long, default_value_t = 0)]
    workers: usize,

    /// Episodes per worker per iteration
    #[arg(long, default_value_t = 1)]
    episodes_per_worker: usize,

    /// Move cap per episode
    #[arg(long, default_value_t = 512)]
    max_moves: usize,

    /// Seed for self-play and shuffling
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn validate(&self) -> Result<()> {
        ensure!(self.simulations > 0, "simulations must be at least 1");
        ensure!(self.cpuct >= 0.0, "cpuct must be non-negative");
        ensure!(self.temperature >= 0.0, "temperature must be non-negative");
        ensure!(self.batch_size > 0, "batch size must be at least 1");
        ensure!(self.episodes_per_worker > 0, "episodes per worker must be at least 1");
        Ok(())
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;
    init_tracing(&args.log_level)?;

    let game = ConnectFour::new();
    let factory = LinearPredictorFactory::new(
        ConnectFourEncoder::new(&game),
        LinearPredictorConfig::default()
            .with_batch_size(args.batch_size)
            .with_epochs(args.epochs)
            .with_learning_rate(args.learning_rate)
            .with_seed(args.seed),
    );

    let mcts = MCTSConfig::default()
        .with_simulations(args.simulations)
        .with_cpuct(args.cpuct)
        .with_temperature(args.temperature);
    let config = TrainingConfig::default()
        .with_model_path(&args.model)
        .with_iterations(args.iterations)
        .with_self_play(SelfPlayConfig::default().with_mcts(mcts).with_max_moves(args.max_moves))
        .with_workers(args.workers)
        .with_episodes_per_worker(args.episodes_per_worker)
        .with_seed(args.seed);

    let reports = TrainingLoop::new(game, factory, config).run()?;

    let examples: usize = reports.iter().map(|r| r.examples).sum();
    info!(
        iterations = reports.len(),
        examples,
        model = %args.model.display(),
        "Training finished"
    );
    Ok(())
}
