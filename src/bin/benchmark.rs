//! Benchmark - pit a trained Connect Four model against the baseline agent.
//!
//! `play` shows one game move by move; `statistic` plays many games in
//! parallel and prints win/loss/draw rates for the learned agent.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use rust_azero::agents::{Agent, BaselineAgent, BaselineConfig, MCTSAgent};
use rust_azero::core::{ByColor, Color, GameRng};
use rust_azero::games::{ConnectFour, ConnectFourHeuristic};
use rust_azero::mcts::MCTSConfig;
use rust_azero::nn::{
    ConnectFourEncoder, LinearPredictorConfig, LinearPredictorFactory, PredictorFactory,
};
use rust_azero::training::{play_game, run_matches, ArenaConfig, MatchStats};

#[derive(Debug, Parser)]
#[command(name = "benchmark", about = "Evaluate a Connect Four model against the baseline agent")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play one game and print every position
    Play {
        #[command(flatten)]
        common: CommonArgs,

        /// Pause between moves (milliseconds)
        #[arg(short = 'D', long, default_value_t = 500)]
        delay: u64,
    },

    /// Play many games and print win/loss statistics
    Statistic {
        #[command(flatten)]
        common: CommonArgs,

        /// Concurrent games (0 = available parallelism)
        #[arg(short = 'j', long, default_value_t = 0)]
        concurrency: usize,

        /// Games to play
        #[arg(short = 'n', long, default_value_t = 100)]
        rounds: usize,
    },
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Model file to evaluate
    model: PathBuf,

    /// Simulations per move
    #[arg(short = 's', long, default_value_t = 50)]
    simulations: u32,

    /// PUCT exploration constant
    #[arg(short = 'c', long, default_value_t = 1.0)]
    cpuct: f32,

    /// Move sampling temperature
    #[arg(short = 't', long, default_value_t = 0.0)]
    temperature: f32,

    /// Baseline search depth
    #[arg(short = 'd', long = "baseline-depth", default_value_t = 4)]
    depth: u32,

    /// Baseline random move probability
    #[arg(short = 'e', long = "baseline-exploration", default_value_t = 0.05)]
    exploration: f64,

    /// Baseline heuristic growth per piece in an open window
    #[arg(short = 'a', long = "baseline-base", default_value_t = 4.0)]
    base: f32,

    /// Seed for colors and sampling
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

impl CommonArgs {
    fn validate(&self) -> Result<()> {
        ensure!(self.simulations > 0, "simulations must be at least 1");
        ensure!(self.temperature >= 0.0, "temperature must be non-negative");
        ensure!(
            (0.0..=1.0).contains(&self.exploration),
            "baseline exploration must be within [0, 1]"
        );
        Ok(())
    }

    fn arena(&self) -> ArenaConfig {
        ArenaConfig::default()
            .with_mcts(
                MCTSConfig::default()
                    .with_simulations(self.simulations)
                    .with_cpuct(self.cpuct)
                    .with_temperature(self.temperature),
            )
            .with_baseline(
                BaselineConfig::default()
                    .with_depth(self.depth)
                    .with_exploration(self.exploration),
            )
            .with_seed(self.seed)
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
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let game = ConnectFour::new();
    let factory = LinearPredictorFactory::new(
        ConnectFourEncoder::new(&game),
        LinearPredictorConfig::default(),
    );

    match cli.command {
        Command::Play { common, delay } => {
            common.validate()?;
            let predictor = PredictorFactory::<ConnectFour>::load(&factory, &common.model)
                .with_context(|| format!("loading model {}", common.model.display()))?;
            let heuristic = ConnectFourHeuristic::new(&game).with_base(common.base);
            let config = common.arena();

            let mut rng = GameRng::new(common.seed);
            let learned = if rng.gen_bool(0.5) {
                Color::Black
            } else {
                Color::White
            };
            println!("Model plays {learned} ({})", if learned == Color::Black { 'X' } else { 'O' });

            let mut mcts = MCTSAgent::new(&game, &predictor, config.mcts.clone(), rng.fork());
            let mut baseline =
                BaselineAgent::new(&game, heuristic, config.baseline.clone(), rng.fork());
            let agents: ByColor<&mut dyn Agent<ConnectFour>> = match learned {
                Color::Black => ByColor::new(&mut mcts, &mut baseline),
                Color::White => ByColor::new(&mut baseline, &mut mcts),
            };

            let mut first = true;
            let record = play_game(&game, agents, config.max_moves, |position| {
                if !first {
                    thread::sleep(Duration::from_millis(delay));
                }
                first = false;
                println!("{position}\n");
            })?;

            match record.winner {
                Some(winner) if winner == learned => println!("Model wins"),
                Some(_) => println!("Baseline wins"),
                None => println!("Stalemate"),
            }
        }
        Command::Statistic {
            common,
            concurrency,
            rounds,
        } => {
            common.validate()?;
            let predictor = PredictorFactory::<ConnectFour>::load(&factory, &common.model)
                .with_context(|| format!("loading model {}", common.model.display()))?;
            let heuristic = ConnectFourHeuristic::new(&game).with_base(common.base);
            let config = common.arena().with_rounds(rounds).with_workers(concurrency);

            info!(rounds, concurrency, "Running statistic");
            let stats: MatchStats = run_matches(&game, &predictor, &heuristic, &config)?;
            println!("{stats}");
        }
    }

    Ok(())
}
