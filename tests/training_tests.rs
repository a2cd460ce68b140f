//! Integration tests for self-play, labeling, the training loop and matches.

use std::path::Path;

use rust_azero::agents::{Agent, BaselineConfig, MCTSAgent, RandomAgent};
use rust_azero::core::{ByColor, Color, GameRng};
use rust_azero::games::{Column, ConnectFour, ConnectFourHeuristic};
use rust_azero::mcts::MCTSConfig;
use rust_azero::nn::{
    ConnectFourEncoder, LinearPredictor, LinearPredictorConfig, LinearPredictorFactory, Predictor,
    PredictorError, PredictorFactory, Serialized, UniformPredictor,
};
use rust_azero::rules::RulesEngine;
use rust_azero::training::{
    label_examples, play_game, run_matches, ArenaConfig, SelfPlayConfig, SelfPlayWorker,
    TrainingConfig, TrainingExample, TrainingLoop,
};

fn small_game() -> ConnectFour {
    ConnectFour::with_size(4, 4, 3)
}

fn quick_self_play(simulations: u32) -> SelfPlayConfig {
    SelfPlayConfig::default().with_mcts(MCTSConfig::default().with_simulations(simulations))
}

fn linear_factory(game: &ConnectFour) -> LinearPredictorFactory<ConnectFourEncoder> {
    LinearPredictorFactory::new(
        ConnectFourEncoder::new(game),
        LinearPredictorConfig::default().with_batch_size(8).with_seed(1),
    )
}

/// Factory whose models go through the single-lock wrapper.
struct SerializedFactory(LinearPredictorFactory<ConnectFourEncoder>);

impl PredictorFactory<ConnectFour> for SerializedFactory {
    type Output = Serialized<LinearPredictor<ConnectFourEncoder>>;

    fn create(&self, path: &Path) -> Result<Self::Output, PredictorError> {
        PredictorFactory::<ConnectFour>::create(&self.0, path).map(Serialized::new)
    }

    fn load(&self, path: &Path) -> Result<Self::Output, PredictorError> {
        PredictorFactory::<ConnectFour>::load(&self.0, path).map(Serialized::new)
    }
}

// =============================================================================
// Labeling
// =============================================================================

#[test]
fn test_labels_follow_side_to_move() {
    let game = small_game();
    let mut position = game.initial_position();
    let mut examples = Vec::new();
    for column in [0u8, 1, 0, 1, 0] {
        let to_move = game.to_move(&position);
        examples.push(TrainingExample::<ConnectFour>::new(
            position.clone(),
            to_move,
            vec![(Column(column), 1.0)],
        ));
        game.make_move(&mut position, &Column(column));
    }
    assert_eq!(game.winner(&position), Some(Color::Black));

    label_examples(&mut examples, Some(Color::Black));
    let values: Vec<f32> = examples.iter().map(|e| e.value).collect();
    assert_eq!(values, vec![1.0, -1.0, 1.0, -1.0, 1.0]);

    label_examples(&mut examples, None);
    assert!(examples.iter().all(|e| e.value == 0.0));
}

// =============================================================================
// Self-Play
// =============================================================================

#[test]
fn test_episode_examples_are_labeled_and_normalized() {
    let game = small_game();
    let predictor = UniformPredictor::new(game.clone());
    let worker = SelfPlayWorker::new(&game, &predictor, quick_self_play(20));

    let episode = worker.play_episode(17).unwrap();
    assert_eq!(episode.examples.len(), episode.moves);
    assert!(!episode.truncated);

    for (ply, example) in episode.examples.iter().enumerate() {
        let expected = if ply % 2 == 0 { Color::Black } else { Color::White };
        assert_eq!(example.to_move, expected);
        assert_eq!(example.value, example.to_move.outcome(episode.winner));

        let total: f32 = example.policy.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-5);
        let legal = game.legal_moves(&example.position, example.to_move);
        assert!(example.policy.iter().all(|(mv, _)| legal.contains(mv)));
    }
}

// =============================================================================
// Training Loop
// =============================================================================

#[test]
fn test_training_loop_creates_and_overwrites_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("c4.bin");
    let game = small_game();

    let config = TrainingConfig::default()
        .with_model_path(&path)
        .with_iterations(2)
        .with_self_play(quick_self_play(10))
        .with_workers(2)
        .with_episodes_per_worker(2)
        .with_seed(3);
    let reports = TrainingLoop::new(game.clone(), linear_factory(&game), config)
        .run()
        .unwrap();

    assert_eq!(reports.len(), 2);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.iteration, i as u32);
        assert_eq!(report.episodes, 4);
        assert_eq!(report.black_wins + report.white_wins + report.draws, 4);
        assert!(report.examples > 0);
        assert_eq!(report.train.examples, report.examples);
    }
    assert!(path.exists());

    // The saved model is loadable and no longer the zero model.
    let loaded = PredictorFactory::<ConnectFour>::load(&linear_factory(&game), &path).unwrap();
    let prediction =
        Predictor::<ConnectFour>::predict(&loaded, &game.initial_position(), Color::Black)
            .unwrap();
    let first = prediction.moves[0].1;
    let policy_moved = prediction.moves.iter().any(|(_, p)| (p - first).abs() > 1e-7);
    assert!(policy_moved || prediction.value != 0.0);

    // A second run resumes from the saved file.
    let config = TrainingConfig::default()
        .with_model_path(&path)
        .with_iterations(1)
        .with_self_play(quick_self_play(10))
        .with_workers(1)
        .with_seed(4);
    let before = std::fs::read(&path).unwrap();
    let reports = TrainingLoop::new(game.clone(), linear_factory(&game), config)
        .run()
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert_ne!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn test_training_loop_with_serialized_predictor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("serialized.bin");
    let game = small_game();

    let config = TrainingConfig::default()
        .with_model_path(&path)
        .with_iterations(1)
        .with_self_play(quick_self_play(8))
        .with_workers(3)
        .with_seed(9);
    let reports = TrainingLoop::new(game.clone(), SerializedFactory(linear_factory(&game)), config)
        .run()
        .unwrap();

    assert_eq!(reports[0].episodes, 3);
    assert!(path.exists());
}

#[test]
fn test_incompatible_model_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.bin");
    let small = small_game();
    PredictorFactory::<ConnectFour>::create(&linear_factory(&small), &path).unwrap();

    let standard = ConnectFour::new();
    let result = PredictorFactory::<ConnectFour>::load(&linear_factory(&standard), &path);
    assert!(matches!(result, Err(PredictorError::Incompatible { .. })));
}

// =============================================================================
// Matches
// =============================================================================

#[test]
fn test_search_agent_beats_random_mover() {
    let game = small_game();
    let predictor = UniformPredictor::new(game.clone());
    let mut wins = 0;

    for seed in 0..8u64 {
        let mut mcts = MCTSAgent::new(
            &game,
            &predictor,
            MCTSConfig::default().with_simulations(200).with_temperature(0.0),
            GameRng::new(seed),
        );
        let mut random = RandomAgent::new(&game, GameRng::new(seed + 100));
        let record = play_game(
            &game,
            ByColor::new(&mut mcts as &mut dyn Agent<ConnectFour>, &mut random),
            64,
            |_| {},
        )
        .unwrap();
        if record.winner == Some(Color::Black) {
            wins += 1;
        }
    }
    assert!(wins >= 5, "search won {wins} of 8");
}

#[test]
fn test_run_matches_is_deterministic() {
    let game = small_game();
    let predictor = UniformPredictor::new(game.clone());
    let heuristic = ConnectFourHeuristic::new(&game);
    let config = ArenaConfig::default()
        .with_mcts(MCTSConfig::default().with_simulations(10))
        .with_baseline(BaselineConfig::default().with_depth(2))
        .with_rounds(8)
        .with_workers(4)
        .with_seed(21);

    let a = run_matches(&game, &predictor, &heuristic, &config).unwrap();
    let b = run_matches(&game, &predictor, &heuristic, &config).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.total(), 8);
}
