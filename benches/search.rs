//! Search throughput on Connect Four.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rust_azero::games::ConnectFour;
use rust_azero::mcts::{MCTSConfig, MCTSSearch};
use rust_azero::nn::{ConnectFourEncoder, LinearPredictor, LinearPredictorConfig, UniformPredictor};
use rust_azero::rules::RulesEngine;

fn bench_uniform(c: &mut Criterion) {
    let game = ConnectFour::new();
    let predictor = UniformPredictor::new(game.clone());
    let mut group = c.benchmark_group("uniform");

    for simulations in [50u32, 200, 800] {
        let config = MCTSConfig::default().with_simulations(simulations);
        group.bench_with_input(BenchmarkId::from_parameter(simulations), &config, |b, config| {
            b.iter(|| {
                let mut position = game.initial_position();
                let mut search = MCTSSearch::new(&game, &predictor, config, &mut position).unwrap();
                search.run(config.simulations).unwrap();
                black_box(search.tree().len())
            });
        });
    }
    group.finish();
}

fn bench_linear(c: &mut Criterion) {
    let game = ConnectFour::new();
    let predictor = LinearPredictor::new::<ConnectFour>(
        ConnectFourEncoder::new(&game),
        LinearPredictorConfig::default(),
    );
    let config = MCTSConfig::default().with_simulations(200);

    c.bench_function("linear/200", |b| {
        b.iter(|| {
            let mut position = game.initial_position();
            let mut search = MCTSSearch::new(&game, &predictor, &config, &mut position).unwrap();
            search.run(config.simulations).unwrap();
            black_box(search.stats().nodes_created)
        });
    });
}

criterion_group!(benches, bench_uniform, bench_linear);
criterion_main!(benches);
