use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qmaze::rl::{greedy_rollout, Maze, QLearning, QLearningConfig};

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("q_learning_train");
    for episodes in [100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(episodes), &episodes, |b, &episodes| {
            b.iter(|| {
                let config = QLearningConfig {
                    episodes,
                    ..QLearningConfig::default()
                };
                let mut agent = QLearning::with_seed(Maze::classic(), config, 42).unwrap();
                black_box(agent.train())
            });
        });
    }
    group.finish();
}

fn bench_rollout(c: &mut Criterion) {
    let mut agent = QLearning::with_seed(Maze::classic(), QLearningConfig::default(), 42).unwrap();
    agent.train();

    c.bench_function("greedy_rollout", |b| {
        b.iter(|| greedy_rollout(black_box(agent.maze()), black_box(agent.q_table()), 50))
    });
}

criterion_group!(benches, bench_training, bench_rollout);
criterion_main!(benches);
