use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use gridmind_brain::{LearningStrategy, PolicyNetwork, TrainingData};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use std::hint::black_box;

fn bench_predict(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(0xBEEF);
    let network = PolicyNetwork::new(7, 150, 5, 0.1, &mut rng);
    let input: Vec<f64> = (0..7).map(|_| rng.random_range(0.0..5.0)).collect();
    c.bench_function("predict_7x150x5", |b| {
        b.iter(|| network.predict(black_box(&input)).expect("predict"));
    });
}

fn bench_meditation(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(0xF00D);
    let samples: usize = std::env::var("GM_BENCH_MEMORY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(1000);
    let mut state = || (0..7).map(|_| rng.random_range(0.0..5.0)).collect::<Vec<f64>>();
    let inputs: Vec<_> = (0..samples).map(|_| state()).collect();
    let next_states: Vec<_> = (0..samples).map(|_| state()).collect();
    let rewards = vec![10.0; samples];
    let actions: Vec<usize> = (0..samples).map(|i| i % 5).collect();
    let data = TrainingData::experience(inputs, rewards, next_states, actions)
        .expect("data")
        .with_strategy(LearningStrategy::discounted());

    c.bench_function("fit_discounted_10_epochs", |b| {
        b.iter_batched(
            || {
                let mut rng = SmallRng::seed_from_u64(1);
                (PolicyNetwork::new(7, 150, 5, 0.1, &mut rng), rng)
            },
            |(mut network, mut rng)| network.fit(&data, 10, &mut rng).expect("fit"),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_predict, bench_meditation);
criterion_main!(benches);
