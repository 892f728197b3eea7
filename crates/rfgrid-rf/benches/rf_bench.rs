//! Criterion benchmarks for rfgrid-rf: forest training per criterion and prediction.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use rfgrid_rf::{RandomForestConfig, SplitCriterion};

/// Binary data with one informative column out of five, sized like the passenger set.
fn make_binary(n_samples: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let label = usize::from(rng.gen_bool(0.4));
        labels.push(label);
        features.push(vec![
            label as f64 + rng.r#gen::<f64>(),
            rng.gen_range(0.0..80.0),
            f64::from(rng.gen_range(1u8..=3)),
            f64::from(rng.gen_range(0u8..5)),
            f64::from(rng.gen_range(0u8..4)),
        ]);
    }
    let names = (0..5).map(|f| format!("f{f}")).collect();
    (features, labels, names)
}

fn bench_train_per_criterion(c: &mut Criterion) {
    let (features, labels, names) = make_binary(917, 42);
    let mut group = c.benchmark_group("rf_train_917x5_60trees");
    for criterion in SplitCriterion::ALL {
        let cfg = RandomForestConfig::new(60)
            .unwrap()
            .with_seed(42)
            .with_criterion(criterion);
        group.bench_with_input(BenchmarkId::from_parameter(criterion), &cfg, |b, cfg| {
            b.iter(|| cfg.fit(&features, &labels, &names).unwrap());
        });
    }
    group.finish();
}

fn bench_predict_batch(c: &mut Criterion) {
    let (features, labels, names) = make_binary(917, 42);
    let forest = RandomForestConfig::new(110)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels, &names)
        .unwrap()
        .into_forest();
    let (test, _, _) = make_binary(392, 7);

    c.bench_function("rf_predict_batch_392x5_110trees", |b| {
        b.iter(|| forest.predict_batch(&test).unwrap());
    });
}

criterion_group!(benches, bench_train_per_criterion, bench_predict_batch);
criterion_main!(benches);
