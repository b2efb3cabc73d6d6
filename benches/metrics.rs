//! Benchmarks for the distance kernels.
//!
//! The discrete Fréchet DP dominates curve clustering time; the Euclidean
//! kernel dominates vector queries.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kentro::metrics::{continuous_frechet, discrete_frechet, euclidean};
use kentro::CurvePoint;

fn random_vector(dim: usize, rng: &mut StdRng) -> Vec<f32> {
    (0..dim).map(|_| rng.random::<f32>() * 2.0 - 1.0).collect()
}

fn random_curve(len: usize, rng: &mut StdRng) -> Vec<CurvePoint> {
    (0..len)
        .map(|i| CurvePoint::new((i + 1) as f32, rng.random::<f32>() * 4.0))
        .collect()
}

fn bench_euclidean(c: &mut Criterion) {
    let mut group = c.benchmark_group("euclidean");
    let mut rng = StdRng::seed_from_u64(42);

    for dim in [16, 64, 256, 1024].iter() {
        group.throughput(Throughput::Elements(*dim as u64));
        let a = random_vector(*dim, &mut rng);
        let b = random_vector(*dim, &mut rng);

        group.bench_with_input(BenchmarkId::from_parameter(dim), dim, |bench, _| {
            bench.iter(|| euclidean(black_box(&a), black_box(&b)));
        });
    }

    group.finish();
}

fn bench_discrete_frechet(c: &mut Criterion) {
    let mut group = c.benchmark_group("discrete_frechet");
    let mut rng = StdRng::seed_from_u64(42);

    for len in [16, 64, 128].iter() {
        group.throughput(Throughput::Elements((*len * *len) as u64));
        let p = random_curve(*len, &mut rng);
        let q = random_curve(*len, &mut rng);

        group.bench_with_input(BenchmarkId::from_parameter(len), len, |bench, _| {
            bench.iter(|| discrete_frechet(black_box(&p), black_box(&q)));
        });
    }

    group.finish();
}

fn bench_continuous_frechet(c: &mut Criterion) {
    let mut group = c.benchmark_group("continuous_frechet");
    let mut rng = StdRng::seed_from_u64(42);

    for len in [16, 64].iter() {
        let p = random_curve(*len, &mut rng);
        let q = random_curve(*len, &mut rng);

        group.bench_with_input(BenchmarkId::from_parameter(len), len, |bench, _| {
            bench.iter(|| continuous_frechet(black_box(&p), black_box(&q)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_euclidean,
    bench_discrete_frechet,
    bench_continuous_frechet
);
criterion_main!(benches);
