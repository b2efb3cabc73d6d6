//! Benchmarks for index construction and queries.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kentro::hypercube::{CubeParams, HypercubeIndex};
use kentro::lsh::{LshIndex, LshParams};

fn random_points(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.random::<f32>() * 100.0).collect())
        .collect()
}

fn lsh_index(points: &[Vec<f32>], dim: usize) -> LshIndex {
    let params = LshParams {
        tables: 6,
        hashes_per_table: 4,
        window: 10.0,
    };
    let mut index = LshIndex::new(dim, (points.len() / 16).max(1), params, 42).unwrap();
    for (i, p) in points.iter().enumerate() {
        index.insert(i as u32, p).unwrap();
    }
    index
}

fn bench_lsh_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("lsh_knn");
    let dim = 32;

    for n in [1_000usize, 10_000].iter() {
        let points = random_points(*n, dim, 1);
        let index = lsh_index(&points, dim);
        let query = &points[*n / 2];

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bench, _| {
            bench.iter(|| index.knn(black_box(query), 10));
        });
    }

    group.finish();
}

fn bench_hypercube_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("hypercube_knn");
    let dim = 32;

    for n in [1_000usize, 10_000].iter() {
        let points = random_points(*n, dim, 1);
        let params = CubeParams {
            bits: 10,
            window: 10.0,
            max_candidates: 3_000,
            probes: 64,
        };
        let mut index = HypercubeIndex::new(dim, params, 42).unwrap();
        for (i, p) in points.iter().enumerate() {
            index.insert(i as u32, p).unwrap();
        }
        let query = &points[*n / 2];

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bench, _| {
            bench.iter(|| index.knn(black_box(query), 10));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lsh_knn, bench_hypercube_knn);
criterion_main!(benches);
