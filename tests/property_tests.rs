//! Property-based tests for kentro invariants.
//!
//! These verify behavior that should hold regardless of input:
//! - metric-space basics of the distance kernels
//! - clustering always partitions the dataset, deterministically per seed
//! - weighted search agrees with a linear scan

use proptest::prelude::*;

use kentro::cluster::{weighted_search, ClusterConfig, ClusterDriver};
use kentro::metrics::{discrete_frechet, euclidean};
use kentro::{CurvePoint, Dataset};

prop_compose! {
    fn arb_vector(dim: usize)(vec in prop::collection::vec(-10.0f32..10.0, dim)) -> Vec<f32> {
        vec
    }
}

prop_compose! {
    fn arb_curve()(values in prop::collection::vec(-5.0f32..5.0, 1..12)) -> Vec<CurvePoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| CurvePoint::new((i + 1) as f32, v))
            .collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn euclidean_is_symmetric_and_nonnegative(
        a in arb_vector(16),
        b in arb_vector(16),
    ) {
        let ab = euclidean(&a, &b).unwrap();
        let ba = euclidean(&b, &a).unwrap();
        prop_assert!(ab >= 0.0);
        prop_assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn frechet_is_symmetric_and_zero_on_self(
        p in arb_curve(),
        q in arb_curve(),
    ) {
        prop_assert!((discrete_frechet(&p, &q) - discrete_frechet(&q, &p)).abs() < 1e-9);
        prop_assert!(discrete_frechet(&p, &p) == 0.0);
    }

    #[test]
    fn frechet_dominates_endpoint_distance(
        p in arb_curve(),
        q in arb_curve(),
    ) {
        // Any coupling matches the two first points and the two last points.
        let first = euclidean(
            &[p[0].x, p[0].y],
            &[q[0].x, q[0].y],
        ).unwrap();
        prop_assert!(discrete_frechet(&p, &q) >= first - 1e-9);
    }

    #[test]
    fn clustering_partitions_every_dataset(
        seed in any::<u64>(),
        k in 1usize..5,
        raw in prop::collection::vec(arb_vector(3), 5..40),
    ) {
        prop_assume!(k <= raw.len());
        let dataset = Dataset::from_vectors(
            raw.into_iter().enumerate().map(|(i, v)| (format!("p{i}"), v)).collect(),
        ).unwrap();

        let mut config = ClusterConfig::new(k);
        config.seed = seed;
        config.iter_max = 5;
        let outcome = ClusterDriver::new(config).unwrap().run(&dataset).unwrap();

        prop_assert_eq!(outcome.centroids.len(), k);
        let mut ids: Vec<u32> = outcome.clusters.iter().flatten().copied().collect();
        ids.sort_unstable();
        let expected: Vec<u32> = (0..dataset.len() as u32).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn clustering_is_deterministic_given_seed(
        seed in any::<u64>(),
        raw in prop::collection::vec(arb_vector(2), 6..24),
    ) {
        let dataset = Dataset::from_vectors(
            raw.into_iter().enumerate().map(|(i, v)| (format!("p{i}"), v)).collect(),
        ).unwrap();

        let mut config = ClusterConfig::new(3);
        config.seed = seed;
        config.iter_max = 4;
        let a = ClusterDriver::new(config.clone()).unwrap().run(&dataset).unwrap();
        let b = ClusterDriver::new(config).unwrap().run(&dataset).unwrap();
        prop_assert_eq!(a.clusters, b.clusters);
        prop_assert_eq!(a.centroids, b.centroids);
    }

    #[test]
    fn weighted_search_matches_linear_scan(
        weights in prop::collection::vec(0.0f64..10.0, 1..50),
        pick in 0.0f64..1.0,
    ) {
        let mut prefix = vec![0.0f64];
        for w in &weights {
            prefix.push(prefix[prefix.len() - 1] + w);
        }
        let total = prefix[prefix.len() - 1];
        prop_assume!(total > 0.0);

        let x = (1.0 - pick) * total; // in (0, total]
        let r = weighted_search(&prefix, x).unwrap();
        let linear = prefix.iter().position(|&p| p >= x).unwrap();
        prop_assert_eq!(r, linear);
    }
}
