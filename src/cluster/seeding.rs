//! k-means++ centroid seeding and its weighted sampler.

use rand::rngs::StdRng;
use rand::Rng;

use crate::dataset::{Dataset, Item};
use crate::metrics::Metric;
use crate::{KentroError, Result};

/// Smallest `r` with `prefix[r] >= x`, for a non-decreasing prefix-sum array
/// with `prefix[0] == 0`.
///
/// Errors with [`KentroError::SamplerOutOfRange`] when `x <= 0` or
/// `x > prefix[last]`; callers draw from `(0, total]`, so a violation means
/// the caller's arithmetic is wrong, not the sampler's.
pub fn weighted_search(prefix: &[f64], x: f64) -> Result<usize> {
    let total = prefix.last().copied().unwrap_or(0.0);
    if x <= 0.0 || x > total {
        return Err(KentroError::SamplerOutOfRange { x, total });
    }
    let mut lo = 1usize;
    let mut hi = prefix.len() - 1;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if prefix[mid] >= x {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Ok(lo)
}

/// k-means++ initialization: K centroids drawn with D² weighting.
///
/// The first centroid is uniform; each later draw weights non-centroid items
/// by their squared distance to the nearest chosen centroid, normalized by the
/// maximum so the prefix sums cannot overflow. Distances update against only
/// the newest centroid per round. `rng` is the seeding stream; two runs with
/// an equal stream pick identical centroids.
pub(crate) fn kmeans_pp(
    dataset: &Dataset,
    k: usize,
    metric: Metric,
    rng: &mut StdRng,
) -> Result<Vec<Item>> {
    let n = dataset.len();
    if n < k {
        return Err(KentroError::EmptyDataset { size: n, needed: k });
    }

    let first = rng.random_range(0..n) as u32;
    let mut centroids: Vec<Item> = Vec::with_capacity(k);
    let mut chosen = vec![false; n];
    let mut dist = vec![f64::INFINITY; n];

    chosen[first as usize] = true;
    let mut seed_item = dataset.get(first).cloned();
    while let Some(newest) = seed_item.take() {
        centroids.push(newest);
        if centroids.len() == k {
            break;
        }

        // Refresh each non-centroid's distance against only the newest pick.
        let newest = &centroids[centroids.len() - 1];
        let mut max_dist: f64 = 0.0;
        let mut order: Vec<u32> = Vec::with_capacity(n - centroids.len());
        for (id, item) in dataset.iter() {
            if chosen[id as usize] {
                continue;
            }
            let d = metric.distance(newest, item)?;
            if d < dist[id as usize] {
                dist[id as usize] = d;
            }
            max_dist = max_dist.max(dist[id as usize]);
            order.push(id);
        }

        let next = if max_dist == 0.0 {
            // Every remaining item coincides with a centroid; weighting is
            // meaningless, fall back to a uniform pick.
            order[rng.random_range(0..order.len())]
        } else {
            let mut prefix = Vec::with_capacity(order.len() + 1);
            prefix.push(0.0f64);
            for &id in &order {
                let scaled = dist[id as usize] / max_dist;
                prefix.push(prefix[prefix.len() - 1] + scaled * scaled);
            }
            // 1 - u maps the RNG's [0,1) onto (0, total].
            let x = (1.0 - rng.random::<f64>()) * prefix[prefix.len() - 1];
            let r = weighted_search(&prefix, x)?;
            order[r - 1]
        };

        chosen[next as usize] = true;
        dist[next as usize] = 0.0;
        seed_item = dataset.get(next).cloned();
    }

    Ok(centroids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn weighted_search_reference_cases() {
        let p = [0.0, 1.0, 3.0, 6.0];
        assert_eq!(weighted_search(&p, 2.5).unwrap(), 2);
        assert_eq!(weighted_search(&p, 6.0).unwrap(), 3);
        assert_eq!(weighted_search(&p, 0.5).unwrap(), 1);
    }

    #[test]
    fn weighted_search_rejects_out_of_range() {
        let p = [0.0, 1.0, 3.0];
        assert!(matches!(
            weighted_search(&p, 0.0),
            Err(KentroError::SamplerOutOfRange { .. })
        ));
        assert!(matches!(
            weighted_search(&p, 3.5),
            Err(KentroError::SamplerOutOfRange { .. })
        ));
    }

    #[test]
    fn picks_k_distinct_centroids() {
        let ds = Dataset::from_vectors(
            (0..20)
                .map(|i| (format!("p{i}"), vec![i as f32, 0.0]))
                .collect(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let centroids = kmeans_pp(&ds, 4, Metric::Euclidean, &mut rng).unwrap();
        assert_eq!(centroids.len(), 4);
        let mut names: Vec<&str> = centroids.iter().map(Item::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn same_stream_same_centroids() {
        let ds = Dataset::from_vectors(
            (0..30)
                .map(|i| (format!("p{i}"), vec![(i * i % 17) as f32, i as f32]))
                .collect(),
        )
        .unwrap();
        let a = kmeans_pp(&ds, 5, Metric::Euclidean, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = kmeans_pp(&ds, 5, Metric::Euclidean, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_points_fall_back_to_uniform() {
        let ds = Dataset::from_vectors(
            (0..6)
                .map(|i| (format!("p{i}"), vec![1.0, 1.0]))
                .collect(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let centroids = kmeans_pp(&ds, 3, Metric::Euclidean, &mut rng).unwrap();
        assert_eq!(centroids.len(), 3);
    }

    #[test]
    fn too_few_items_is_an_error() {
        let ds = Dataset::from_vectors(vec![("a".into(), vec![0.0])]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            kmeans_pp(&ds, 2, Metric::Euclidean, &mut rng),
            Err(KentroError::EmptyDataset { size: 1, needed: 2 })
        ));
    }
}
