//! Clustering quality metrics.
//!
//! Consumers of a [`ClusterOutcome`](crate::cluster::ClusterOutcome) live
//! outside the core; this module only reads the driver's result accessors.

use crate::cluster::ClusterOutcome;
use crate::dataset::{Dataset, Item};
use crate::metrics::Metric;
use crate::{KentroError, Result};

fn member(dataset: &Dataset, id: u32) -> Result<&Item> {
    dataset.get(id).ok_or_else(|| {
        KentroError::InvalidConfig(format!("cluster references unknown item id {id}"))
    })
}

/// Silhouette scores of a finished clustering.
///
/// Returns K per-cluster mean silhouettes followed by the overall mean, in
/// one vector of length K+1. For every item, `a` is the mean distance to its
/// own cluster's other members and `b` the mean distance to the members of
/// the cluster whose centroid is second nearest.
///
/// Degenerate shapes score zero instead of dividing by zero: a singleton
/// member has `a = 0`, an empty neighbor cluster has `b = 0`, and an empty
/// cluster's mean is 0.
pub fn silhouette(
    dataset: &Dataset,
    outcome: &ClusterOutcome,
    metric: Metric,
) -> Result<Vec<f64>> {
    let k = outcome.centroids.len();
    let mut scores = Vec::with_capacity(k + 1);
    let mut total = 0.0;
    let mut total_count = 0usize;

    for (i, cluster) in outcome.clusters.iter().enumerate() {
        let mut cluster_sum = 0.0;
        for &id in cluster {
            let item = member(dataset, id)?;

            let mut a = 0.0;
            for &other in cluster {
                if other != id {
                    a += metric.distance(item, member(dataset, other)?)?;
                }
            }
            if cluster.len() > 1 {
                a /= (cluster.len() - 1) as f64;
            }

            // Neighbor cluster: the second-nearest centroid.
            let mut neighbor = usize::MAX;
            let mut neighbor_dist = f64::INFINITY;
            for (j, centroid) in outcome.centroids.iter().enumerate() {
                if j == i {
                    continue;
                }
                let d = metric.distance(item, centroid)?;
                if d < neighbor_dist {
                    neighbor_dist = d;
                    neighbor = j;
                }
            }

            let mut b = 0.0;
            if neighbor != usize::MAX {
                let others = &outcome.clusters[neighbor];
                for &other in others {
                    b += metric.distance(item, member(dataset, other)?)?;
                }
                if !others.is_empty() {
                    b /= others.len() as f64;
                }
            }

            let denom = a.max(b);
            let s = if denom > 0.0 { (b - a) / denom } else { 0.0 };
            cluster_sum += s;
            total += s;
            total_count += 1;
        }

        let mean = if cluster.is_empty() {
            0.0
        } else {
            cluster_sum / cluster.len() as f64
        };
        scores.push(mean);
    }

    scores.push(if total_count == 0 {
        0.0
    } else {
        total / total_count as f64
    });
    Ok(scores)
}
