//! Centroid update rules: componentwise mean vector, CBTree mean curve.

use crate::cbtree::CbTree;
use crate::dataset::{CurvePoint, Dataset, Item};

/// Componentwise arithmetic mean of a cluster of vector items.
///
/// `None` for an empty cluster (the centroid stays put).
pub(crate) fn mean_vector(dataset: &Dataset, cluster: &[u32]) -> Option<Vec<f32>> {
    let dim = dataset.dimension()?;
    if cluster.is_empty() {
        return None;
    }
    let mut mean = vec![0.0f32; dim];
    for &id in cluster {
        let coords = dataset.get(id)?.coords()?;
        for (m, &c) in mean.iter_mut().zip(coords.iter()) {
            *m += c;
        }
    }
    let count = cluster.len() as f32;
    for m in &mut mean {
        *m /= count;
    }
    Some(mean)
}

/// Fréchet mean of a cluster of curves via the complete binary tree.
///
/// `None` for an empty cluster.
pub(crate) fn mean_curve(
    dataset: &Dataset,
    cluster: &[u32],
    max_curve_len: usize,
) -> Option<Vec<CurvePoint>> {
    if cluster.is_empty() {
        return None;
    }
    let curves: Vec<Vec<CurvePoint>> = cluster
        .iter()
        .filter_map(|&id| dataset.get(id).and_then(Item::points).map(<[_]>::to_vec))
        .collect();
    CbTree::new(curves, max_curve_len).mean_curve()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_vector_averages_components() {
        let ds = Dataset::from_vectors(vec![
            ("a".into(), vec![0.0, 2.0]),
            ("b".into(), vec![2.0, 4.0]),
            ("c".into(), vec![4.0, 0.0]),
        ])
        .unwrap();
        assert_eq!(mean_vector(&ds, &[0, 1, 2]), Some(vec![2.0, 2.0]));
    }

    #[test]
    fn empty_cluster_has_no_mean() {
        let ds = Dataset::from_vectors(vec![("a".into(), vec![1.0])]).unwrap();
        assert_eq!(mean_vector(&ds, &[]), None);

        let cs = Dataset::new(vec![Item::curve_from_series("c", &[1.0, 2.0])]).unwrap();
        assert_eq!(mean_curve(&cs, &[], 8), None);
    }

    #[test]
    fn mean_curve_of_one_is_itself() {
        let ds = Dataset::new(vec![Item::curve_from_series("c", &[1.0, 3.0, 2.0])]).unwrap();
        let mean = mean_curve(&ds, &[0], 8).unwrap();
        assert_eq!(mean, ds.get(0).unwrap().points().unwrap());
    }
}
