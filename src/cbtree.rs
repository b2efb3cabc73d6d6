//! Complete binary tree computing a Fréchet mean curve.
//!
//! Leaves are the cluster's curves, padded with empty slots up to the next
//! power of two. Collapsing the tree bottom-up merges sibling pairs with the
//! optimal-traversal mean: walk the discrete-Fréchet DP table's optimal
//! coupling backwards and average every matched point pair. An empty slot
//! absorbs into its sibling unchanged, so padding never distorts the mean.
//!
//! Merged curves longer than the configured cap are uniformly subsampled
//! back down, keeping intermediate curves bounded.

use crate::dataset::CurvePoint;
use crate::metrics::frechet_table;

/// Complete binary tree over a set of curves.
pub struct CbTree {
    leaves: Vec<Option<Vec<CurvePoint>>>,
    max_curve_len: usize,
}

impl CbTree {
    /// Build the tree; `max_curve_len` caps intermediate merged curves.
    pub fn new(curves: Vec<Vec<CurvePoint>>, max_curve_len: usize) -> Self {
        let width = curves.len().next_power_of_two();
        let mut leaves: Vec<Option<Vec<CurvePoint>>> = curves.into_iter().map(Some).collect();
        leaves.resize(width, None);
        Self {
            leaves,
            max_curve_len: max_curve_len.max(1),
        }
    }

    /// Collapse the tree; the root is the mean curve.
    ///
    /// Returns `None` for a tree built from no curves (an empty cluster).
    pub fn mean_curve(self) -> Option<Vec<CurvePoint>> {
        let cap = self.max_curve_len;
        let mut level = self.leaves;
        while level.len() > 1 {
            level = level
                .chunks_exact(2)
                .map(|pair| match (&pair[0], &pair[1]) {
                    (Some(p), Some(q)) => Some(pair_mean(p, q, cap)),
                    (Some(p), None) => Some(p.clone()),
                    (None, Some(q)) => Some(q.clone()),
                    (None, None) => None,
                })
                .collect();
        }
        level.into_iter().next().flatten()
    }
}

/// Mean of two curves along an optimal discrete-Fréchet coupling.
fn pair_mean(p: &[CurvePoint], q: &[CurvePoint], cap: usize) -> Vec<CurvePoint> {
    if p.is_empty() {
        return q.to_vec();
    }
    if q.is_empty() {
        return p.to_vec();
    }
    let table = frechet_table(p, q);
    let mut mean = Vec::new();
    let mut i = p.len() - 1;
    let mut j = q.len() - 1;
    loop {
        mean.push(CurvePoint::new(
            0.5 * (p[i].x + q[j].x),
            0.5 * (p[i].y + q[j].y),
        ));
        if i == 0 && j == 0 {
            break;
        }
        // Step to the cheapest predecessor; diagonal wins ties so the mean
        // stays as short as possible.
        let diag = if i > 0 && j > 0 {
            table[i - 1][j - 1]
        } else {
            f64::INFINITY
        };
        let up = if i > 0 { table[i - 1][j] } else { f64::INFINITY };
        let left = if j > 0 { table[i][j - 1] } else { f64::INFINITY };
        if diag <= up && diag <= left {
            i -= 1;
            j -= 1;
        } else if up <= left {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    mean.reverse();
    if mean.len() > cap {
        subsample(&mean, cap)
    } else {
        mean
    }
}

/// Uniformly subsample a curve down to `cap` points, keeping both endpoints.
fn subsample(curve: &[CurvePoint], cap: usize) -> Vec<CurvePoint> {
    if cap == 1 {
        return vec![curve[0]];
    }
    let last = curve.len() - 1;
    (0..cap)
        .map(|i| {
            let pos = (i as f64 * last as f64 / (cap - 1) as f64).round() as usize;
            curve[pos]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f32]) -> Vec<CurvePoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| CurvePoint::new((i + 1) as f32, v))
            .collect()
    }

    #[test]
    fn empty_tree_has_no_mean() {
        assert!(CbTree::new(Vec::new(), 10).mean_curve().is_none());
    }

    #[test]
    fn single_curve_is_returned_unchanged() {
        let c = series(&[1.0, 2.0, 3.0]);
        let mean = CbTree::new(vec![c.clone()], 10).mean_curve().unwrap();
        assert_eq!(mean, c);
    }

    #[test]
    fn identical_curves_mean_to_themselves() {
        let c = series(&[1.0, 2.0, 1.0, 0.0]);
        let mean = CbTree::new(vec![c.clone(), c.clone()], 10)
            .mean_curve()
            .unwrap();
        assert_eq!(mean, c);
    }

    #[test]
    fn mean_of_parallel_lines_lies_between() {
        let low = series(&[0.0, 0.0, 0.0]);
        let high = series(&[2.0, 2.0, 2.0]);
        let mean = CbTree::new(vec![low, high], 10).mean_curve().unwrap();
        assert!(mean.iter().all(|p| (p.y - 1.0).abs() < 1e-6));
    }

    #[test]
    fn padding_to_power_of_two_is_invisible() {
        // Three curves pad to four leaves; the empty slot must not shift the
        // mean away from the all-identical case.
        let c = series(&[5.0, 5.0]);
        let mean = CbTree::new(vec![c.clone(), c.clone(), c.clone()], 10)
            .mean_curve()
            .unwrap();
        assert_eq!(mean, c);
    }

    #[test]
    fn long_merges_are_subsampled() {
        let a: Vec<CurvePoint> = (0..40).map(|i| CurvePoint::new(i as f32, 0.0)).collect();
        let b: Vec<CurvePoint> = (0..40).map(|i| CurvePoint::new(i as f32, 2.0)).collect();
        let mean = CbTree::new(vec![a, b], 16).mean_curve().unwrap();
        assert!(mean.len() <= 16);
    }
}
