//! Distance kernels: Euclidean for vectors, discrete and continuous Fréchet
//! for polygonal curves.
//!
//! All kernels are pure and take their operands by shared reference. The
//! discrete Fréchet distance is the classic O(m·n) dynamic program; the
//! continuous variant runs the free-space decision procedure under a bisection
//! on the critical distance and is correct to within [`CONTINUOUS_EPS`].
//!
//! # References
//!
//! - Eiter & Mannila (1994): "Computing discrete Fréchet distance"
//! - Alt & Godau (1995): "Computing the Fréchet distance between two polygonal
//!   curves"

use crate::dataset::{CurvePoint, Item};
use crate::{KentroError, Result};

/// Absolute tolerance of the continuous Fréchet bisection.
pub const CONTINUOUS_EPS: f64 = 1e-4;

/// Distance metric over items.
///
/// Dispatches on the item variant; applying a vector metric to curves (or the
/// reverse) is a configuration error, not a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Euclidean (L2) distance over vector items.
    Euclidean,
    /// Discrete Fréchet distance over curve items.
    DiscreteFrechet,
    /// Continuous Fréchet distance over curve items.
    ContinuousFrechet,
}

impl Metric {
    /// Compute the distance between two items.
    pub fn distance(self, a: &Item, b: &Item) -> Result<f64> {
        match (self, a, b) {
            (Metric::Euclidean, Item::Vector { coords: x, .. }, Item::Vector { coords: y, .. }) => {
                euclidean(x, y)
            }
            (
                Metric::DiscreteFrechet,
                Item::Curve { points: p, .. },
                Item::Curve { points: q, .. },
            ) => Ok(discrete_frechet(p, q)),
            (
                Metric::ContinuousFrechet,
                Item::Curve { points: p, .. },
                Item::Curve { points: q, .. },
            ) => Ok(continuous_frechet(p, q)),
            _ => Err(KentroError::InvalidConfig(format!(
                "{self:?} metric applied to mismatched item variants"
            ))),
        }
    }

    /// Whether this metric operates on curve items.
    pub fn is_curve_metric(self) -> bool {
        !matches!(self, Metric::Euclidean)
    }
}

/// Euclidean (L2) distance between two vectors.
pub fn euclidean(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(KentroError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = (x - y) as f64;
            d * d
        })
        .sum();
    Ok(sum.sqrt())
}

#[inline]
fn point_distance(p: CurvePoint, q: CurvePoint) -> f64 {
    let dx = (p.x - q.x) as f64;
    let dy = (p.y - q.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Discrete Fréchet distance between two polygonal curves.
///
/// Returns `f64::INFINITY` when either curve is empty.
pub fn discrete_frechet(p: &[CurvePoint], q: &[CurvePoint]) -> f64 {
    if p.is_empty() || q.is_empty() {
        return f64::INFINITY;
    }
    let table = frechet_table(p, q);
    table[p.len() - 1][q.len() - 1]
}

/// Full discrete-Fréchet DP table.
///
/// `table[i][j]` is the coupling cost of the prefixes `p[..=i]` and `q[..=j]`.
/// The mean-curve tree walks this table backwards to recover an optimal
/// traversal. Both curves must be non-empty.
pub(crate) fn frechet_table(p: &[CurvePoint], q: &[CurvePoint]) -> Vec<Vec<f64>> {
    let m = p.len();
    let n = q.len();
    let mut table = vec![vec![0.0f64; n]; m];

    table[0][0] = point_distance(p[0], q[0]);
    for j in 1..n {
        table[0][j] = table[0][j - 1].max(point_distance(p[0], q[j]));
    }
    for i in 1..m {
        table[i][0] = table[i - 1][0].max(point_distance(p[i], q[0]));
    }
    for i in 1..m {
        for j in 1..n {
            let reach = table[i - 1][j]
                .min(table[i][j - 1])
                .min(table[i - 1][j - 1]);
            table[i][j] = reach.max(point_distance(p[i], q[j]));
        }
    }
    table
}

/// Continuous Fréchet distance between two polygonal curves.
///
/// Bisects on the critical distance between a lower bound (the endpoint
/// distances) and an upper bound (the discrete distance), deciding each
/// candidate with the free-space reachability procedure. The result is within
/// [`CONTINUOUS_EPS`] of the true value. Returns `f64::INFINITY` when either
/// curve is empty.
pub fn continuous_frechet(p: &[CurvePoint], q: &[CurvePoint]) -> f64 {
    if p.is_empty() || q.is_empty() {
        return f64::INFINITY;
    }
    let mut lo = point_distance(p[0], q[0]).max(point_distance(p[p.len() - 1], q[q.len() - 1]));
    let mut hi = discrete_frechet(p, q);
    if hi - lo <= CONTINUOUS_EPS || frechet_decision(p, q, lo) {
        return lo;
    }
    while hi - lo > CONTINUOUS_EPS {
        let mid = 0.5 * (lo + hi);
        if frechet_decision(p, q, mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi
}

/// Free interval of `t ∈ [0,1]` with `|p - (a + t(b-a))| ≤ eps`.
fn free_interval(p: CurvePoint, a: CurvePoint, b: CurvePoint, eps: f64) -> Option<(f64, f64)> {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let px = (a.x - p.x) as f64;
    let py = (a.y - p.y) as f64;
    let qa = dx * dx + dy * dy;
    let qb = 2.0 * (dx * px + dy * py);
    let qc = px * px + py * py - eps * eps;
    if qa == 0.0 {
        // Degenerate segment: free iff the single point is within eps.
        return if qc <= 0.0 { Some((0.0, 1.0)) } else { None };
    }
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t0 = ((-qb - sq) / (2.0 * qa)).max(0.0);
    let t1 = ((-qb + sq) / (2.0 * qa)).min(1.0);
    if t0 > t1 {
        None
    } else {
        Some((t0, t1))
    }
}

/// Alt–Godau decision: can the curves be traversed monotonically while staying
/// within distance `eps` of each other?
fn frechet_decision(p: &[CurvePoint], q: &[CurvePoint], eps: f64) -> bool {
    let m = p.len();
    let n = q.len();
    if point_distance(p[0], q[0]) > eps || point_distance(p[m - 1], q[n - 1]) > eps {
        return false;
    }
    if m == 1 {
        return q.iter().all(|&pt| point_distance(p[0], pt) <= eps);
    }
    if n == 1 {
        return p.iter().all(|&pt| point_distance(pt, q[0]) <= eps);
    }

    // reach_bottom[i][j]: reachable part of the free interval on segment
    // p[i]..p[i+1] against point q[j]; reach_left[i][j]: segment q[j]..q[j+1]
    // against point p[i].
    let mut reach_bottom = vec![vec![None::<(f64, f64)>; n]; m - 1];
    let mut reach_left = vec![vec![None::<(f64, f64)>; n - 1]; m];

    // Boundary rows: reachable only through a contiguous free prefix.
    let mut open = true;
    for (i, row) in reach_bottom.iter_mut().enumerate() {
        if !open {
            break;
        }
        match free_interval(q[0], p[i], p[i + 1], eps) {
            Some((lo, hi)) if lo == 0.0 => {
                row[0] = Some((0.0, hi));
                open = hi == 1.0;
            }
            _ => open = false,
        }
    }
    open = true;
    for (j, cell) in reach_left[0].iter_mut().enumerate() {
        if !open {
            break;
        }
        match free_interval(p[0], q[j], q[j + 1], eps) {
            Some((lo, hi)) if lo == 0.0 => {
                *cell = Some((0.0, hi));
                open = hi == 1.0;
            }
            _ => open = false,
        }
    }

    // Cell sweep: free-space cells are convex, so an entry through the bottom
    // edge reaches the whole free part of the right edge, while an entry
    // through the left edge is bounded below by its own lower end.
    for j in 0..n - 1 {
        for i in 0..m - 1 {
            let bottom = reach_bottom[i][j];
            let left = reach_left[i][j];
            if bottom.is_none() && left.is_none() {
                continue;
            }
            if let Some((flo, fhi)) = free_interval(p[i + 1], q[j], q[j + 1], eps) {
                reach_left[i + 1][j] = if bottom.is_some() {
                    Some((flo, fhi))
                } else {
                    let (llo, _) = left.unwrap_or((0.0, 0.0));
                    let lo = flo.max(llo);
                    (lo <= fhi).then_some((lo, fhi))
                };
            }
            if let Some((flo, fhi)) = free_interval(q[j + 1], p[i], p[i + 1], eps) {
                reach_bottom[i][j + 1] = if left.is_some() {
                    Some((flo, fhi))
                } else {
                    let (blo, _) = bottom.unwrap_or((0.0, 0.0));
                    let lo = flo.max(blo);
                    (lo <= fhi).then_some((lo, fhi))
                };
            }
        }
    }

    let top = reach_bottom[m - 2][n - 1].is_some_and(|(_, hi)| hi == 1.0);
    let right = reach_left[m - 1][n - 2].is_some_and(|(_, hi)| hi == 1.0);
    top || right
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(points: &[(f32, f32)]) -> Vec<CurvePoint> {
        points.iter().map(|&(x, y)| CurvePoint::new(x, y)).collect()
    }

    #[test]
    fn euclidean_basic() {
        assert_eq!(euclidean(&[0.0, 0.0], &[3.0, 4.0]).unwrap(), 5.0);
    }

    #[test]
    fn euclidean_dimension_mismatch() {
        assert!(matches!(
            euclidean(&[0.0], &[0.0, 1.0]),
            Err(KentroError::DimensionMismatch { left: 1, right: 2 })
        ));
    }

    #[test]
    fn discrete_frechet_parallel_lines() {
        // Two horizontal segments one unit apart: every coupling pairs points
        // exactly 1.0 away.
        let p = curve(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let q = curve(&[(0.0, 1.0), (1.0, 1.0), (2.0, 1.0)]);
        assert_eq!(discrete_frechet(&p, &q), 1.0);
    }

    #[test]
    fn discrete_frechet_is_symmetric() {
        let p = curve(&[(0.0, 0.0), (2.0, 3.0), (4.0, 1.0)]);
        let q = curve(&[(0.0, 1.0), (3.0, 3.0)]);
        assert_eq!(discrete_frechet(&p, &q), discrete_frechet(&q, &p));
    }

    #[test]
    fn discrete_frechet_identical_curves_is_zero() {
        let p = curve(&[(0.0, 0.0), (1.0, 2.0), (3.0, 1.0)]);
        assert_eq!(discrete_frechet(&p, &p), 0.0);
    }

    #[test]
    fn continuous_frechet_parallel_lines() {
        let p = curve(&[(0.0, 0.0), (2.0, 0.0)]);
        let q = curve(&[(0.0, 1.0), (2.0, 1.0)]);
        let d = continuous_frechet(&p, &q);
        assert!((d - 1.0).abs() <= CONTINUOUS_EPS * 10.0, "d = {d}");
    }

    #[test]
    fn continuous_at_most_discrete() {
        let p = curve(&[(0.0, 0.0), (1.0, 3.0), (2.0, 0.0), (3.0, 3.0)]);
        let q = curve(&[(0.0, 0.5), (1.5, 2.5), (3.0, 0.0)]);
        assert!(continuous_frechet(&p, &q) <= discrete_frechet(&p, &q) + CONTINUOUS_EPS);
    }

    #[test]
    fn continuous_beats_discrete_on_zigzag() {
        // The continuous traversal can wait on a segment interior, which the
        // discrete coupling cannot; a sparse vs dense sampling of the same
        // segment shows the gap.
        let p = curve(&[(0.0, 0.0), (4.0, 0.0)]);
        let q = curve(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, 1.0), (4.0, 0.0)]);
        let cont = continuous_frechet(&p, &q);
        let disc = discrete_frechet(&p, &q);
        assert!(cont <= 1.0 + CONTINUOUS_EPS * 10.0);
        assert!(disc >= cont);
    }

    #[test]
    fn metric_rejects_variant_mismatch() {
        let v = Item::vector("v", vec![0.0]);
        let c = Item::curve_from_series("c", &[0.0]);
        assert!(Metric::Euclidean.distance(&v, &c).is_err());
        assert!(Metric::DiscreteFrechet.distance(&v, &v).is_err());
    }

    #[test]
    fn metric_dispatches_on_tag() {
        let a = Item::vector("a", vec![0.0, 0.0]);
        let b = Item::vector("b", vec![3.0, 4.0]);
        assert_eq!(Metric::Euclidean.distance(&a, &b).unwrap(), 5.0);

        let p = Item::curve_from_series("p", &[0.0, 0.0]);
        let q = Item::curve_from_series("q", &[1.0, 1.0]);
        assert_eq!(Metric::DiscreteFrechet.distance(&p, &q).unwrap(), 1.0);
    }
}
