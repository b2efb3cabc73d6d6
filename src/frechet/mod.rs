//! Fréchet LSH: curve search by lifting curves into vector space.
//!
//! A curve is snapped to a randomly shifted δ-grid, consecutive duplicate
//! cells are dropped, and the surviving points are flattened into a
//! fixed-length vector (padded with a sentinel far outside the data range).
//! Candidate generation then delegates to an inner [`LshIndex`] over the
//! flattened vectors, while true distances are always the Fréchet metric on
//! the original curves.
//!
//! # References
//!
//! - Driemel, Krivošija & Sohler (2016): "Clustering time series under the
//!   Fréchet distance"

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::CurvePoint;
use crate::lsh::{LshIndex, LshParams};
use crate::metrics::{continuous_frechet, discrete_frechet, Metric};
use crate::neighbors::{Neighbor, NeighborHeap};
use crate::{KentroError, Result};

/// Padding coordinate for flattened curves; far outside any data range so a
/// padded tail never collides with real grid cells.
const SENTINEL: f32 = 1.0e4;

/// Snapping-grid parameters.
#[derive(Debug, Clone)]
pub struct GridParams {
    /// Grid cell width δ.
    pub delta: f64,
    /// Flattened curve capacity; `None` derives it from the longest inserted
    /// curve announced at construction.
    pub max_curve_len: Option<usize>,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            delta: 1.0,
            max_curve_len: None,
        }
    }
}

/// LSH index over polygonal curves under the Fréchet distance.
pub struct FrechetLshIndex {
    metric: Metric,
    delta: f64,
    shift: (f64, f64),
    max_curve_len: usize,
    inner: LshIndex,
    curves: Vec<Vec<CurvePoint>>,
    ids: Vec<u32>,
}

impl FrechetLshIndex {
    /// Create an index for curves of at most `max_curve_len` points.
    ///
    /// `metric` must be one of the Fréchet variants; `table_size` follows the
    /// same `max(1, N/16)` sizing rule as the vector index. The grid shift is
    /// drawn from its own stream derived from `seed`; the inner index gets the
    /// next stream.
    pub fn new(
        max_curve_len: usize,
        table_size: usize,
        grid: GridParams,
        lsh: LshParams,
        metric: Metric,
        seed: u64,
    ) -> Result<Self> {
        if !metric.is_curve_metric() {
            return Err(KentroError::InvalidConfig(
                "Fréchet index needs a Fréchet metric".to_string(),
            ));
        }
        if grid.delta <= 0.0 {
            return Err(KentroError::InvalidConfig(
                "grid delta must be positive".to_string(),
            ));
        }
        let max_curve_len = grid.max_curve_len.unwrap_or(max_curve_len);
        if max_curve_len == 0 {
            return Err(KentroError::InvalidConfig(
                "maximum curve length must be greater than 0".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let shift = (
            rng.random::<f64>() * grid.delta,
            rng.random::<f64>() * grid.delta,
        );
        let inner = LshIndex::new(2 * max_curve_len, table_size, lsh, seed.wrapping_add(1))?;

        Ok(Self {
            metric,
            delta: grid.delta,
            shift,
            max_curve_len,
            inner,
            curves: Vec::new(),
            ids: Vec::new(),
        })
    }

    /// Add a curve under the caller's id.
    pub fn insert(&mut self, id: u32, points: &[CurvePoint]) -> Result<()> {
        if points.is_empty() {
            return Err(KentroError::InvalidConfig(
                "cannot index an empty curve".to_string(),
            ));
        }
        let flat = self.snap_and_flatten(points);
        self.inner.insert(self.ids.len() as u32, &flat)?;
        self.curves.push(points.to_vec());
        self.ids.push(id);
        Ok(())
    }

    /// The `n` approximate nearest curves, ascending by Fréchet distance.
    pub fn knn(&self, query: &[CurvePoint], n: usize) -> Result<Vec<Neighbor>> {
        let mut heap = NeighborHeap::new(n);
        for slot in self.raw_candidates(query)? {
            let distance = self.curve_distance(query, &self.curves[slot]);
            heap.push(Neighbor::new(self.ids[slot], distance));
        }
        Ok(heap.into_sorted())
    }

    /// All candidates with Fréchet distance below `radius`.
    pub fn range(&self, query: &[CurvePoint], radius: f64) -> Result<Vec<Neighbor>> {
        let mut results = Vec::new();
        for slot in self.raw_candidates(query)? {
            let distance = self.curve_distance(query, &self.curves[slot]);
            if distance < radius {
                results.push(Neighbor::new(self.ids[slot], distance));
            }
        }
        Ok(results)
    }

    /// Range query with an external, persistent visited set.
    ///
    /// Ids already in `visited` are never re-examined; ids accepted by this
    /// call are added to it. The growing-radius clustering passes rely on this
    /// instead of an inner-radius ring.
    pub fn range_with_set(
        &self,
        query: &[CurvePoint],
        radius: f64,
        visited: &mut HashSet<u32>,
    ) -> Result<Vec<Neighbor>> {
        let mut results = Vec::new();
        for slot in self.raw_candidates(query)? {
            let id = self.ids[slot];
            if visited.contains(&id) {
                continue;
            }
            let distance = self.curve_distance(query, &self.curves[slot]);
            if distance < radius {
                visited.insert(id);
                results.push(Neighbor::new(id, distance));
            }
        }
        Ok(results)
    }

    /// Number of inserted curves.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing has been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn curve_distance(&self, a: &[CurvePoint], b: &[CurvePoint]) -> f64 {
        match self.metric {
            Metric::ContinuousFrechet => continuous_frechet(a, b),
            _ => discrete_frechet(a, b),
        }
    }

    /// Candidate storage slots for a query curve, deduplicated.
    fn raw_candidates(&self, query: &[CurvePoint]) -> Result<Vec<usize>> {
        if self.ids.is_empty() {
            return Err(KentroError::EmptyIndex);
        }
        let flat = self.snap_and_flatten(query);
        let none = HashSet::new();
        Ok(self
            .inner
            .candidates(&flat, &none)?
            .into_iter()
            .map(|slot| slot as usize)
            .collect())
    }

    /// Snap to the shifted grid, drop consecutive duplicates, flatten, pad.
    fn snap_and_flatten(&self, points: &[CurvePoint]) -> Vec<f32> {
        let snap = |v: f64, t: f64| ((v - t) / self.delta).floor() * self.delta + t;
        let mut snapped: Vec<CurvePoint> = Vec::with_capacity(points.len());
        for p in points {
            let cell = CurvePoint::new(
                snap(p.x as f64, self.shift.0) as f32,
                snap(p.y as f64, self.shift.1) as f32,
            );
            if snapped.last() != Some(&cell) {
                snapped.push(cell);
            }
        }
        snapped.truncate(self.max_curve_len);

        let mut flat = Vec::with_capacity(2 * self.max_curve_len);
        for p in &snapped {
            flat.push(p.x);
            flat.push(p.y);
        }
        flat.resize(2 * self.max_curve_len, SENTINEL);
        flat
    }
}
