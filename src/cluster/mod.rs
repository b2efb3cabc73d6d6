//! k-means clustering driver.
//!
//! Seeds K centroids with k-means++, then iterates assignment → update until
//! the centroids stop moving or the iteration cap is hit. Assignment is
//! either exact Lloyd or "reverse": instead of scanning all centroids per
//! item, each centroid claims items through growing-radius range queries
//! against one of the approximate indices, and whatever stays unclaimed falls
//! back to Lloyd.
//!
//! Updates support the componentwise mean vector and the Fréchet mean curve.

mod seeding;
mod update;

pub use seeding::weighted_search;

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dataset::{Dataset, Item};
use crate::frechet::{FrechetLshIndex, GridParams};
use crate::hypercube::{CubeParams, HypercubeIndex};
use crate::lsh::{LshIndex, LshParams};
use crate::metrics::Metric;
use crate::traits::VectorIndex;
use crate::{KentroError, Result};

/// Radius floor for the first reverse-assignment pass; near-coincident
/// centroids would otherwise start at radius zero and stall.
const MIN_RADIUS: f64 = 1e-3;

/// How items are assigned to centroids each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// Exact: every item scans every centroid.
    Lloyd,
    /// Reverse assignment through the vector LSH index.
    RangeLsh,
    /// Reverse assignment through the hypercube index.
    RangeHypercube,
    /// Reverse assignment through the Fréchet LSH index.
    RangeFrechetLsh,
}

/// How centroids are recomputed from their clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRule {
    /// Componentwise arithmetic mean (vector datasets).
    MeanVector,
    /// Fréchet mean curve via the complete binary tree (curve datasets).
    MeanCurve,
}

/// Cluster driver configuration.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Number of clusters K.
    pub k: usize,
    pub assignment: Assignment,
    pub update: UpdateRule,
    pub metric: Metric,
    /// Iteration cap; bounds the run when deviations bounce around a minimum.
    pub iter_max: usize,
    /// Convergence threshold for mean-vector updates.
    pub eps_vector: f64,
    /// Convergence threshold for mean-curve updates.
    pub eps_frechet: f64,
    /// Seeds every random stream of the run (seeding, hash families, grid).
    pub seed: u64,
    pub lsh: LshParams,
    pub cube: CubeParams,
    pub grid: GridParams,
}

impl ClusterConfig {
    /// Euclidean Lloyd clustering with default knobs; callers override fields
    /// as needed.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            assignment: Assignment::Lloyd,
            update: UpdateRule::MeanVector,
            metric: Metric::Euclidean,
            iter_max: 12,
            eps_vector: 1.0,
            eps_frechet: 20.0,
            seed: 0,
            lsh: LshParams::default(),
            cube: CubeParams::default(),
            grid: GridParams::default(),
        }
    }
}

/// Result of a finished clustering run.
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    /// Final centroids, same variant as the dataset's items.
    pub centroids: Vec<Item>,
    /// K membership lists of dataset ids.
    pub clusters: Vec<Vec<u32>>,
    /// Iterations executed.
    pub iterations: usize,
    /// Wall time of the run, seeding included.
    pub elapsed: Duration,
    /// Average centroid movement of the last update step.
    pub avg_deviation: f64,
}

/// k-means driver; one instance runs one configuration, possibly many times.
pub struct ClusterDriver {
    config: ClusterConfig,
    centroids: Vec<Item>,
    clusters: Vec<Vec<u32>>,
    iterations: usize,
}

impl ClusterDriver {
    pub fn new(config: ClusterConfig) -> Result<Self> {
        if config.k == 0 {
            return Err(KentroError::InvalidConfig(
                "cluster count must be greater than 0".to_string(),
            ));
        }
        if config.iter_max == 0 {
            return Err(KentroError::InvalidConfig(
                "iteration cap must be greater than 0".to_string(),
            ));
        }
        let curve = config.metric.is_curve_metric();
        let coherent = match config.assignment {
            Assignment::Lloyd => true,
            Assignment::RangeLsh | Assignment::RangeHypercube => !curve,
            Assignment::RangeFrechetLsh => curve,
        } && (curve == matches!(config.update, UpdateRule::MeanCurve));
        if !coherent {
            return Err(KentroError::InvalidConfig(format!(
                "assignment {:?} / update {:?} do not fit metric {:?}",
                config.assignment, config.update, config.metric
            )));
        }
        Ok(Self {
            config,
            centroids: Vec::new(),
            clusters: Vec::new(),
            iterations: 0,
        })
    }

    /// Run seeding, assignment and update to convergence.
    pub fn run(&mut self, dataset: &Dataset) -> Result<ClusterOutcome> {
        let start = Instant::now();
        self.iterations = 0;
        self.clusters = vec![Vec::new(); self.config.k];

        let mut seeding_rng = StdRng::seed_from_u64(self.config.seed);
        self.centroids = seeding::kmeans_pp(
            dataset,
            self.config.k,
            self.config.metric,
            &mut seeding_rng,
        )?;

        // With a single centroid there is nothing to range-grow against;
        // every reverse variant degenerates to Lloyd.
        let assignment = if self.config.k == 1 {
            Assignment::Lloyd
        } else {
            self.config.assignment
        };
        let index_seed = self.config.seed.wrapping_add(1);
        let table_size = (dataset.len() / 16).max(1);

        let mut vector_index: Option<Box<dyn VectorIndex>> = match assignment {
            Assignment::RangeLsh => {
                let dim = dataset.dimension().ok_or_else(|| {
                    KentroError::InvalidConfig("LSH assignment needs a vector dataset".to_string())
                })?;
                Some(Box::new(LshIndex::new(
                    dim,
                    table_size,
                    self.config.lsh.clone(),
                    index_seed,
                )?))
            }
            Assignment::RangeHypercube => {
                let dim = dataset.dimension().ok_or_else(|| {
                    KentroError::InvalidConfig(
                        "hypercube assignment needs a vector dataset".to_string(),
                    )
                })?;
                Some(Box::new(HypercubeIndex::new(
                    dim,
                    self.config.cube.clone(),
                    index_seed,
                )?))
            }
            _ => None,
        };
        if let Some(index) = vector_index.as_deref_mut() {
            for (id, item) in dataset.iter() {
                match item.coords() {
                    Some(coords) => index.insert(id, coords)?,
                    None => unreachable!("vector dataset validated above"),
                }
            }
        }

        let frechet_index: Option<FrechetLshIndex> = match assignment {
            Assignment::RangeFrechetLsh => {
                let mut index = FrechetLshIndex::new(
                    dataset.max_curve_len(),
                    table_size,
                    self.config.grid.clone(),
                    self.config.lsh.clone(),
                    self.config.metric,
                    index_seed,
                )?;
                for (id, item) in dataset.iter() {
                    if let Some(points) = item.points() {
                        index.insert(id, points)?;
                    }
                }
                Some(index)
            }
            _ => None,
        };

        let avg_deviation = loop {
            self.clusters = match assignment {
                Assignment::Lloyd => self.assign_lloyd(dataset)?,
                Assignment::RangeLsh | Assignment::RangeHypercube => {
                    let index = vector_index
                        .as_deref()
                        .ok_or(KentroError::EmptyIndex)?;
                    self.assign_reverse_vector(dataset, index)?
                }
                Assignment::RangeFrechetLsh => {
                    let index = frechet_index.as_ref().ok_or(KentroError::EmptyIndex)?;
                    self.assign_reverse_frechet(dataset, index)?
                }
            };
            self.iterations += 1;

            let deviation = self.update_centroids(dataset)?;
            let eps = match self.config.update {
                UpdateRule::MeanVector => self.config.eps_vector,
                UpdateRule::MeanCurve => self.config.eps_frechet,
            };
            if self.iterations >= self.config.iter_max || deviation < eps {
                break deviation;
            }
        };

        Ok(ClusterOutcome {
            centroids: self.centroids.clone(),
            clusters: self.clusters.clone(),
            iterations: self.iterations,
            elapsed: start.elapsed(),
            avg_deviation,
        })
    }

    /// Index of the exactly nearest centroid; ties go to the lowest index.
    fn nearest_centroid(&self, item: &Item) -> Result<(usize, f64)> {
        let mut best = 0usize;
        let mut best_dist = self.config.metric.distance(item, &self.centroids[0])?;
        for (i, centroid) in self.centroids.iter().enumerate().skip(1) {
            let d = self.config.metric.distance(item, centroid)?;
            if d < best_dist {
                best = i;
                best_dist = d;
            }
        }
        Ok((best, best_dist))
    }

    fn assign_lloyd(&self, dataset: &Dataset) -> Result<Vec<Vec<u32>>> {
        let mut clusters = vec![Vec::new(); self.config.k];
        for (id, item) in dataset.iter() {
            let (best, _) = self.nearest_centroid(item)?;
            clusters[best].push(id);
        }
        Ok(clusters)
    }

    /// Half the minimum pairwise centroid distance, floored.
    fn initial_radius(&self) -> Result<f64> {
        let mut min = f64::INFINITY;
        for i in 0..self.centroids.len() {
            for j in i + 1..self.centroids.len() {
                let d = self
                    .config
                    .metric
                    .distance(&self.centroids[i], &self.centroids[j])?;
                min = min.min(d);
            }
        }
        Ok((min / 2.0).max(MIN_RADIUS))
    }

    fn assign_reverse_vector(
        &self,
        dataset: &Dataset,
        index: &dyn VectorIndex,
    ) -> Result<Vec<Vec<u32>>> {
        let mut claims: HashMap<u32, (f64, usize)> = HashMap::new();
        let mut radius = self.initial_radius()?;
        let mut inner = 0.0;
        loop {
            let mut progress = false;
            for (i, centroid) in self.centroids.iter().enumerate() {
                let coords = centroid.coords().ok_or_else(|| {
                    KentroError::InvalidConfig("vector centroid expected".to_string())
                })?;
                for found in index.range(coords, radius, inner)? {
                    record_claim(&mut claims, found.id, found.distance, i, &mut progress);
                }
            }
            if !progress {
                break;
            }
            inner = radius;
            radius *= 2.0;
        }
        self.materialize(dataset, claims)
    }

    fn assign_reverse_frechet(
        &self,
        dataset: &Dataset,
        index: &FrechetLshIndex,
    ) -> Result<Vec<Vec<u32>>> {
        let mut claims: HashMap<u32, (f64, usize)> = HashMap::new();
        let mut visited: HashSet<u32> = HashSet::new();
        let mut radius = self.initial_radius()?;
        loop {
            let mut progress = false;
            for (i, centroid) in self.centroids.iter().enumerate() {
                let points = centroid.points().ok_or_else(|| {
                    KentroError::InvalidConfig("curve centroid expected".to_string())
                })?;
                for found in index.range_with_set(points, radius, &mut visited)? {
                    record_claim(&mut claims, found.id, found.distance, i, &mut progress);
                }
            }
            if !progress {
                break;
            }
            // The visited set already blocks re-examination, so the radius
            // only grows; there is no inner ring here.
            radius *= 2.0;
        }
        self.materialize(dataset, claims)
    }

    /// Turn claims into clusters; unclaimed items fall back to exact Lloyd.
    fn materialize(
        &self,
        dataset: &Dataset,
        claims: HashMap<u32, (f64, usize)>,
    ) -> Result<Vec<Vec<u32>>> {
        let mut clusters = vec![Vec::new(); self.config.k];
        for (id, item) in dataset.iter() {
            match claims.get(&id) {
                Some(&(_, centroid)) => clusters[centroid].push(id),
                None => {
                    let (best, _) = self.nearest_centroid(item)?;
                    clusters[best].push(id);
                }
            }
        }
        Ok(clusters)
    }

    /// Recompute every centroid from its cluster; returns the average
    /// centroid movement. An empty cluster keeps its centroid and contributes
    /// nothing to the sum.
    fn update_centroids(&mut self, dataset: &Dataset) -> Result<f64> {
        let mut total = 0.0;
        for i in 0..self.config.k {
            let name = self.centroids[i].name().to_string();
            let replacement = match self.config.update {
                UpdateRule::MeanVector => update::mean_vector(dataset, &self.clusters[i])
                    .map(|coords| Item::vector(name, coords)),
                UpdateRule::MeanCurve => {
                    let cap = self
                        .config
                        .grid
                        .max_curve_len
                        .unwrap_or_else(|| dataset.max_curve_len());
                    update::mean_curve(dataset, &self.clusters[i], cap)
                        .map(|points| Item::curve(name, points))
                }
            };
            let Some(replacement) = replacement else {
                continue;
            };
            total += self.config.metric.distance(&replacement, &self.centroids[i])?;
            self.centroids[i].set_from(&replacement);
        }
        Ok(total / self.config.k as f64)
    }
}

/// Record a claim: first finder wins immediately, later finders only on a
/// strictly smaller distance. Only brand-new claims count as progress.
fn record_claim(
    claims: &mut HashMap<u32, (f64, usize)>,
    id: u32,
    distance: f64,
    centroid: usize,
    progress: &mut bool,
) {
    match claims.entry(id) {
        Entry::Vacant(slot) => {
            slot.insert((distance, centroid));
            *progress = true;
        }
        Entry::Occupied(mut slot) => {
            if slot.get().0 > distance {
                slot.insert((distance, centroid));
            }
        }
    }
}
