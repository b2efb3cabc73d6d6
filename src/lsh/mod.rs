//! Locality-sensitive hashing index for dense vectors under ℓ2.
//!
//! L independent hash tables, each bucketing by an amplified p-stable hash
//! `g = (h₁, …, h_k)`. Queries visit one bucket per table, filter entries by
//! the stored 64-bit fingerprint, score survivors with the true Euclidean
//! distance, and aggregate across tables.
//!
//! # References
//!
//! - Indyk & Motwani (1998): "Approximate nearest neighbors: towards removing
//!   the curse of dimensionality"

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::hash::{validate_params, AmplifiedHash};
use crate::metrics::euclidean;
use crate::neighbors::{Neighbor, NeighborHeap};
use crate::traits::VectorIndex;
use crate::{KentroError, Result};

/// LSH index parameters.
#[derive(Debug, Clone)]
pub struct LshParams {
    /// Number of hash tables (L).
    pub tables: usize,
    /// Base hashes per amplified hash (k).
    pub hashes_per_table: usize,
    /// Window width of the p-stable hashes (w).
    pub window: f32,
}

impl Default for LshParams {
    fn default() -> Self {
        Self {
            tables: 5,
            hashes_per_table: 4,
            window: 4.0,
        }
    }
}

/// One table entry: fingerprint of the amplified hash plus the storage slot.
type Entry = (u64, u32);

/// LSH index over dense vectors.
pub struct LshIndex {
    dimension: usize,
    table_size: usize,
    families: Vec<AmplifiedHash>,
    tables: Vec<Vec<Vec<Entry>>>,
    vectors: Vec<f32>,
    ids: Vec<u32>,
}

impl LshIndex {
    /// Create an index with `table_size` buckets per table.
    ///
    /// Callers size the tables as `max(1, N/16)` for an expected N inserts;
    /// the cluster driver does exactly that. `seed` drives every hash family
    /// of this index deterministically.
    pub fn new(dimension: usize, table_size: usize, params: LshParams, seed: u64) -> Result<Self> {
        validate_params(dimension, params.hashes_per_table, params.window)?;
        if params.tables == 0 {
            return Err(KentroError::InvalidConfig(
                "table count must be greater than 0".to_string(),
            ));
        }
        if table_size == 0 {
            return Err(KentroError::InvalidConfig(
                "table size must be greater than 0".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let families = (0..params.tables)
            .map(|_| {
                AmplifiedHash::new(
                    dimension,
                    params.hashes_per_table,
                    params.window,
                    &mut rng,
                )
            })
            .collect();

        Ok(Self {
            dimension,
            table_size,
            families,
            tables: vec![vec![Vec::new(); table_size]; params.tables],
            vectors: Vec::new(),
            ids: Vec::new(),
        })
    }

    /// Add a vector under the caller's id.
    pub fn insert(&mut self, id: u32, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(KentroError::DimensionMismatch {
                left: self.dimension,
                right: vector.len(),
            });
        }
        let slot = self.ids.len() as u32;
        for (family, table) in self.families.iter().zip(self.tables.iter_mut()) {
            let fingerprint = family.fingerprint(vector);
            let bucket = (fingerprint % self.table_size as u64) as usize;
            table[bucket].push((fingerprint, slot));
        }
        self.vectors.extend_from_slice(vector);
        self.ids.push(id);
        Ok(())
    }

    /// The `n` approximate nearest neighbors, ascending by distance.
    pub fn knn(&self, query: &[f32], n: usize) -> Result<Vec<Neighbor>> {
        self.check_query(query)?;
        let mut heap = NeighborHeap::new(n);
        let mut seen: HashSet<u32> = HashSet::new();
        self.visit_matching(query, |slot, this| {
            if seen.insert(slot) {
                let distance = euclidean(query, this.vector(slot))?;
                heap.push(Neighbor::new(this.ids[slot as usize], distance));
            }
            Ok(())
        })?;
        Ok(heap.into_sorted())
    }

    /// All entries with true distance in `[inner, radius)`, deduplicated.
    pub fn range(&self, query: &[f32], radius: f64, inner: f64) -> Result<Vec<Neighbor>> {
        self.check_query(query)?;
        let mut results = Vec::new();
        let mut seen: HashSet<u32> = HashSet::new();
        self.visit_matching(query, |slot, this| {
            if seen.insert(slot) {
                let distance = euclidean(query, this.vector(slot))?;
                if distance >= inner && distance < radius {
                    results.push(Neighbor::new(this.ids[slot as usize], distance));
                }
            }
            Ok(())
        })?;
        Ok(results)
    }

    /// Fingerprint-filtered candidate ids, excluding anything in `visited`.
    ///
    /// No distances are computed; the Fréchet wrapper scores candidates itself
    /// with the curve metric.
    pub fn candidates(&self, query: &[f32], visited: &HashSet<u32>) -> Result<Vec<u32>> {
        self.check_query(query)?;
        let mut out = Vec::new();
        let mut seen: HashSet<u32> = HashSet::new();
        self.visit_matching(query, |slot, this| {
            let id = this.ids[slot as usize];
            if !visited.contains(&id) && seen.insert(slot) {
                out.push(id);
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// Number of inserted vectors.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing has been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn check_query(&self, query: &[f32]) -> Result<()> {
        if self.ids.is_empty() {
            return Err(KentroError::EmptyIndex);
        }
        if query.len() != self.dimension {
            return Err(KentroError::DimensionMismatch {
                left: self.dimension,
                right: query.len(),
            });
        }
        Ok(())
    }

    /// Walk the query's bucket in every table, calling `visit` for each entry
    /// whose stored fingerprint matches the query's.
    fn visit_matching<F>(&self, query: &[f32], mut visit: F) -> Result<()>
    where
        F: FnMut(u32, &Self) -> Result<()>,
    {
        for (family, table) in self.families.iter().zip(self.tables.iter()) {
            let fingerprint = family.fingerprint(query);
            let bucket = (fingerprint % self.table_size as u64) as usize;
            for &(entry_fp, slot) in &table[bucket] {
                if entry_fp == fingerprint {
                    visit(slot, self)?;
                }
            }
        }
        Ok(())
    }

    fn vector(&self, slot: u32) -> &[f32] {
        let start = slot as usize * self.dimension;
        &self.vectors[start..start + self.dimension]
    }
}

impl VectorIndex for LshIndex {
    fn insert(&mut self, id: u32, vector: &[f32]) -> Result<()> {
        self.insert(id, vector)
    }

    fn knn(&self, query: &[f32], n: usize) -> Result<Vec<Neighbor>> {
        self.knn(query, n)
    }

    fn range(&self, query: &[f32], radius: f64, inner: f64) -> Result<Vec<Neighbor>> {
        self.range(query, radius, inner)
    }

    fn len(&self) -> usize {
        self.len()
    }
}
