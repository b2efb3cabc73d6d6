//! Random-projection hypercube index.
//!
//! Every vector is mapped to a vertex of a k-bit hypercube: bit i is the
//! memoized random bit of the i-th p-stable hash value, concatenated MSB
//! first. Queries start at their own vertex and spill outward through
//! vertices of increasing Hamming distance, bounded by two budgets: buckets
//! opened (`probes`) and items examined (`max_candidates`).
//!
//! Within a Hamming shell the visit order is the increasing numeric order of
//! the flip masks, so a probe is fully determined by the query.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::hash::{validate_params, BitSampler, PStableHash};
use crate::metrics::euclidean;
use crate::neighbors::{Neighbor, NeighborHeap};
use crate::traits::VectorIndex;
use crate::{KentroError, Result};

/// Hypercube index parameters.
#[derive(Debug, Clone)]
pub struct CubeParams {
    /// Hypercube dimension k (bucket count is 2^k).
    pub bits: usize,
    /// Window width of the underlying p-stable hashes.
    pub window: f32,
    /// Budget of items examined per query (M).
    pub max_candidates: usize,
    /// Budget of buckets opened per query.
    pub probes: usize,
}

impl Default for CubeParams {
    fn default() -> Self {
        Self {
            bits: 7,
            window: 4.0,
            max_candidates: 2500,
            probes: 16,
        }
    }
}

/// What a probe accumulates into: a bounded heap for kNN, a ring list for
/// range search.
enum ProbeSink {
    Nearest(NeighborHeap),
    Ring {
        results: Vec<Neighbor>,
        radius: f64,
        inner: f64,
    },
}

/// Random-projection hypercube index over dense vectors.
pub struct HypercubeIndex {
    dimension: usize,
    params: CubeParams,
    hashes: Vec<PStableHash>,
    samplers: Vec<BitSampler>,
    buckets: Vec<Vec<u32>>,
    vectors: Vec<f32>,
    ids: Vec<u32>,
}

impl HypercubeIndex {
    /// Create an index; `seed` drives the hash family and every bit sampler.
    pub fn new(dimension: usize, params: CubeParams, seed: u64) -> Result<Self> {
        validate_params(dimension, params.bits, params.window)?;
        if params.bits >= usize::BITS as usize - 1 {
            return Err(KentroError::InvalidConfig(format!(
                "hypercube dimension {} is too large",
                params.bits
            )));
        }
        if params.max_candidates == 0 || params.probes == 0 {
            return Err(KentroError::InvalidConfig(
                "probe budgets must be greater than 0".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let hashes = (0..params.bits)
            .map(|_| PStableHash::new(dimension, params.window, &mut rng))
            .collect();
        // Each bit projector memoizes from its own stream so lookups during
        // queries stay stable.
        let samplers = (0..params.bits)
            .map(|i| BitSampler::new(seed.wrapping_add(1 + i as u64)))
            .collect();

        Ok(Self {
            dimension,
            buckets: vec![Vec::new(); 1usize << params.bits],
            params,
            hashes,
            samplers,
            vectors: Vec::new(),
            ids: Vec::new(),
        })
    }

    /// The vertex a vector lands on: MSB-first concatenation of f(h(x)).
    fn address(&self, vector: &[f32]) -> usize {
        let mut address = 0usize;
        for (hash, sampler) in self.hashes.iter().zip(self.samplers.iter()) {
            address = (address << 1) | sampler.bit(hash.hash(vector)) as usize;
        }
        address
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
        let address = self.address(vector);
        self.buckets[address].push(slot);
        self.vectors.extend_from_slice(vector);
        self.ids.push(id);
        Ok(())
    }

    /// The `n` approximate nearest neighbors, ascending by distance.
    pub fn knn(&self, query: &[f32], n: usize) -> Result<Vec<Neighbor>> {
        self.check_query(query)?;
        let mut sink = ProbeSink::Nearest(NeighborHeap::new(n));
        self.probe(query, &mut sink)?;
        match sink {
            ProbeSink::Nearest(heap) => Ok(heap.into_sorted()),
            ProbeSink::Ring { .. } => unreachable!("probe does not change sink variant"),
        }
    }

    /// All examined entries with true distance in `[inner, radius)`.
    pub fn range(&self, query: &[f32], radius: f64, inner: f64) -> Result<Vec<Neighbor>> {
        self.check_query(query)?;
        let mut sink = ProbeSink::Ring {
            results: Vec::new(),
            radius,
            inner,
        };
        self.probe(query, &mut sink)?;
        match sink {
            ProbeSink::Ring { results, .. } => Ok(results),
            ProbeSink::Nearest(_) => unreachable!("probe does not change sink variant"),
        }
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

    /// Hamming-expanding probe around the query's vertex.
    fn probe(&self, query: &[f32], sink: &mut ProbeSink) -> Result<()> {
        let origin = self.address(query);
        let vertex_count = 1usize << self.params.bits;
        let mut probes_left = self.params.probes;
        let mut items_left = self.params.max_candidates;
        // De-duplication across shells is unnecessary: every vertex has a
        // unique flip mask. A per-query set would only guard against Gosper
        // enumeration bugs.
        'shells: for weight in 0..=self.params.bits {
            let mut mask = if weight == 0 {
                0
            } else {
                (1usize << weight) - 1
            };
            loop {
                self.open_bucket(origin ^ mask, query, sink, &mut items_left)?;
                probes_left -= 1;
                if probes_left == 0 || items_left == 0 {
                    break 'shells;
                }
                if weight == 0 {
                    break;
                }
                mask = next_same_weight(mask);
                if mask >= vertex_count {
                    break;
                }
            }
        }
        Ok(())
    }

    fn open_bucket(
        &self,
        vertex: usize,
        query: &[f32],
        sink: &mut ProbeSink,
        items_left: &mut usize,
    ) -> Result<()> {
        for &slot in &self.buckets[vertex] {
            let distance = euclidean(query, self.vector(slot))?;
            match sink {
                ProbeSink::Nearest(heap) => {
                    heap.push(Neighbor::new(self.ids[slot as usize], distance));
                }
                ProbeSink::Ring {
                    results,
                    radius,
                    inner,
                } => {
                    if distance >= *inner && distance < *radius {
                        results.push(Neighbor::new(self.ids[slot as usize], distance));
                    }
                }
            }
            *items_left -= 1;
            if *items_left == 0 {
                return Ok(());
            }
        }
        Ok(())
    }

    fn vector(&self, slot: u32) -> &[f32] {
        let start = slot as usize * self.dimension;
        &self.vectors[start..start + self.dimension]
    }
}

/// Next larger integer with the same popcount (Gosper's hack).
fn next_same_weight(mask: usize) -> usize {
    let low = mask & mask.wrapping_neg();
    let carry = mask + low;
    carry | (((mask ^ carry) / low) >> 2)
}

impl VectorIndex for HypercubeIndex {
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
