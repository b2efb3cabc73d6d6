//! Randomized hash families for the vector indices.
//!
//! Three primitives, parameterized once at index construction and never
//! changed afterwards:
//!
//! - [`PStableHash`]: the p-stable base hash `h(x) = ⌊(a·x + b)/w⌋` with
//!   `a ~ N(0,1)^d`, which preserves ℓ2 distance in expectation
//! - [`AmplifiedHash`]: the concatenation `g = (h₁, …, h_k)` folded into a
//!   64-bit fingerprint for bucketing and strict equality filtering
//! - [`BitSampler`]: the memoized random map `h-value → {0,1}` used by the
//!   hypercube's bit projector `f ∘ h`
//!
//! # References
//!
//! - Datar, Immorlica, Indyk & Mirrokni (2004): "Locality-sensitive hashing
//!   scheme based on p-stable distributions"

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::Hasher;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use smallvec::SmallVec;

use crate::{KentroError, Result};

/// A single p-stable hash function `h(x) = ⌊(a·x + b)/w⌋`.
#[derive(Debug, Clone)]
pub struct PStableHash {
    a: Vec<f32>,
    b: f32,
    w: f32,
}

impl PStableHash {
    /// Draw a fresh hash function from the caller's RNG stream.
    pub fn new(dimension: usize, window: f32, rng: &mut StdRng) -> Self {
        let a = (0..dimension).map(|_| rng.sample(StandardNormal)).collect();
        let b = rng.random::<f32>() * window;
        Self { a, b, w: window }
    }

    /// Hash a vector to an integer.
    pub fn hash(&self, vector: &[f32]) -> i64 {
        let dot: f32 = self
            .a
            .iter()
            .zip(vector.iter())
            .map(|(&ai, &xi)| ai * xi)
            .sum();
        ((dot + self.b) / self.w).floor() as i64
    }
}

/// Amplified hash `g`: k base hashes folded into one 64-bit fingerprint.
///
/// The fingerprint is stored with every table entry and compared on query, so
/// two vectors only become candidates when their whole k-tuples agree (the
/// strict filtering variant). Bucket placement reduces the fingerprint modulo
/// the table size.
#[derive(Debug, Clone)]
pub struct AmplifiedHash {
    hashes: Vec<PStableHash>,
}

impl AmplifiedHash {
    /// Draw k base hashes from the caller's RNG stream.
    pub fn new(dimension: usize, k: usize, window: f32, rng: &mut StdRng) -> Self {
        let hashes = (0..k)
            .map(|_| PStableHash::new(dimension, window, rng))
            .collect();
        Self { hashes }
    }

    /// 64-bit fingerprint of the k-tuple `(h₁(x), …, h_k(x))`.
    pub fn fingerprint(&self, vector: &[f32]) -> u64 {
        let tuple: SmallVec<[i64; 8]> = self.hashes.iter().map(|h| h.hash(vector)).collect();
        let mut hasher = DefaultHasher::new();
        for value in &tuple {
            hasher.write_i64(*value);
        }
        hasher.finish()
    }
}

/// Memoized random bit map `f: i64 → {0,1}`.
///
/// The first lookup of a value draws a fair coin from the sampler's own RNG
/// stream; later lookups of the same value always return that bit, including
/// during `&self` queries (the memo is interior-mutable, which is fine in the
/// single-threaded core).
#[derive(Debug)]
pub struct BitSampler {
    memo: RefCell<HashMap<i64, u8>>,
    rng: RefCell<StdRng>,
}

impl BitSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            memo: RefCell::new(HashMap::new()),
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// The stable random bit for `value`.
    pub fn bit(&self, value: i64) -> u8 {
        *self
            .memo
            .borrow_mut()
            .entry(value)
            .or_insert_with(|| self.rng.borrow_mut().random::<bool>() as u8)
    }
}

/// Validate shared hash-family parameters.
pub(crate) fn validate_params(dimension: usize, k: usize, window: f32) -> Result<()> {
    if dimension == 0 {
        return Err(KentroError::InvalidConfig(
            "dimension must be greater than 0".to_string(),
        ));
    }
    if k == 0 {
        return Err(KentroError::InvalidConfig(
            "hashes per table must be greater than 0".to_string(),
        ));
    }
    if window <= 0.0 {
        return Err(KentroError::InvalidConfig(
            "hash window must be positive".to_string(),
        ));
    }
    Ok(())
}
