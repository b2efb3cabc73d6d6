//! kentro: approximate nearest-neighbor search and k-clustering for vectors
//! and polygonal curves.
//!
//! Two data families share one engine: fixed-dimensional vectors under ℓ2,
//! and polygonal curves (time series) under the discrete or continuous
//! Fréchet distance.
//!
//! - **Hash-based search**: [`lsh`] (p-stable LSH with amplified hashes),
//!   [`hypercube`] (random-projection cube with Hamming-expanding probes),
//!   [`frechet`] (curve search by grid-snapping curves into vector space)
//! - **Clustering**: [`cluster`] (k-means++ seeding, exact Lloyd or
//!   index-accelerated reverse assignment, mean-vector or mean-curve updates
//!   via [`cbtree`])
//! - **Kernels**: [`metrics`] (Euclidean, discrete and continuous Fréchet)
//!
//! # Which Index Should I Use?
//!
//! | Situation | Recommendation |
//! |-----------|----------------|
//! | Vectors, range-heavy workloads | [`lsh::LshIndex`] |
//! | Vectors, tight probe budgets | [`hypercube::HypercubeIndex`] |
//! | Curves / time series | [`frechet::FrechetLshIndex`] |
//! | Small data or exactness required | Lloyd assignment, no index |
//!
//! Queries are approximate: a kNN call may return fewer than k results and a
//! range call may miss items whose hashes never collide with the query's.
//! Growing `tables` buys recall at query cost; growing `window` makes nearby
//! points collide more (and far points too).
//!
//! # Determinism
//!
//! Every randomized component (seeding sampler, hash families, bit samplers,
//! grid shift) draws from its own stream derived from a caller-provided seed,
//! so identical seeds reproduce identical indices and clusterings. The core
//! is single-threaded; nothing here spawns or suspends.

pub mod cbtree;
pub mod cluster;
pub mod dataset;
pub mod evaluation;
pub mod facade;
pub mod frechet;
pub mod hash;
pub mod hypercube;
pub mod lsh;
pub mod metrics;
pub mod neighbors;
pub mod traits;

pub mod error;

// Re-exports
pub use dataset::{CurvePoint, Dataset, Item};
pub use error::{KentroError, Result};
pub use metrics::Metric;
pub use neighbors::Neighbor;
pub use traits::VectorIndex;
