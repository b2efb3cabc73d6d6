//! Unified trait for the vector indices.

use crate::neighbors::Neighbor;
use crate::Result;

/// Common query surface of the LSH and hypercube indices.
///
/// The reverse-assignment clustering driver is written against this trait so
/// the same range-growing loop serves both index families.
pub trait VectorIndex {
    /// Add a vector under the caller's id.
    fn insert(&mut self, id: u32, vector: &[f32]) -> Result<()>;

    /// The `n` approximate nearest neighbors, ascending by distance.
    ///
    /// May return fewer than `n`; callers must tolerate short results.
    fn knn(&self, query: &[f32], n: usize) -> Result<Vec<Neighbor>>;

    /// All candidates with true distance in `[inner, radius)`.
    fn range(&self, query: &[f32], radius: f64, inner: f64) -> Result<Vec<Neighbor>>;

    /// Number of inserted vectors.
    fn len(&self) -> usize;

    /// Whether nothing has been inserted yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
