//! Error types for kentro.

use thiserror::Error;

/// Errors that can occur during index construction, queries, or clustering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KentroError {
    /// Vector lengths differ at a metric call or an insert.
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// Seeding asked for more centroids than the dataset holds.
    #[error("dataset has {size} items, need at least {needed}")]
    EmptyDataset { size: usize, needed: usize },

    /// Query against an index with no inserts.
    #[error("index is empty")]
    EmptyIndex,

    /// Invalid parameter value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Weighted sampler called with a value outside `(0, total]`.
    #[error("sampler value {x} outside (0, {total}]")]
    SamplerOutOfRange { x: f64, total: f64 },
}

/// Result type alias for kentro operations.
pub type Result<T> = std::result::Result<T, KentroError>;
