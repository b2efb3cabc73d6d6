//! Glue between the core and external I/O layers.
//!
//! Parsers, report formatters and CLIs see the core only through this
//! surface: build an [`Engine`] over a dataset, ask it for neighbors by name,
//! or hand it a [`ClusterConfig`] and read back the outcome. The engine owns
//! the dataset and the one index the chosen algorithm needs.

use crate::cluster::{ClusterConfig, ClusterDriver, ClusterOutcome};
use crate::dataset::{Dataset, Item};
use crate::frechet::{FrechetLshIndex, GridParams};
use crate::hypercube::{CubeParams, HypercubeIndex};
use crate::lsh::{LshIndex, LshParams};
use crate::metrics::Metric;
use crate::neighbors::Neighbor;
use crate::{KentroError, Result};

/// Which distance family a run operates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmTag {
    /// Euclidean vectors.
    Vector,
    /// Curves under the discrete Fréchet distance.
    FrechetDiscrete,
    /// Curves under the continuous Fréchet distance.
    FrechetContinuous,
}

impl AlgorithmTag {
    /// The metric this tag selects.
    pub fn metric(self) -> Metric {
        match self {
            AlgorithmTag::Vector => Metric::Euclidean,
            AlgorithmTag::FrechetDiscrete => Metric::DiscreteFrechet,
            AlgorithmTag::FrechetContinuous => Metric::ContinuousFrechet,
        }
    }
}

enum EngineIndex {
    Lsh(LshIndex),
    Cube(HypercubeIndex),
    Frechet(FrechetLshIndex),
}

/// Owns a dataset plus one query index and answers name-level queries.
pub struct Engine {
    dataset: Dataset,
    index: EngineIndex,
}

impl Engine {
    /// Vector engine backed by the LSH index.
    pub fn vector_lsh(dataset: Dataset, params: LshParams, seed: u64) -> Result<Self> {
        let dim = dataset
            .dimension()
            .ok_or_else(|| KentroError::InvalidConfig("vector dataset required".to_string()))?;
        let table_size = (dataset.len() / 16).max(1);
        let mut index = LshIndex::new(dim, table_size, params, seed)?;
        for (id, item) in dataset.iter() {
            if let Some(coords) = item.coords() {
                index.insert(id, coords)?;
            }
        }
        Ok(Self {
            dataset,
            index: EngineIndex::Lsh(index),
        })
    }

    /// Vector engine backed by the hypercube index.
    pub fn vector_hypercube(dataset: Dataset, params: CubeParams, seed: u64) -> Result<Self> {
        let dim = dataset
            .dimension()
            .ok_or_else(|| KentroError::InvalidConfig("vector dataset required".to_string()))?;
        let mut index = HypercubeIndex::new(dim, params, seed)?;
        for (id, item) in dataset.iter() {
            if let Some(coords) = item.coords() {
                index.insert(id, coords)?;
            }
        }
        Ok(Self {
            dataset,
            index: EngineIndex::Cube(index),
        })
    }

    /// Curve engine backed by the Fréchet LSH wrapper.
    pub fn curves(
        dataset: Dataset,
        tag: AlgorithmTag,
        grid: GridParams,
        lsh: LshParams,
        seed: u64,
    ) -> Result<Self> {
        if tag == AlgorithmTag::Vector {
            return Err(KentroError::InvalidConfig(
                "curve engine needs a Fréchet tag".to_string(),
            ));
        }
        let table_size = (dataset.len() / 16).max(1);
        let mut index = FrechetLshIndex::new(
            dataset.max_curve_len(),
            table_size,
            grid,
            lsh,
            tag.metric(),
            seed,
        )?;
        for (id, item) in dataset.iter() {
            if let Some(points) = item.points() {
                index.insert(id, points)?;
            }
        }
        Ok(Self {
            dataset,
            index: EngineIndex::Frechet(index),
        })
    }

    /// The dataset this engine answers over.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Approximate k nearest neighbors of `query`, as (distance, name) pairs
    /// ascending by distance.
    pub fn knn(&self, query: &Item, n: usize) -> Result<Vec<(f64, &str)>> {
        let found = match (&self.index, query) {
            (EngineIndex::Lsh(index), Item::Vector { coords, .. }) => index.knn(coords, n)?,
            (EngineIndex::Cube(index), Item::Vector { coords, .. }) => index.knn(coords, n)?,
            (EngineIndex::Frechet(index), Item::Curve { points, .. }) => index.knn(points, n)?,
            _ => {
                return Err(KentroError::InvalidConfig(
                    "query variant does not match the engine's index".to_string(),
                ))
            }
        };
        self.named(found)
    }

    /// All items within `radius` of `query`, unordered (distance, name) pairs.
    pub fn range(&self, query: &Item, radius: f64) -> Result<Vec<(f64, &str)>> {
        let found = match (&self.index, query) {
            (EngineIndex::Lsh(index), Item::Vector { coords, .. }) => {
                index.range(coords, radius, 0.0)?
            }
            (EngineIndex::Cube(index), Item::Vector { coords, .. }) => {
                index.range(coords, radius, 0.0)?
            }
            (EngineIndex::Frechet(index), Item::Curve { points, .. }) => {
                index.range(points, radius)?
            }
            _ => {
                return Err(KentroError::InvalidConfig(
                    "query variant does not match the engine's index".to_string(),
                ))
            }
        };
        self.named(found)
    }

    /// Run a clustering over the engine's dataset.
    pub fn cluster(&self, config: ClusterConfig) -> Result<ClusterOutcome> {
        ClusterDriver::new(config)?.run(&self.dataset)
    }

    fn named(&self, found: Vec<Neighbor>) -> Result<Vec<(f64, &str)>> {
        found
            .into_iter()
            .map(|n| {
                self.dataset
                    .get(n.id)
                    .map(|item| (n.distance, item.name()))
                    .ok_or_else(|| {
                        KentroError::InvalidConfig(format!("index returned unknown id {}", n.id))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_engine_answers_by_name() {
        let ds = Dataset::from_vectors(vec![
            ("near".into(), vec![0.1, 0.0]),
            ("far".into(), vec![9.0, 9.0]),
        ])
        .unwrap();
        let params = LshParams {
            tables: 8,
            hashes_per_table: 2,
            window: 64.0,
        };
        let engine = Engine::vector_lsh(ds, params, 42).unwrap();
        let query = Item::vector("q", vec![0.0, 0.0]);
        let found = engine.knn(&query, 1).unwrap();
        assert_eq!(found.first().map(|&(_, name)| name), Some("near"));
    }

    #[test]
    fn mismatched_query_variant_is_rejected() {
        let ds = Dataset::from_vectors(vec![("a".into(), vec![0.0])]).unwrap();
        let engine = Engine::vector_lsh(ds, LshParams::default(), 1).unwrap();
        let query = Item::curve_from_series("q", &[0.0, 1.0]);
        assert!(engine.knn(&query, 1).is_err());
    }

    #[test]
    fn curve_engine_rejects_vector_tag() {
        let ds = Dataset::new(vec![Item::curve_from_series("c", &[0.0, 1.0])]).unwrap();
        assert!(Engine::curves(
            ds,
            AlgorithmTag::Vector,
            GridParams::default(),
            LshParams::default(),
            1,
        )
        .is_err());
    }
}
