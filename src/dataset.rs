//! Semantic containers: identified items and the read-only dataset.
//!
//! An [`Item`] is either a fixed-dimensional vector or a polygonal curve, each
//! carrying a stable string name. Indices and clusters never hold references to
//! items; they refer to them by the item's position in its [`Dataset`], a `u32`
//! id that stays valid for the dataset's whole lifetime.

use crate::{KentroError, Result};

/// A single point of a polygonal curve.
///
/// `x` is the time axis (implicit `1..=n` for plain series), `y` the value.
/// Planar curves use both coordinates freely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub x: f32,
    pub y: f32,
}

impl CurvePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An immutable, identified point: a d-vector or a polygonal curve.
///
/// Metric kernels dispatch on the variant; mixing variants in one dataset or
/// index is rejected at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Dense vector in Euclidean space.
    Vector { name: String, coords: Vec<f32> },
    /// Polygonal curve in the plane (or a series over implicit time).
    Curve { name: String, points: Vec<CurvePoint> },
}

impl Item {
    /// Build a vector item.
    pub fn vector(name: impl Into<String>, coords: Vec<f32>) -> Self {
        Item::Vector {
            name: name.into(),
            coords,
        }
    }

    /// Build a curve item from explicit planar points.
    pub fn curve(name: impl Into<String>, points: Vec<CurvePoint>) -> Self {
        Item::Curve {
            name: name.into(),
            points,
        }
    }

    /// Build a curve item from a plain series, using implicit time `1..=n`.
    pub fn curve_from_series(name: impl Into<String>, values: &[f32]) -> Self {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &v)| CurvePoint::new((i + 1) as f32, v))
            .collect();
        Item::Curve {
            name: name.into(),
            points,
        }
    }

    /// The item's stable identifier.
    pub fn name(&self) -> &str {
        match self {
            Item::Vector { name, .. } | Item::Curve { name, .. } => name,
        }
    }

    /// Vector coordinates, if this is a vector item.
    pub fn coords(&self) -> Option<&[f32]> {
        match self {
            Item::Vector { coords, .. } => Some(coords),
            Item::Curve { .. } => None,
        }
    }

    /// Curve points, if this is a curve item.
    pub fn points(&self) -> Option<&[CurvePoint]> {
        match self {
            Item::Curve { points, .. } => Some(points),
            Item::Vector { .. } => None,
        }
    }

    /// Overwrite this item wholesale with a copy of `other`.
    ///
    /// Used by the cluster driver, which seeds centroids from dataset items and
    /// replaces them each update step.
    pub fn set_from(&mut self, other: &Item) {
        self.clone_from(other);
    }

    fn is_vector(&self) -> bool {
        matches!(self, Item::Vector { .. })
    }
}

/// An ordered, read-only collection of items.
///
/// Owns its items; everything else (indices, clusters, centroid seeding) works
/// with `u32` ids into it. Construction validates that all items share a
/// variant, and that vector items share a dimension.
#[derive(Debug, Clone)]
pub struct Dataset {
    items: Vec<Item>,
}

impl Dataset {
    /// Build a dataset, validating homogeneity.
    pub fn new(items: Vec<Item>) -> Result<Self> {
        if let Some(first) = items.first() {
            if first.is_vector() {
                let dim = first.coords().map(<[f32]>::len).unwrap_or(0);
                for item in &items {
                    let coords = item.coords().ok_or_else(|| {
                        KentroError::InvalidConfig(
                            "dataset mixes vector and curve items".to_string(),
                        )
                    })?;
                    if coords.len() != dim {
                        return Err(KentroError::DimensionMismatch {
                            left: dim,
                            right: coords.len(),
                        });
                    }
                }
            } else {
                for item in &items {
                    match item.points() {
                        Some(points) if !points.is_empty() => {}
                        Some(_) => {
                            return Err(KentroError::InvalidConfig(
                                "dataset contains an empty curve".to_string(),
                            ))
                        }
                        None => {
                            return Err(KentroError::InvalidConfig(
                                "dataset mixes vector and curve items".to_string(),
                            ))
                        }
                    }
                }
            }
        }
        Ok(Self { items })
    }

    /// Convenience constructor for named vectors.
    pub fn from_vectors(pairs: Vec<(String, Vec<f32>)>) -> Result<Self> {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, coords)| Item::vector(name, coords))
                .collect(),
        )
    }

    /// Convenience constructor for named curves.
    pub fn from_curves(pairs: Vec<(String, Vec<CurvePoint>)>) -> Result<Self> {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, points)| Item::curve(name, points))
                .collect(),
        )
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the dataset holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item at position `id`.
    pub fn get(&self, id: u32) -> Option<&Item> {
        self.items.get(id as usize)
    }

    /// Iterate items with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Item)> {
        self.items.iter().enumerate().map(|(i, it)| (i as u32, it))
    }

    /// Dimension of a vector dataset, `None` for curves or an empty dataset.
    pub fn dimension(&self) -> Option<usize> {
        self.items.first().and_then(Item::coords).map(<[f32]>::len)
    }

    /// Longest curve length in a curve dataset, 0 otherwise.
    pub fn max_curve_len(&self) -> usize {
        self.items
            .iter()
            .filter_map(Item::points)
            .map(<[CurvePoint]>::len)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mixed_variants() {
        let items = vec![
            Item::vector("a", vec![1.0, 2.0]),
            Item::curve_from_series("b", &[1.0, 2.0, 3.0]),
        ];
        assert!(matches!(
            Dataset::new(items),
            Err(KentroError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_ragged_vectors() {
        let items = vec![
            Item::vector("a", vec![1.0, 2.0]),
            Item::vector("b", vec![1.0]),
        ];
        assert!(matches!(
            Dataset::new(items),
            Err(KentroError::DimensionMismatch { left: 2, right: 1 })
        ));
    }

    #[test]
    fn series_get_implicit_time() {
        let item = Item::curve_from_series("s", &[5.0, 6.0]);
        let points = item.points().unwrap();
        assert_eq!(points[0], CurvePoint::new(1.0, 5.0));
        assert_eq!(points[1], CurvePoint::new(2.0, 6.0));
    }

    #[test]
    fn ids_are_positions() {
        let ds = Dataset::from_vectors(vec![
            ("a".into(), vec![0.0]),
            ("b".into(), vec![1.0]),
        ])
        .unwrap();
        assert_eq!(ds.get(1).unwrap().name(), "b");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dimension(), Some(1));
    }
}
