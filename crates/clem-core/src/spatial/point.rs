//! Point type for representing physical coordinates.

use nalgebra::Point as NaPoint;
use serde::{Deserialize, Serialize};
use super::Vector;

/// A point in D-dimensional physical space.
///
/// Used for image origins, rotation centres and resampling coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point<const D: usize>(pub NaPoint<f64, D>);

impl<const D: usize> Point<D> {
    /// Create a new point from coordinates.
    pub fn new(coords: [f64; D]) -> Self {
        Self(NaPoint::from(coords))
    }

    /// Create a point at the origin (all coordinates zero).
    pub fn origin() -> Self {
        Self(NaPoint::origin())
    }

    /// Create a point from a slice, returning `None` on length mismatch.
    pub fn try_from_slice(coords: &[f64]) -> Option<Self> {
        if coords.len() != D {
            return None;
        }
        let mut point = Self::origin();
        for (i, &c) in coords.iter().enumerate() {
            point.0.coords[i] = c;
        }
        Some(point)
    }

    /// Convert point to a vector of coordinates.
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.coords.iter().copied().collect()
    }

    /// Position vector of this point relative to the origin.
    pub fn coords(&self) -> Vector<D> {
        Vector(self.0.coords)
    }
}

impl<const D: usize> std::ops::Index<usize> for Point<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0.coords[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Point<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0.coords[index]
    }
}

impl<const D: usize> std::ops::Sub for Point<D> {
    type Output = Vector<D>;

    fn sub(self, other: Self) -> Self::Output {
        Vector(self.0.coords - other.0.coords)
    }
}

impl<const D: usize> std::ops::Add<Vector<D>> for Point<D> {
    type Output = Self;

    fn add(self, vector: Vector<D>) -> Self::Output {
        Self(self.0 + vector.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Point2 = Point<2>;
    type Vector2 = Vector<2>;

    #[test]
    fn test_point_creation() {
        let p = Point2::new([1.0, 2.0]);
        assert_eq!(p[0], 1.0);
        assert_eq!(p[1], 2.0);
    }

    #[test]
    fn test_point_from_slice() {
        assert_eq!(Point2::try_from_slice(&[3.0, 4.0]), Some(Point2::new([3.0, 4.0])));
        assert_eq!(Point2::try_from_slice(&[3.0]), None);
    }

    #[test]
    fn test_point_vector_arithmetic() {
        let p1 = Point2::new([5.0, 5.0]);
        let p2 = Point2::new([2.0, 3.0]);
        assert_eq!(p1 - p2, Vector2::new([3.0, 2.0]));
        assert_eq!(p2 + Vector2::new([1.0, 1.0]), Point2::new([3.0, 4.0]));
    }
}
