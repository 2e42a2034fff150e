//! Point type for representing spatial coordinates.
//!
//! Points represent positions in physical space.

use nalgebra::Point as NaPoint;
use serde::{Deserialize, Serialize};

use super::Vector;

/// A point in D-dimensional space.
///
/// Points represent positions in physical coordinate systems.
/// Used for image origins, physical coordinates, and spatial transformations.
///
/// This is a thin wrapper around nalgebra's Point to provide
/// domain-specific functionality while maintaining all nalgebra operations.
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

    /// Convert the point to a vector of coordinates.
    pub fn to_vec(&self) -> Vec<f64> {
        (0..D).map(|i| self.0[i]).collect()
    }

    /// Get the inner nalgebra point.
    pub fn inner(&self) -> &NaPoint<f64, D> {
        &self.0
    }
}

impl<const D: usize> std::ops::Index<usize> for Point<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Point<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const D: usize> std::ops::Sub for Point<D> {
    type Output = Vector<D>;

    fn sub(self, other: Self) -> Self::Output {
        Vector(self.0 - other.0)
    }
}

impl<const D: usize> std::ops::Add<Vector<D>> for Point<D> {
    type Output = Self;

    fn add(self, displacement: Vector<D>) -> Self::Output {
        Self(self.0 + displacement.0)
    }
}

impl<const D: usize> std::ops::Sub<Vector<D>> for Point<D> {
    type Output = Self;

    fn sub(self, displacement: Vector<D>) -> Self::Output {
        Self(self.0 - displacement.0)
    }
}

impl<const D: usize> std::fmt::Display for Point<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_creation() {
        let p = Point::<3>::new([1.0, 2.0, 3.0]);
        assert_eq!(p[0], 1.0);
        assert_eq!(p[1], 2.0);
        assert_eq!(p[2], 3.0);
    }

    #[test]
    fn test_point_difference_is_vector() {
        let a = Point::<3>::new([4.0, 4.0, 4.0]);
        let b = Point::<3>::new([1.0, 2.0, 3.0]);
        let v = a - b;
        assert_eq!(v[0], 3.0);
        assert_eq!(v[1], 2.0);
        assert_eq!(v[2], 1.0);
    }

    #[test]
    fn test_point_plus_vector() {
        let p = Point::<3>::origin() + Vector::<3>::new([1.0, 0.0, -1.0]);
        assert_eq!(p[0], 1.0);
        assert_eq!(p[2], -1.0);
    }
}
