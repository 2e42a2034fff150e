//! Transform trait for spatial coordinate transformations.
//!
//! This module defines the core Transform trait that all spatial transforms must implement.

use crate::spatial::Point;

/// Transform trait for spatial coordinate transformations.
///
/// Maps points from one physical space to another. When used for
/// resampling, the transform maps points of the output space into the
/// input space, which is the ITK convention for registration outputs.
///
/// # Type Parameters
/// * `D` - The spatial dimensionality (2 or 3)
pub trait Transform<const D: usize> {
    /// Apply the transform to a single point.
    fn transform_point(&self, point: &Point<D>) -> Point<D>;

    /// Get the inverse transform (if available).
    ///
    /// Not all transforms are easily invertible, so this returns an Option.
    fn inverse(&self) -> Option<Box<dyn Transform<D>>> {
        None
    }
}

impl<const D: usize, T: Transform<D> + ?Sized> Transform<D> for &T {
    fn transform_point(&self, point: &Point<D>) -> Point<D> {
        (**self).transform_point(point)
    }

    fn inverse(&self) -> Option<Box<dyn Transform<D>>> {
        (**self).inverse()
    }
}
