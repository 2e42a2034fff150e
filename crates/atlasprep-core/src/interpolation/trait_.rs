//! Interpolator trait for sampling values at continuous coordinates.
//!
//! This module defines the core Interpolator trait that all interpolation methods must implement.

use ndarray::Array3;

use crate::spatial::Point3;

/// Interpolator trait for sampling values at continuous coordinates.
///
/// Interpolators are used to sample image values at non-integer indices,
/// which is essential for resampling onto a new grid.
pub trait Interpolator {
    /// Sample the volume at a continuous index.
    ///
    /// # Arguments
    /// * `data` - The source volume
    /// * `index` - The continuous index at which to sample
    ///
    /// # Returns
    /// The interpolated value, or None when the index lies outside the
    /// volume's support.
    fn interpolate(&self, data: &Array3<f32>, index: &Point3) -> Option<f32>;
}
