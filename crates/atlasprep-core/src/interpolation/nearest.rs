//! Nearest-neighbor interpolation implementation.

use ndarray::Array3;

use super::trait_::Interpolator;
use crate::spatial::Point3;

/// Nearest-neighbor Interpolator.
///
/// Samples the voxel closest to the continuous index. Useful for label
/// volumes where intensity blending is undesirable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborInterpolator;

impl NearestNeighborInterpolator {
    /// Create a new nearest-neighbor interpolator.
    pub fn new() -> Self {
        Self
    }
}

impl Interpolator for NearestNeighborInterpolator {
    fn interpolate(&self, data: &Array3<f32>, index: &Point3) -> Option<f32> {
        let dims = data.dim();
        let shape = [dims.0, dims.1, dims.2];

        let mut idx = [0usize; 3];
        for axis in 0..3 {
            let n = shape[axis];
            let x = index[axis];
            if n == 0 || x < -0.5 || x >= n as f64 - 0.5 {
                return None;
            }
            idx[axis] = (x.round().max(0.0) as usize).min(n - 1);
        }

        Some(data[[idx[0], idx[1], idx[2]]])
    }
}
