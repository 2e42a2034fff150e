//! Linear interpolation implementation.
//!
//! This module provides trilinear interpolation for 3-D volumes.

use ndarray::Array3;

use super::trait_::Interpolator;
use crate::spatial::Point3;

/// Linear Interpolator.
///
/// Performs trilinear interpolation between the eight voxels surrounding a
/// continuous index. Indices outside the volume's support yield None.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

impl LinearInterpolator {
    /// Create a new linear interpolator.
    pub fn new() -> Self {
        Self
    }
}

impl Interpolator for LinearInterpolator {
    fn interpolate(&self, data: &Array3<f32>, index: &Point3) -> Option<f32> {
        let dims = data.dim();
        let shape = [dims.0, dims.1, dims.2];

        let mut lower = [0usize; 3];
        let mut upper = [0usize; 3];
        let mut frac = [0.0f64; 3];

        for axis in 0..3 {
            let n = shape[axis];
            let x = index[axis];
            if n == 0 || x < 0.0 || x > (n - 1) as f64 {
                return None;
            }
            // Clamp so that lower+1 stays in range at the upper boundary.
            let x0 = (x.floor() as usize).min(n.saturating_sub(2));
            lower[axis] = x0;
            upper[axis] = (x0 + 1).min(n - 1);
            frac[axis] = x - x0 as f64;
        }

        let mut value = 0.0f64;
        for corner in 0..8usize {
            let mut weight = 1.0f64;
            let mut idx = [0usize; 3];
            for axis in 0..3 {
                if corner & (1 << axis) != 0 {
                    idx[axis] = upper[axis];
                    weight *= frac[axis];
                } else {
                    idx[axis] = lower[axis];
                    weight *= 1.0 - frac[axis];
                }
            }
            if weight != 0.0 {
                value += weight * f64::from(data[[idx[0], idx[1], idx[2]]]);
            }
        }

        Some(value as f32)
    }
}
