//! Affine transform implementation.
//!
//! This module provides an affine transform (linear transformation + translation).

use nalgebra::{SMatrix, SVector};

use super::trait_::Transform;
use crate::spatial::Point;

/// Affine Transform (Linear transformation + Translation).
///
/// Represents a general affine transformation with a fixed center:
/// `T(x) = A(x - c) + t + c`
///
/// where:
/// * A is a D×D matrix (linear transformation: rotation, scale, shear)
/// * t is a D-dimensional translation vector
/// * c is a D-dimensional fixed center of rotation/scaling
///
/// This parameterization matches the ITK `AffineTransform`, so transforms
/// written by external registration tools apply without conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform<const D: usize> {
    matrix: SMatrix<f64, D, D>,
    translation: SVector<f64, D>,
    center: SVector<f64, D>,
}

impl<const D: usize> AffineTransform<D> {
    /// Create a new affine transform.
    ///
    /// # Arguments
    /// * `matrix` - The D×D linear transformation matrix
    /// * `translation` - The translation vector
    /// * `center` - The fixed center of rotation/scaling
    pub fn new(
        matrix: SMatrix<f64, D, D>,
        translation: SVector<f64, D>,
        center: SVector<f64, D>,
    ) -> Self {
        Self {
            matrix,
            translation,
            center,
        }
    }

    /// Create an identity affine transform.
    ///
    /// # Arguments
    /// * `center` - Optional center of rotation. If None, uses the origin.
    pub fn identity(center: Option<SVector<f64, D>>) -> Self {
        Self::new(
            SMatrix::identity(),
            SVector::zeros(),
            center.unwrap_or_else(SVector::zeros),
        )
    }

    /// Get the transformation matrix.
    pub fn matrix(&self) -> &SMatrix<f64, D, D> {
        &self.matrix
    }

    /// Get the translation vector.
    pub fn translation(&self) -> &SVector<f64, D> {
        &self.translation
    }

    /// Get the fixed center.
    pub fn center(&self) -> &SVector<f64, D> {
        &self.center
    }

    /// Flatten matrix and translation into the ITK parameter layout:
    /// the matrix in row-major order followed by the translation.
    pub fn parameters(&self) -> Vec<f64> {
        let mut params = Vec::with_capacity(D * D + D);
        for r in 0..D {
            for c in 0..D {
                params.push(self.matrix[(r, c)]);
            }
        }
        for i in 0..D {
            params.push(self.translation[i]);
        }
        params
    }

    /// The fixed parameters (the center), ITK layout.
    pub fn fixed_parameters(&self) -> Vec<f64> {
        (0..D).map(|i| self.center[i]).collect()
    }

    /// Build a transform from ITK parameter layout.
    ///
    /// # Arguments
    /// * `parameters` - D*D matrix entries (row-major) followed by D translation entries
    /// * `fixed` - D center entries
    pub fn from_parameters(parameters: &[f64], fixed: &[f64]) -> Option<Self> {
        if parameters.len() != D * D + D || fixed.len() != D {
            return None;
        }
        let matrix = SMatrix::<f64, D, D>::from_row_slice(&parameters[..D * D]);
        let translation = SVector::<f64, D>::from_row_slice(&parameters[D * D..]);
        let center = SVector::<f64, D>::from_row_slice(fixed);
        Some(Self::new(matrix, translation, center))
    }
}

impl<const D: usize> Transform<D> for AffineTransform<D> {
    fn transform_point(&self, point: &Point<D>) -> Point<D> {
        // T(x) = A(x - c) + t + c
        let x = point.0.coords;
        let mapped = self.matrix * (x - self.center) + self.translation + self.center;
        Point(nalgebra::Point::from(mapped))
    }

    fn inverse(&self) -> Option<Box<dyn Transform<D>>> {
        // y = A(x - c) + t + c  =>  x = A^-1 (y - c) - A^-1 t + c
        let inv_matrix = self.matrix.try_inverse()?;
        let inv_translation = -(inv_matrix * self.translation);
        Some(Box::new(AffineTransform::new(
            inv_matrix,
            inv_translation,
            self.center,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Point3;

    #[test]
    fn test_identity_maps_points_to_themselves() {
        let t = AffineTransform::<3>::identity(None);
        let p = Point3::new([1.0, 2.0, 3.0]);
        assert_eq!(t.transform_point(&p), p);
    }

    #[test]
    fn test_scaling_about_center() {
        let t = AffineTransform::<3>::new(
            SMatrix::<f64, 3, 3>::identity() * 2.0,
            SVector::zeros(),
            SVector::from_row_slice(&[1.0, 1.0, 1.0]),
        );
        // The center is a fixed point
        let c = Point3::new([1.0, 1.0, 1.0]);
        assert_eq!(t.transform_point(&c), c);
        // Other points scale away from the center
        let p = t.transform_point(&Point3::new([2.0, 1.0, 1.0]));
        assert_eq!(p.to_vec(), vec![3.0, 1.0, 1.0]);
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = AffineTransform::<3>::new(
            SMatrix::<f64, 3, 3>::from_row_slice(&[
                0.9, 0.1, 0.0, //
                -0.1, 1.1, 0.0, //
                0.0, 0.0, 1.05,
            ]),
            SVector::from_row_slice(&[5.0, -3.0, 2.0]),
            SVector::from_row_slice(&[10.0, 10.0, 10.0]),
        );
        let inv = t.inverse().unwrap();
        let p = Point3::new([4.0, -2.0, 7.0]);
        let back = inv.transform_point(&t.transform_point(&p));
        for i in 0..3 {
            assert!((back[i] - p[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_parameter_round_trip() {
        let t = AffineTransform::<3>::new(
            SMatrix::<f64, 3, 3>::from_row_slice(&[
                1.0, 0.0, 0.1, //
                0.0, 1.0, 0.0, //
                0.2, 0.0, 1.0,
            ]),
            SVector::from_row_slice(&[1.0, 2.0, 3.0]),
            SVector::from_row_slice(&[0.5, 0.5, 0.5]),
        );
        let rebuilt =
            AffineTransform::<3>::from_parameters(&t.parameters(), &t.fixed_parameters()).unwrap();
        assert_eq!(t, rebuilt);
    }

    #[test]
    fn test_from_parameters_rejects_wrong_lengths() {
        assert!(AffineTransform::<3>::from_parameters(&[0.0; 11], &[0.0; 3]).is_none());
        assert!(AffineTransform::<3>::from_parameters(&[0.0; 12], &[0.0; 2]).is_none());
    }
}
