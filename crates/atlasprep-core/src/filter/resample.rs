//! Resample image filter.
//!
//! This module provides ResampleImageFilter which resamples an image
//! into a new coordinate system using a transform and an interpolator.

use ndarray::Array3;

use crate::image::Image;
use crate::interpolation::{Interpolator, LinearInterpolator};
use crate::spatial::{Direction3, Point3, Spacing3, Vector3};
use crate::transform::{IdentityTransform, Transform};

/// Resample image filter.
///
/// Resamples an image by applying a transform to map points from the
/// output image space to the input image space, and then interpolating values.
///
/// The transform maps from Output Physical Space -> Input Physical Space.
/// This is often the forward transform of a registration (Fixed -> Moving).
///
/// # Type Parameters
/// * `T` - The transform type
/// * `I` - The interpolator type
pub struct ResampleImageFilter<T, I>
where
    T: Transform<3>,
    I: Interpolator,
{
    size: [usize; 3],
    origin: Point3,
    spacing: Spacing3,
    direction: Direction3,
    transform: T,
    interpolator: I,
    default_pixel_value: f64,
}

impl<T, I> ResampleImageFilter<T, I>
where
    T: Transform<3>,
    I: Interpolator,
{
    /// Create a new resample filter.
    ///
    /// # Arguments
    /// * `size` - Output image size (voxels)
    /// * `origin` - Output image origin (physical)
    /// * `spacing` - Output image spacing (physical)
    /// * `direction` - Output image direction (matrix)
    /// * `transform` - Transform from output space to input space
    /// * `interpolator` - Interpolator for input image sampling
    pub fn new(
        size: [usize; 3],
        origin: Point3,
        spacing: Spacing3,
        direction: Direction3,
        transform: T,
        interpolator: I,
    ) -> Self {
        Self {
            size,
            origin,
            spacing,
            direction,
            transform,
            interpolator,
            default_pixel_value: 0.0,
        }
    }

    /// Set default pixel value for outside the field of view.
    pub fn with_default_pixel_value(mut self, value: f64) -> Self {
        self.default_pixel_value = value;
        self
    }

    /// Create from a reference image.
    ///
    /// Uses metadata (size, origin, spacing, direction) from the reference image.
    pub fn new_from_reference(reference: &Image, transform: T, interpolator: I) -> Self {
        Self::new(
            reference.shape(),
            *reference.origin(),
            *reference.spacing(),
            *reference.direction(),
            transform,
            interpolator,
        )
    }

    /// Apply filter to an input image.
    pub fn apply(&self, input: &Image) -> Image {
        let [n0, n1, n2] = self.size;

        let output_data = Array3::from_shape_fn((n0, n1, n2), |(i, j, k)| {
            let index = Point3::new([i as f64, j as f64, k as f64]);
            let output_point = self.index_to_physical(&index);
            let input_point = self.transform.transform_point(&output_point);
            let input_index = input.transform_physical_point_to_continuous_index(&input_point);
            self.interpolator
                .interpolate(input.data(), &input_index)
                .unwrap_or(self.default_pixel_value as f32)
        });

        Image::new(output_data, self.origin, self.spacing, self.direction)
    }

    fn index_to_physical(&self, index: &Point3) -> Point3 {
        // point = origin + Direction * (index * spacing)
        let mut scaled = Vector3::zeros();
        for i in 0..3 {
            scaled[i] = index[i] * self.spacing[i];
        }
        self.origin + self.direction * scaled
    }
}

/// Resample an image onto the grid of a reference image.
///
/// When a transform is given it maps reference-space points into the input
/// image's space (the registration output convention); otherwise voxels are
/// sampled at the same physical location.
pub fn resample_to_reference(
    input: &Image,
    reference: &Image,
    transform: Option<&dyn Transform<3>>,
) -> Image {
    let identity = IdentityTransform::new();
    let transform: &dyn Transform<3> = transform.unwrap_or(&identity);
    ResampleImageFilter::new_from_reference(reference, transform, LinearInterpolator::new())
        .apply(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Vector;
    use crate::transform::TranslationTransform;

    fn unit_image(data: Array3<f32>) -> Image {
        Image::new(
            data,
            Point3::new([0.0, 0.0, 0.0]),
            Spacing3::new([1.0, 1.0, 1.0]),
            Direction3::identity(),
        )
    }

    #[test]
    fn test_resample_identity_preserves_values() {
        let mut data = Array3::<f32>::zeros((4, 4, 4));
        data[[2, 1, 3]] = 9.0;
        let image = unit_image(data);

        let result = resample_to_reference(&image, &image, None);

        assert_eq!(result.shape(), [4, 4, 4]);
        assert_eq!(result.data()[[2, 1, 3]], 9.0);
        assert_eq!(result.data()[[0, 0, 0]], 0.0);
    }

    #[test]
    fn test_resample_translation() {
        // A 2x2x2 block at (4..6, 4..6, 4..6) in a 10^3 volume
        let mut data = Array3::<f32>::zeros((10, 10, 10));
        for x in 4..6 {
            for y in 4..6 {
                for z in 4..6 {
                    data[[x, y, z]] = 1.0;
                }
            }
        }
        let image = unit_image(data);

        // The resampling transform maps output points to input points, so an
        // offset of -2 along X moves the block by +2 in the output.
        let transform = TranslationTransform::new(Vector::<3>::new([-2.0, 0.0, 0.0]));
        let result = resample_to_reference(&image, &image, Some(&transform));

        assert!(result.data()[[6, 4, 4]] > 0.9);
        assert!(result.data()[[7, 5, 5]] > 0.9);
        assert!(result.data()[[4, 4, 4]] < 0.1);
    }

    #[test]
    fn test_resample_onto_coarser_grid() {
        let mut data = Array3::<f32>::zeros((8, 8, 8));
        data.fill(2.0);
        let image = unit_image(data);

        let reference = Image::new(
            Array3::zeros((4, 4, 4)),
            Point3::new([0.0, 0.0, 0.0]),
            Spacing3::new([2.0, 2.0, 2.0]),
            Direction3::identity(),
        );

        let result = resample_to_reference(&image, &reference, None);
        assert_eq!(result.shape(), [4, 4, 4]);
        assert_eq!(*result.spacing(), Spacing3::new([2.0, 2.0, 2.0]));
        // Every reference voxel lands inside the input volume
        for v in result.data().iter() {
            assert!((v - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_default_pixel_value_outside_input() {
        let image = unit_image(Array3::zeros((2, 2, 2)));
        let reference = Image::new(
            Array3::zeros((4, 4, 4)),
            Point3::new([-10.0, -10.0, -10.0]),
            Spacing3::new([1.0, 1.0, 1.0]),
            Direction3::identity(),
        );

        let filter = ResampleImageFilter::new_from_reference(
            &reference,
            IdentityTransform::new(),
            LinearInterpolator::new(),
        )
        .with_default_pixel_value(-1.0);
        let result = filter.apply(&image);

        // Entirely outside the input volume
        assert_eq!(result.data()[[0, 0, 0]], -1.0);
    }
}
