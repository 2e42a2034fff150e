//! Image type with physical metadata and coordinate transformations.
//!
//! This module provides the Image struct which represents medical volumes
//! with voxel data and physical space metadata (origin, spacing, direction).

use ndarray::Array3;

use crate::spatial::{Direction3, Point3, Spacing3, Vector3};

/// Medical image volume with physical metadata.
///
/// The Image type combines voxel data with physical space metadata that
/// describes how image indices map to physical coordinates.
///
/// # Coordinate Systems
/// * **Index Space**: Discrete voxel indices. Index axis i corresponds to
///   spatial axis i of the on-disk volume; no axis permutation is applied.
/// * **Physical Space**: Continuous coordinates in mm, using the ITK LPS
///   convention so that externally computed transforms apply directly.
///
/// # Examples
/// ```rust
/// use atlasprep_core::Image;
/// use atlasprep_core::spatial::{Point3, Spacing3, Direction3};
/// use ndarray::Array3;
///
/// let data = Array3::<f32>::zeros((10, 10, 10));
/// let origin = Point3::new([0.0, 0.0, 0.0]);
/// let spacing = Spacing3::new([1.0, 1.0, 1.0]);
/// let direction = Direction3::identity();
/// let image = Image::new(data, origin, spacing, direction);
/// assert_eq!(image.shape(), [10, 10, 10]);
/// ```
#[derive(Debug, Clone)]
pub struct Image {
    /// The voxel data.
    data: Array3<f32>,
    /// Physical coordinate of the first voxel (index 0,0,0).
    origin: Point3,
    /// Physical distance between voxels along each axis.
    spacing: Spacing3,
    /// Orientation of the image axes.
    direction: Direction3,
}

impl Image {
    /// Create a new image with the given data and metadata.
    ///
    /// # Arguments
    /// * `data` - The voxel data
    /// * `origin` - Physical coordinate of the first voxel
    /// * `spacing` - Physical distance between voxels along each axis
    /// * `direction` - Orientation matrix of the image axes
    pub fn new(data: Array3<f32>, origin: Point3, spacing: Spacing3, direction: Direction3) -> Self {
        Self {
            data,
            origin,
            spacing,
            direction,
        }
    }

    /// Get the voxel data.
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Consume the image and return the voxel data.
    pub fn into_data(self) -> Array3<f32> {
        self.data
    }

    /// Get the origin (physical coordinate of first voxel).
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Get the spacing (physical distance between voxels).
    pub fn spacing(&self) -> &Spacing3 {
        &self.spacing
    }

    /// Get the direction (orientation matrix).
    pub fn direction(&self) -> &Direction3 {
        &self.direction
    }

    /// Override the origin, leaving voxel data untouched.
    pub fn set_origin(&mut self, origin: Point3) {
        self.origin = origin;
    }

    /// Override the direction matrix, leaving voxel data untouched.
    pub fn set_direction(&mut self, direction: Direction3) {
        self.direction = direction;
    }

    /// Get the image shape as an array.
    pub fn shape(&self) -> [usize; 3] {
        let (a, b, c) = self.data.dim();
        [a, b, c]
    }

    /// Convert a continuous physical point to a continuous index.
    ///
    /// This transformation maps from physical space to index space using:
    /// `index = (Direction^-1 * (point - origin)) / spacing`
    ///
    /// # Arguments
    /// * `point` - A point in physical space
    ///
    /// # Returns
    /// The corresponding continuous index
    pub fn transform_physical_point_to_continuous_index(&self, point: &Point3) -> Point3 {
        let diff = *point - self.origin;
        let inv_dir = self
            .direction
            .try_inverse()
            .expect("Direction matrix must be invertible");
        let rotated = inv_dir * diff;

        let mut index = Point3::origin();
        for i in 0..3 {
            index[i] = rotated[i] / self.spacing[i];
        }
        index
    }

    /// Convert a continuous index to a physical point.
    ///
    /// This transformation maps from index space to physical space using:
    /// `point = origin + Direction * (index * spacing)`
    ///
    /// # Arguments
    /// * `index` - A continuous index
    ///
    /// # Returns
    /// The corresponding physical point
    pub fn transform_continuous_index_to_physical_point(&self, index: &Point3) -> Point3 {
        let mut scaled_index = Vector3::zeros();
        for i in 0..3 {
            scaled_index[i] = index[i] * self.spacing[i];
        }

        let rotated = self.direction * scaled_index;
        self.origin + rotated
    }
}
