//! Spatial types for physical coordinates, spacings and orientations.

pub mod point;
pub mod vector;
pub mod spacing;
pub mod direction;

pub use point::Point;
pub use vector::Vector;
pub use spacing::Spacing;
pub use direction::Direction;

/// A point in 3-D physical space.
pub type Point3 = Point<3>;
/// A displacement in 3-D physical space.
pub type Vector3 = Vector<3>;
/// Voxel spacing of a 3-D image.
pub type Spacing3 = Spacing<3>;
/// Orientation matrix of a 3-D image.
pub type Direction3 = Direction<3>;
