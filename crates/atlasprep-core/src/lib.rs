pub mod image;
pub mod spatial;
pub mod transform;
pub mod interpolation;
pub mod filter;

pub use image::Image;
pub use spatial::{Point, Vector, Spacing, Direction};
pub use spatial::{Point3, Spacing3, Direction3};
