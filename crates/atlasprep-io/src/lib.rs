pub mod nifti_io;
pub mod transform_io;

pub use nifti_io::{read_nifti, write_nifti};
pub use transform_io::{read_itk_affine, write_itk_affine};
