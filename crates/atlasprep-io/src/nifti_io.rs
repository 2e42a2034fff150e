use anyhow::{Context, Result};
use nalgebra::SMatrix;
use ndarray::{Array3, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;

use atlasprep_core::image::Image;
use atlasprep_core::spatial::{Direction, Point, Spacing};

/// Read a NIfTI (or Analyze .hdr/.img pair) volume into an [`Image`].
///
/// The voxel-to-physical affine is taken from the sform when present, the
/// qform as a fallback, and plain pixdim scaling as a last resort. The
/// affine is decomposed into origin, spacing and a direction cosine matrix.
///
/// NIfTI stores RAS+ coordinates; physical space in this crate follows the
/// ITK LPS convention so that transform files written by external
/// registration tools apply without conversion. The first two affine rows
/// are negated on load accordingly.
pub fn read_nifti<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("Failed to read NIfTI file {}", path.display()))?;
    let header = obj.header();

    let mut affine = header_affine(header);

    // RAS -> LPS: negate the X and Y rows (rotation and translation parts).
    for col in 0..4 {
        affine[0][col] = -affine[0][col];
        affine[1][col] = -affine[1][col];
    }

    let (origin, spacing, direction) = decompose_affine(&affine);

    // Load voxel data
    let volume = obj.into_volume();
    let dyn_volume = volume
        .into_ndarray::<f32>()
        .context("Failed to convert volume to ndarray")?;

    if dyn_volume.ndim() != 3 {
        anyhow::bail!(
            "Expected 3D NIfTI file, found {} dimensions",
            dyn_volume.ndim()
        );
    }
    let data: Array3<f32> = dyn_volume
        .into_dimensionality::<Ix3>()
        .context("Failed to view volume as 3D")?;

    Ok(Image::new(data, origin, spacing, direction))
}

/// Write an image to a NIfTI file.
///
/// The header carries the image geometry as an sform affine (converted back
/// from LPS to the RAS convention NIfTI expects) and matching pixdim.
pub fn write_nifti<P: AsRef<Path>>(path: P, image: &Image) -> Result<()> {
    use nifti::writer::WriterOptions;

    let path = path.as_ref();

    let mut affine = compose_affine(image);
    // LPS -> RAS for storage.
    for col in 0..4 {
        affine[0][col] = -affine[0][col];
        affine[1][col] = -affine[1][col];
    }

    let mut header = NiftiHeader::default();
    header.pixdim = [
        1.0,
        image.spacing()[0] as f32,
        image.spacing()[1] as f32,
        image.spacing()[2] as f32,
        1.0,
        1.0,
        1.0,
        1.0,
    ];
    header.srow_x = affine[0];
    header.srow_y = affine[1];
    header.srow_z = affine[2];
    header.sform_code = 1;
    header.qform_code = 0;

    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(image.data())
        .map_err(|e| anyhow::anyhow!("Failed to write NIfTI file {}: {}", path.display(), e))?;

    Ok(())
}

/// Voxel-to-physical affine from a NIfTI header, RAS convention, rows of
/// `[[f32; 4]; 4]`.
fn header_affine(header: &NiftiHeader) -> [[f32; 4]; 4] {
    if header.sform_code > 0 {
        [
            header.srow_x,
            header.srow_y,
            header.srow_z,
            [0.0, 0.0, 0.0, 1.0],
        ]
    } else if header.qform_code > 0 {
        // Qform implementation
        // See NIfTI standard
        let b = header.quatern_b;
        let c = header.quatern_c;
        let d = header.quatern_d;
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();

        let qfac = if header.pixdim[0] == 0.0 {
            1.0
        } else {
            header.pixdim[0]
        };

        let r11 = a * a + b * b - c * c - d * d;
        let r12 = 2.0 * b * c - 2.0 * a * d;
        let r13 = 2.0 * b * d + 2.0 * a * c;

        let r21 = 2.0 * b * c + 2.0 * a * d;
        let r22 = a * a + c * c - b * b - d * d;
        let r23 = 2.0 * c * d - 2.0 * a * b;

        let r31 = 2.0 * b * d - 2.0 * a * c;
        let r32 = 2.0 * c * d + 2.0 * a * b;
        let r33 = a * a + d * d - c * c - b * b;

        let dx = header.pixdim[1];
        let dy = header.pixdim[2];
        let dz = header.pixdim[3] * qfac;

        [
            [r11 * dx, r12 * dy, r13 * dz, header.quatern_x],
            [r21 * dx, r22 * dy, r23 * dz, header.quatern_y],
            [r31 * dx, r32 * dy, r33 * dz, header.quatern_z],
            [0.0, 0.0, 0.0, 1.0],
        ]
    } else {
        // Fallback: use pixdim scaling only
        let dx = header.pixdim[1];
        let dy = header.pixdim[2];
        let dz = header.pixdim[3];
        [
            [dx, 0.0, 0.0, 0.0],
            [0.0, dy, 0.0, 0.0],
            [0.0, 0.0, dz, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }
}

/// Decompose a voxel-to-physical affine into origin, spacing and direction.
fn decompose_affine(affine: &[[f32; 4]; 4]) -> (Point<3>, Spacing<3>, Direction<3>) {
    let origin = Point::new([
        affine[0][3] as f64,
        affine[1][3] as f64,
        affine[2][3] as f64,
    ]);

    // Columns of the rotation matrix (scaled by spacing)
    let mut cols = [nalgebra::Vector3::zeros(); 3];
    for (c, col) in cols.iter_mut().enumerate() {
        *col = nalgebra::Vector3::new(
            affine[0][c] as f64,
            affine[1][c] as f64,
            affine[2][c] as f64,
        );
    }

    let norms = [cols[0].norm(), cols[1].norm(), cols[2].norm()];
    let spacing = Spacing::new(norms);

    // Normalize to get direction cosine matrix
    let axes = [
        nalgebra::Vector3::x_axis().into_inner(),
        nalgebra::Vector3::y_axis().into_inner(),
        nalgebra::Vector3::z_axis().into_inner(),
    ];
    let mut normalized = [nalgebra::Vector3::zeros(); 3];
    for c in 0..3 {
        normalized[c] = if norms[c] > 1e-9 {
            cols[c] / norms[c]
        } else {
            axes[c]
        };
    }

    let dir_matrix = SMatrix::<f64, 3, 3>::from_columns(&normalized);
    (origin, spacing, Direction(dir_matrix))
}

/// Voxel-to-physical affine of an image, rows of `[[f32; 4]; 4]`.
fn compose_affine(image: &Image) -> [[f32; 4]; 4] {
    let mut affine = [[0.0f32; 4]; 4];
    for r in 0..3 {
        for c in 0..3 {
            affine[r][c] = (image.direction()[(r, c)] * image.spacing()[c]) as f32;
        }
        affine[r][3] = image.origin()[r] as f32;
    }
    affine[3] = [0.0, 0.0, 0.0, 1.0];
    affine
}
