use std::fs;
use std::path::Path;

use ndarray::Array3;
use tempfile::TempDir;

use atlasprep_ants::{RegisterOptions, RegistrationParams, TransformKind};
use atlasprep_cli::prepare::{prepare_datasets, PrepareConfig};
use atlasprep_core::image::Image;
use atlasprep_core::spatial::{Direction3, Point3, Spacing3};
use atlasprep_io::write_nifti;

fn write_atlas(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("atlas.nii.gz");
    let atlas = Image::new(
        Array3::zeros((4, 4, 4)),
        Point3::new([0.0, 0.0, 0.0]),
        Spacing3::uniform(1.0),
        Direction3::identity(),
    );
    write_nifti(&path, &atlas).unwrap();
    path
}

fn write_oasis1_fixture(root: &Path) {
    let session = root.join("OAS1_0001_MR1");
    let image_dir = session.join("PROCESSED").join("MPRAGE").join("T88_111");
    fs::create_dir_all(&image_dir).unwrap();
    fs::write(
        session.join("OAS1_0001_MR1.txt"),
        "AGE:          74\nM/F:          Female\nCDR:          0\n",
    )
    .unwrap();
    fs::write(
        image_dir.join("OAS1_0001_MR1_mpr_n4_anon_111_t88_masked_gfc.hdr"),
        b"",
    )
    .unwrap();
}

#[test]
fn test_existing_output_skips_registration() {
    let dir = TempDir::new().unwrap();
    let atlas_path = write_atlas(dir.path());

    let oasis1_root = dir.path().join("oasis1");
    fs::create_dir_all(&oasis1_root).unwrap();
    write_oasis1_fixture(&oasis1_root);

    // The storage path for the single record already exists, so the pipeline
    // must finish without ever loading the volume or invoking registration
    // (no ANTs executable is configured here).
    let storage_dir = dir.path().join("prepared");
    fs::create_dir_all(&storage_dir).unwrap();
    fs::write(storage_dir.join("OASIS1_0001.nii.gz"), b"sentinel").unwrap();

    let config = PrepareConfig {
        atlas_path,
        storage_dir: storage_dir.clone(),
        oasis1_root: Some(oasis1_root),
        oasis3_root: None,
        register: RegisterOptions::default(),
    };

    let summary = prepare_datasets(&config).unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.prepared, 0);

    // The existing file is untouched
    let content = fs::read(storage_dir.join("OASIS1_0001.nii.gz")).unwrap();
    assert_eq!(content, b"sentinel");
}

#[test]
fn test_deformable_prepare_is_rejected() {
    let dir = TempDir::new().unwrap();
    let atlas_path = write_atlas(dir.path());

    let config = PrepareConfig {
        atlas_path,
        storage_dir: dir.path().join("prepared"),
        oasis1_root: None,
        oasis3_root: None,
        register: RegisterOptions {
            params: RegistrationParams {
                kind: TransformKind::Deformable,
                ..Default::default()
            },
            ..Default::default()
        },
    };

    let err = prepare_datasets(&config).unwrap_err();
    assert!(err.to_string().contains("rigid or affine"));
}

#[test]
fn test_no_dataset_roots_is_an_error() {
    let dir = TempDir::new().unwrap();
    let atlas_path = write_atlas(dir.path());

    let config = PrepareConfig {
        atlas_path,
        storage_dir: dir.path().join("prepared"),
        oasis1_root: None,
        oasis3_root: None,
        register: RegisterOptions::default(),
    };

    let err = prepare_datasets(&config).unwrap_err();
    assert!(err.to_string().contains("No dataset roots"));
}

#[cfg(unix)]
mod with_stub_ants {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    use atlasprep_core::transform::AffineTransform;
    use atlasprep_io::{read_nifti, write_itk_affine};

    /// A stand-in for `antsRegistration` that emits an identity transform
    /// prepared next to the script, plus the warped moving volume.
    fn stub_bin_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        let identity = AffineTransform::<3>::identity(None);
        write_itk_affine(dir.path().join("identity.mat"), &identity).unwrap();

        let exe = dir.path().join("antsRegistration");
        fs::write(
            &exe,
            "#!/bin/sh\ncp \"$(dirname \"$0\")/identity.mat\" output_0Affine.mat\ncp moving.nii.gz moving_warped.nii.gz\n",
        )
        .unwrap();
        let mut perms = fs::metadata(&exe).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&exe, perms).unwrap();
        dir
    }

    #[test]
    fn test_prepare_runs_end_to_end() {
        let dir = TempDir::new().unwrap();
        let atlas_path = write_atlas(dir.path());

        // One OASIS-3 scan with real voxel data
        let oasis3_root = dir.path().join("oasis3");
        let scan_dir = oasis3_root
            .join("OAS30001_MR_d0100")
            .join("anat1")
            .join("NIFTI");
        fs::create_dir_all(&scan_dir).unwrap();
        let mut data = Array3::<f32>::zeros((4, 4, 4));
        data[[2, 2, 2]] = 1.0;
        let scan = Image::new(
            data,
            Point3::new([0.0, 0.0, 0.0]),
            Spacing3::uniform(1.0),
            Direction3::identity(),
        );
        write_nifti(scan_dir.join("sub-OAS30001_T1w.nii.gz"), &scan).unwrap();

        let bin = stub_bin_dir();
        let storage_dir = dir.path().join("prepared");
        let config = PrepareConfig {
            atlas_path,
            storage_dir: storage_dir.clone(),
            oasis1_root: None,
            oasis3_root: Some(oasis3_root),
            register: RegisterOptions {
                ants_bin_dir: Some(bin.path().to_path_buf()),
                ..Default::default()
            },
        };

        let summary = prepare_datasets(&config).unwrap();
        assert_eq!(summary.prepared, 1);
        assert_eq!(summary.skipped, 0);

        let stored = storage_dir.join("OASIS3_0100-1.nii.gz");
        assert!(stored.is_file());
        let volume = read_nifti(&stored).unwrap();
        assert_eq!(volume.shape(), [4, 4, 4]);
        // Identity transform and matching grids keep the marker in place
        assert!(volume.data()[[2, 2, 2]] > 0.9);

        // A second run skips the stored volume
        let summary = prepare_datasets(&config).unwrap();
        assert_eq!(summary.prepared, 0);
        assert_eq!(summary.skipped, 1);
    }
}
