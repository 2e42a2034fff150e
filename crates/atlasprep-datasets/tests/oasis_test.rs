use std::fs;
use std::path::Path;

use atlasprep_datasets::{Dataset, DatasetError, Gender, Oasis1, Oasis3};
use tempfile::tempdir;

fn write_oasis1_session(root: &Path, id: &str, sidecar: &str) {
    let session = root.join(format!("OAS1_{id}_MR1"));
    let image_dir = session.join("PROCESSED").join("MPRAGE").join("T88_111");
    fs::create_dir_all(&image_dir).unwrap();
    fs::write(session.join(format!("OAS1_{id}_MR1.txt")), sidecar).unwrap();
    fs::write(
        image_dir.join(format!(
            "OAS1_{id}_MR1_mpr_n4_anon_111_t88_masked_gfc.hdr"
        )),
        b"",
    )
    .unwrap();
}

#[test]
fn test_oasis1_enumeration_and_demographics() {
    let dir = tempdir().unwrap();

    write_oasis1_session(
        dir.path(),
        "0002",
        "SESSION ID:   OAS1_0002_MR1\nAGE:          55\nM/F:          Male\nCDR:          0.5\n",
    );
    write_oasis1_session(
        dir.path(),
        "0001",
        "SESSION ID:   OAS1_0001_MR1\nAGE:          74\nM/F:          Female\n",
    );
    // Unrelated directory is ignored
    fs::create_dir_all(dir.path().join("scratch")).unwrap();

    let dataset = Oasis1::open(dir.path()).unwrap();
    assert_eq!(dataset.prefix(), "OASIS1");

    let records = dataset.records();
    assert_eq!(records.len(), 2);
    // Sorted by identifier
    assert_eq!(records[0].id, "0001");
    assert_eq!(records[1].id, "0002");

    let demo = records[0].demographics.as_ref().unwrap();
    assert_eq!(demo.age, 74);
    assert_eq!(demo.gender, Gender::Female);
    // CDR absent defaults to 0.0
    assert_eq!(demo.cdr, 0.0);

    let demo = records[1].demographics.as_ref().unwrap();
    assert_eq!(demo.age, 55);
    assert_eq!(demo.gender, Gender::Male);
    assert_eq!(demo.cdr, 0.5);

    assert!(records[0]
        .image_path
        .to_string_lossy()
        .ends_with("_anon_111_t88_masked_gfc.hdr"));
}

#[test]
fn test_oasis1_missing_sidecar_is_an_error() {
    let dir = tempdir().unwrap();
    let session = dir.path().join("OAS1_0003_MR1");
    fs::create_dir_all(&session).unwrap();

    let err = Oasis1::open(dir.path()).unwrap_err();
    assert!(matches!(err, DatasetError::Sidecar { .. }));
}

#[test]
fn test_oasis1_malformed_age_is_an_error() {
    let dir = tempdir().unwrap();
    write_oasis1_session(
        dir.path(),
        "0004",
        "SESSION ID:   OAS1_0004_MR1\nM/F:          Female\n",
    );

    let err = Oasis1::open(dir.path()).unwrap_err();
    match err {
        DatasetError::MalformedSidecar { field, .. } => assert_eq!(field, "AGE"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_oasis1_missing_volume_is_an_error() {
    let dir = tempdir().unwrap();
    let session = dir.path().join("OAS1_0005_MR1");
    fs::create_dir_all(&session).unwrap();
    fs::write(
        session.join("OAS1_0005_MR1.txt"),
        "AGE:  60\nM/F:  Male\n",
    )
    .unwrap();

    let err = Oasis1::open(dir.path()).unwrap_err();
    match err {
        DatasetError::NoImage { subject } => assert_eq!(subject, "0005"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_oasis3_enumeration() {
    let dir = tempdir().unwrap();

    let scan = dir
        .path()
        .join("OAS30001_MR_d0129")
        .join("anat1")
        .join("NIFTI");
    fs::create_dir_all(&scan).unwrap();
    fs::write(scan.join("sub-OAS30001_T1w.nii.gz"), b"").unwrap();

    let scan = dir
        .path()
        .join("OAS30002_MR_d0042")
        .join("anat2")
        .join("NIFTI");
    fs::create_dir_all(&scan).unwrap();
    fs::write(scan.join("sub-OAS30002_T1w.nii.gz"), b"").unwrap();

    // A non-anatomical scan directory is ignored
    let func = dir
        .path()
        .join("OAS30002_MR_d0042")
        .join("func1")
        .join("NIFTI");
    fs::create_dir_all(&func).unwrap();
    fs::write(func.join("sub-OAS30002_bold.nii.gz"), b"").unwrap();

    let dataset = Oasis3::open(dir.path()).unwrap();
    assert_eq!(dataset.prefix(), "OASIS3");

    let records = dataset.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "0042-2");
    assert_eq!(records[1].id, "0129-1");
    assert!(records[0].demographics.is_none());
}

#[test]
fn test_oasis3_empty_root_yields_no_records() {
    let dir = tempdir().unwrap();
    let dataset = Oasis3::open(dir.path()).unwrap();
    assert!(dataset.records().is_empty());
}
