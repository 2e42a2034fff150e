//! OASIS-1 dataset adapter.
//!
//! OASIS-1 lays out one directory per session, `OAS1_<id>_MR1`, holding a
//! plain-text sidecar with demographics and the gain-field-corrected,
//! atlas-space masked T1 average under `PROCESSED/MPRAGE/T88_111/`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use atlasprep_core::image::Image;

use crate::{
    adopt_atlas_frame, Dataset, DatasetError, Demographics, Gender, Result, SubjectRecord,
};

const IMAGE_SUBDIR: &[&str] = &["PROCESSED", "MPRAGE", "T88_111"];
const IMAGE_SUFFIX: &str = "_anon_111_t88_masked_gfc.hdr";

/// OASIS-1 cross-sectional dataset.
#[derive(Debug)]
pub struct Oasis1 {
    records: Vec<SubjectRecord>,
}

impl Oasis1 {
    /// Scan a dataset root for `OAS1_<id>_MR1` session directories.
    ///
    /// Directories that do not match the session naming scheme are ignored;
    /// matching directories with missing sidecars or volumes are errors.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let mut records = Vec::new();

        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(id) = session_id(name) else {
                continue;
            };

            let session_dir = entry.path();
            let demographics = read_sidecar(&session_dir, &id)?;
            let image_path = find_image(&session_dir, &id)?;
            debug!(subject = %id, image = %image_path.display(), "Discovered OASIS1 session");

            records.push(SubjectRecord {
                id,
                image_path,
                demographics: Some(demographics),
            });
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self { records })
    }
}

impl Dataset for Oasis1 {
    fn prefix(&self) -> &'static str {
        "OASIS1"
    }

    fn records(&self) -> &[SubjectRecord] {
        &self.records
    }

    fn load_volume(&self, record: &SubjectRecord) -> Result<Image> {
        Ok(atlasprep_io::read_nifti(&record.image_path)?)
    }

    fn align_to_atlas(&self, volume: Image, atlas: &Image) -> Image {
        adopt_atlas_frame(volume, atlas)
    }
}

/// Extract the numeric id from a session directory name `OAS1_<id>_MR1`.
fn session_id(name: &str) -> Option<String> {
    let id = name.strip_prefix("OAS1_")?.strip_suffix("_MR1")?;
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

/// Parse the demographics sidecar `OAS1_<id>_MR1.txt`.
fn read_sidecar(session_dir: &Path, id: &str) -> Result<Demographics> {
    let path = session_dir.join(format!("OAS1_{id}_MR1.txt"));
    let text = fs::read_to_string(&path).map_err(|source| DatasetError::Sidecar {
        path: path.clone(),
        source,
    })?;

    let age = field(&text, "AGE:")
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| DatasetError::MalformedSidecar {
            path: path.clone(),
            field: "AGE",
        })?;

    let gender = match field(&text, "M/F:").as_deref() {
        Some("Female") => Gender::Female,
        Some("Male") => Gender::Male,
        _ => {
            return Err(DatasetError::MalformedSidecar {
                path,
                field: "M/F",
            })
        }
    };

    // CDR is absent for many healthy subjects; treat anything unparseable
    // the same way.
    let cdr = field(&text, "CDR:")
        .and_then(|v| v.parse::<f32>().ok())
        .unwrap_or(0.0);

    Ok(Demographics { age, gender, cdr })
}

/// First `LABEL: value` occurrence in the sidecar text.
fn field(text: &str, label: &str) -> Option<String> {
    text.lines().find_map(|line| {
        line.trim()
            .strip_prefix(label)
            .map(|rest| rest.trim().to_string())
    })
}

/// Locate the masked, gain-field-corrected atlas-space volume.
fn find_image(session_dir: &Path, id: &str) -> Result<PathBuf> {
    let image_dir = IMAGE_SUBDIR
        .iter()
        .fold(session_dir.to_path_buf(), |p, part| p.join(part));

    let mut candidates: Vec<PathBuf> = Vec::new();
    let entries = fs::read_dir(&image_dir).map_err(|_| DatasetError::NoImage {
        subject: id.to_string(),
    })?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with("OAS1_") && name.contains("_mpr_n") && name.ends_with(IMAGE_SUFFIX) {
            candidates.push(entry.path());
        }
    }

    candidates.sort();
    candidates.into_iter().next().ok_or(DatasetError::NoImage {
        subject: id.to_string(),
    })
}
