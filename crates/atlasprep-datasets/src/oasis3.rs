//! OASIS-3 dataset adapter.
//!
//! OASIS-3 stores one NIfTI file per anatomical scan under
//! `OAS3<subject>_MR_d<days>/anat<n>/NIFTI/`. The record identifier combines
//! the days-from-entry counter with the anat index, `"<days>-<n>"`.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use atlasprep_core::image::Image;

use crate::{adopt_atlas_frame, Dataset, Result, SubjectRecord};

/// OASIS-3 longitudinal dataset.
pub struct Oasis3 {
    records: Vec<SubjectRecord>,
}

impl Oasis3 {
    /// Scan a dataset root for anatomical NIfTI volumes.
    ///
    /// Files outside the `OAS3*_MR_d*/anat*/NIFTI/*.nii.gz` layout are
    /// ignored, matching the original glob-based discovery.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let mut records = Vec::new();

        for entry in WalkDir::new(root).min_depth(4).max_depth(4) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(id) = scan_id(entry.path(), root) else {
                continue;
            };
            debug!(scan = %id, image = %entry.path().display(), "Discovered OASIS3 scan");

            records.push(SubjectRecord {
                id,
                image_path: entry.path().to_path_buf(),
                demographics: None,
            });
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self { records })
    }
}

impl Dataset for Oasis3 {
    fn prefix(&self) -> &'static str {
        "OASIS3"
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

/// Extract `"<days>-<anat>"` from a path of the form
/// `<root>/OAS3*_MR_d<days>/anat<n>/NIFTI/<file>.nii.gz`.
fn scan_id(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut components = relative
        .components()
        .map(|c| c.as_os_str().to_str().unwrap_or(""));

    let session = components.next()?;
    let anat = components.next()?;
    let nifti = components.next()?;
    let file = components.next()?;

    if nifti != "NIFTI" || !file.ends_with(".nii.gz") {
        return None;
    }

    if !session.starts_with("OAS3") {
        return None;
    }
    let days = session.split("_MR_d").nth(1)?;
    if days.is_empty() || !days.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let anat_index = anat.strip_prefix("anat")?;
    if anat_index.is_empty() || !anat_index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(format!("{days}-{anat_index}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_scan_id_parsing() {
        let root = PathBuf::from("/data/oasis3");
        let path = root.join("OAS30001_MR_d0129/anat1/NIFTI/sub-OAS30001_T1w.nii.gz");
        assert_eq!(scan_id(&path, &root), Some("0129-1".to_string()));
    }

    #[test]
    fn test_scan_id_rejects_other_layouts() {
        let root = PathBuf::from("/data/oasis3");
        // Wrong modality directory
        let path = root.join("OAS30001_MR_d0129/anat1/BIDS/sub.nii.gz");
        assert_eq!(scan_id(&path, &root), None);
        // Not a nifti file
        let path = root.join("OAS30001_MR_d0129/anat1/NIFTI/sub.json");
        assert_eq!(scan_id(&path, &root), None);
        // Not an MR session
        let path = root.join("OAS30001_CT_d0129/anat1/NIFTI/sub.nii.gz");
        assert_eq!(scan_id(&path, &root), None);
        // Not an anat scan
        let path = root.join("OAS30001_MR_d0129/func1/NIFTI/sub.nii.gz");
        assert_eq!(scan_id(&path, &root), None);
    }
}
