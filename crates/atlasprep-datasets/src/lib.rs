//! Dataset adapters for the preparation pipeline.
//!
//! Each adapter scans a dataset root once at construction time, parses
//! subject identifiers (and demographics where the dataset provides them)
//! out of the on-disk layout, and exposes an ordered, immutable list of
//! records. Volume loading and the dataset-specific atlas alignment hook
//! are the only operations performed after construction.

use std::path::PathBuf;

use thiserror::Error;

use atlasprep_core::image::Image;

pub mod oasis1;
pub mod oasis3;

pub use oasis1::Oasis1;
pub use oasis3::Oasis3;

/// Error type for dataset scanning and loading.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Filesystem error while scanning a dataset root.
    #[error("I/O error while scanning dataset")]
    Io(#[from] std::io::Error),

    /// Filesystem error during a recursive walk.
    #[error("I/O error while walking dataset tree")]
    Walk(#[from] walkdir::Error),

    /// A subject directory has no readable sidecar file.
    #[error("Missing or unreadable sidecar file {path}")]
    Sidecar {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sidecar file is present but a required field cannot be parsed.
    #[error("Malformed sidecar file {path}: bad or missing {field}")]
    MalformedSidecar { path: PathBuf, field: &'static str },

    /// A subject directory contains no image volume.
    #[error("No image volume found for subject {subject}")]
    NoImage { subject: String },

    /// A volume could not be loaded.
    #[error(transparent)]
    Volume(#[from] anyhow::Error),
}

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Subject gender as recorded in the dataset metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
}

/// Demographic fields parsed from a dataset's sidecar metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Demographics {
    /// Subject age in years.
    pub age: u32,
    /// Recorded gender.
    pub gender: Gender,
    /// Clinical dementia rating; 0.0 when the field is absent.
    pub cdr: f32,
}

/// One scannable item of a dataset.
///
/// Constructed once when the adapter opens the dataset root; immutable
/// afterward.
#[derive(Debug, Clone)]
pub struct SubjectRecord {
    /// Dataset-specific identifier.
    pub id: String,
    /// Path to the subject's image volume.
    pub image_path: PathBuf,
    /// Demographics, for datasets that record them.
    pub demographics: Option<Demographics>,
}

/// A neuroimaging dataset that can be enumerated and loaded.
pub trait Dataset {
    /// Short prefix used to key storage paths, e.g. `"OASIS1"`.
    fn prefix(&self) -> &'static str;

    /// The ordered subject records discovered at open time.
    fn records(&self) -> &[SubjectRecord];

    /// Load the volume behind a record.
    fn load_volume(&self, record: &SubjectRecord) -> Result<Image>;

    /// Apply dataset-specific modifications before resampling onto the
    /// atlas grid. The default leaves the volume untouched.
    fn align_to_atlas(&self, volume: Image, _atlas: &Image) -> Image {
        volume
    }
}

/// Adopt the atlas's spatial frame: override origin and direction while
/// keeping voxel data and spacing. Both OASIS adapters use this as their
/// `align_to_atlas` hook.
pub(crate) fn adopt_atlas_frame(mut volume: Image, atlas: &Image) -> Image {
    volume.set_origin(*atlas.origin());
    volume.set_direction(*atlas.direction());
    volume
}
