//! The dataset preparation pipeline.
//!
//! One pass over every configured dataset: load, align to the atlas frame,
//! resample onto the atlas grid, register against the atlas, then resample
//! the aligned volume through the estimated transform and store the result.
//! An already-present storage path is the only resume mechanism; any item
//! failure aborts the batch.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, ensure, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use atlasprep_ants::{register_image, RegisterOptions, TransformKind};
use atlasprep_core::filter::resample_to_reference;
use atlasprep_datasets::{Dataset, Oasis1, Oasis3};
use atlasprep_io::{read_itk_affine, read_nifti, write_nifti};

/// Configuration for one preparation run.
#[derive(Debug, Clone)]
pub struct PrepareConfig {
    /// Path to the reference atlas volume.
    pub atlas_path: PathBuf,
    /// Directory receiving the prepared volumes.
    pub storage_dir: PathBuf,
    /// OASIS-1 dataset root, if that dataset should be prepared.
    pub oasis1_root: Option<PathBuf>,
    /// OASIS-3 dataset root, if that dataset should be prepared.
    pub oasis3_root: Option<PathBuf>,
    /// Registration options; `store_to` is managed by the pipeline.
    pub register: RegisterOptions,
}

/// Counters describing a preparation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PrepareSummary {
    /// Volumes processed in this run.
    pub prepared: usize,
    /// Volumes skipped because their storage path already existed.
    pub skipped: usize,
}

/// Run the preparation pipeline over all configured datasets.
pub fn prepare_datasets(config: &PrepareConfig) -> Result<PrepareSummary> {
    if config.register.params.kind == TransformKind::Deformable {
        bail!("prepare chains the forward transform into a resampler and needs a rigid or affine registration");
    }

    let atlas = read_nifti(&config.atlas_path)
        .with_context(|| format!("Failed to load atlas {}", config.atlas_path.display()))?;
    fs::create_dir_all(&config.storage_dir)?;

    let mut datasets: Vec<Box<dyn Dataset>> = Vec::new();
    if let Some(root) = &config.oasis1_root {
        datasets.push(Box::new(Oasis1::open(root)?));
    }
    if let Some(root) = &config.oasis3_root {
        datasets.push(Box::new(Oasis3::open(root)?));
    }
    ensure!(
        !datasets.is_empty(),
        "No dataset roots configured; pass --oasis1-root and/or --oasis3-root"
    );

    let mut summary = PrepareSummary::default();

    for dataset in &datasets {
        info!("Reading dataset: {}", dataset.prefix());
        let records = dataset.records();

        let bar = ProgressBar::new(records.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );

        for record in records {
            let storage_id = format!("{}_{}", dataset.prefix(), record.id);
            bar.set_message(storage_id.clone());

            let storage_path = config.storage_dir.join(format!("{storage_id}.nii.gz"));
            if storage_path.exists() {
                info!("Skipping existing file: {}", storage_id);
                summary.skipped += 1;
                bar.inc(1);
                continue;
            }

            let volume = dataset
                .load_volume(record)
                .with_context(|| format!("Failed to load volume for {storage_id}"))?;
            let aligned = dataset.align_to_atlas(volume, &atlas);
            let resampled = resample_to_reference(&aligned, &atlas, None);

            let output = register_image(&resampled, &atlas, &config.register)
                .with_context(|| format!("Registration failed for {storage_id}"))?;

            // The forward transform maps atlas points into the moving
            // volume, which is exactly what the resampler consumes.
            let forward = read_itk_affine(output.forward_transform())
                .with_context(|| format!("Failed to read transform for {storage_id}"))?;
            let final_volume = resample_to_reference(&aligned, &atlas, Some(&forward));

            write_nifti(&storage_path, &final_volume)
                .with_context(|| format!("Failed to store {storage_id}"))?;

            info!("Successfully preprocessed: {}", storage_id);
            summary.prepared += 1;
            bar.inc(1);
        }

        bar.finish_and_clear();
    }

    Ok(summary)
}
