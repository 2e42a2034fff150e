use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use atlasprep_ants::{register_image, RegisterOptions, RegistrationParams};
use atlasprep_cli::prepare::{prepare_datasets, PrepareConfig};
use atlasprep_io::read_nifti;

#[derive(Parser)]
#[command(name = "atlasprep")]
#[command(about = "Prepare neuroimaging datasets by aligning them to a common atlas")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare all configured datasets against the atlas
    Prepare {
        /// Reference atlas volume
        #[arg(short, long, default_value = "atlas/atlas.nii.gz")]
        atlas: PathBuf,

        /// Output directory for prepared volumes
        #[arg(short, long, default_value = "datasets_prepared")]
        storage: PathBuf,

        /// Root directory of the OASIS-1 dataset
        #[arg(long)]
        oasis1_root: Option<PathBuf>,

        /// Root directory of the OASIS-3 dataset
        #[arg(long)]
        oasis3_root: Option<PathBuf>,

        /// Transform model (rigid, affine)
        #[arg(long, default_value = "affine")]
        transform: String,

        /// Similarity metric preset (MI, CC)
        #[arg(long, default_value = "MI")]
        metric: String,

        /// Convergence preset (accurate, normal, fast, debug)
        #[arg(long, default_value = "fast")]
        speed: String,

        /// Threads granted to the registration executable
        #[arg(long, default_value_t = 8)]
        threads: usize,

        /// Directory holding a bundled antsRegistration executable
        #[arg(long)]
        ants_bin: Option<PathBuf>,

        /// Directory holding the bundled ANTs shared libraries
        #[arg(long)]
        ants_lib: Option<PathBuf>,
    },

    /// Register a single moving volume onto a fixed volume
    Register {
        /// Fixed (reference) volume
        fixed: PathBuf,

        /// Moving volume
        moving: PathBuf,

        /// Directory receiving the transform(s) and warped volume
        #[arg(short, long, default_value = "registration_out")]
        output: PathBuf,

        /// Transform model (rigid, affine, deformable)
        #[arg(long, default_value = "affine")]
        transform: String,

        /// Similarity metric preset (MI, CC)
        #[arg(long, default_value = "MI")]
        metric: String,

        /// Convergence preset (accurate, normal, fast, debug)
        #[arg(long, default_value = "fast")]
        speed: String,

        /// Threads granted to the registration executable
        #[arg(long, default_value_t = 8)]
        threads: usize,

        /// Directory holding a bundled antsRegistration executable
        #[arg(long)]
        ants_bin: Option<PathBuf>,

        /// Directory holding the bundled ANTs shared libraries
        #[arg(long)]
        ants_lib: Option<PathBuf>,
    },

    /// List the dataset layouts this tool understands
    ListDatasets,

    /// Count prepared volumes in a storage directory
    Verify {
        /// Directory containing prepared volumes
        #[arg(short, long, default_value = "datasets_prepared")]
        storage: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Prepare {
            atlas,
            storage,
            oasis1_root,
            oasis3_root,
            transform,
            metric,
            speed,
            threads,
            ants_bin,
            ants_lib,
        } => {
            let params = RegistrationParams {
                kind: transform.parse()?,
                metric: metric.parse()?,
                speed: speed.parse()?,
                num_threads: threads,
                verbose: false,
            };
            let config = PrepareConfig {
                atlas_path: atlas,
                storage_dir: storage,
                oasis1_root,
                oasis3_root,
                register: RegisterOptions {
                    params,
                    ants_bin_dir: ants_bin,
                    ants_lib_dir: ants_lib,
                    ..Default::default()
                },
            };

            let summary = prepare_datasets(&config)?;
            info!(
                "Done! Prepared {} volume(s), skipped {} existing",
                summary.prepared, summary.skipped
            );
        }
        Commands::Register {
            fixed,
            moving,
            output,
            transform,
            metric,
            speed,
            threads,
            ants_bin,
            ants_lib,
        } => {
            let params = RegistrationParams {
                kind: transform.parse()?,
                metric: metric.parse()?,
                speed: speed.parse()?,
                num_threads: threads,
                verbose: true,
            };
            let opts = RegisterOptions {
                params,
                ants_bin_dir: ants_bin,
                ants_lib_dir: ants_lib,
                store_to: Some(output),
                ..Default::default()
            };

            let fixed_volume = read_nifti(&fixed)?;
            let moving_volume = read_nifti(&moving)?;
            let result = register_image(&moving_volume, &fixed_volume, &opts)?;

            for path in &result.transforms {
                info!("Transform: {}", path.display());
            }
            info!("Warped volume: {}", result.warped_volume.display());
        }
        Commands::ListDatasets => {
            list_datasets();
        }
        Commands::Verify { storage } => {
            verify_storage(&storage)?;
        }
    }

    Ok(())
}

fn list_datasets() {
    println!("Supported dataset layouts:");
    println!();
    println!("  OASIS1  - Cross-sectional MRI (oasis-brains.org)");
    println!("            <root>/OAS1_<id>_MR1/");
    println!("              OAS1_<id>_MR1.txt (demographics sidecar)");
    println!("              PROCESSED/MPRAGE/T88_111/*_anon_111_t88_masked_gfc.hdr");
    println!();
    println!("  OASIS3  - Longitudinal MRI (oasis-brains.org)");
    println!("            <root>/OAS3<subject>_MR_d<days>/anat<n>/NIFTI/*.nii.gz");
    println!();
    println!("Pass the roots with --oasis1-root / --oasis3-root.");
}

fn verify_storage(storage: &std::path::Path) -> Result<()> {
    if !storage.exists() {
        warn!("Storage directory does not exist: {}", storage.display());
        return Ok(());
    }

    let mut count = 0usize;
    for entry in walkdir::WalkDir::new(storage).max_depth(1) {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file() && name.ends_with(".nii.gz") {
            count += 1;
        }
    }

    info!(
        "Found {} prepared volume(s) in {}",
        count,
        storage.display()
    );
    Ok(())
}
