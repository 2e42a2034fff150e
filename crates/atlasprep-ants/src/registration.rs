//! Invocation of the external registration executable.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tracing::{debug, info};

use atlasprep_core::image::Image;
use atlasprep_core::transform::AffineTransform;

use crate::error::{AntsError, Result};
use crate::params::{RegistrationParams, WARPED_IMAGE_NAME};

const EXECUTABLE_NAME: &str = "antsRegistration";

/// Options for a single registration invocation.
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    /// Parameter presets forwarded to the executable.
    pub params: RegistrationParams,
    /// Directory holding a bundled `antsRegistration`; takes precedence
    /// over `PATH` when set.
    pub ants_bin_dir: Option<PathBuf>,
    /// Directory with the bundled ANTs shared libraries, appended to the
    /// child's `LD_LIBRARY_PATH` when a bundled executable is used.
    pub ants_lib_dir: Option<PathBuf>,
    /// Initial transform applied to the moving volume.
    pub initial_moving_transform: Option<AffineTransform<3>>,
    /// Initial transform applied to the fixed volume.
    pub initial_fixed_transform: Option<AffineTransform<3>>,
    /// Copy the outputs to this directory instead of returning paths into
    /// the staging directory.
    pub store_to: Option<PathBuf>,
}

/// Output artifacts of a registration invocation.
///
/// When no `store_to` directory was requested, the paths point into the
/// staging directory, which lives exactly as long as this value.
#[derive(Debug)]
pub struct RegistrationOutput {
    /// Transform files, forward (moving-to-fixed) first.
    pub transforms: Vec<PathBuf>,
    /// The moving volume warped onto the fixed grid.
    pub warped_volume: PathBuf,
    _staging: Option<TempDir>,
}

impl RegistrationOutput {
    /// The forward transform, which maps fixed-space points into the moving
    /// volume and is what a resampler onto the fixed grid consumes.
    pub fn forward_transform(&self) -> &Path {
        &self.transforms[0]
    }
}

/// Register a moving volume onto a fixed volume with `antsRegistration`.
///
/// Inputs are staged as NIfTI files in a fresh temporary directory and the
/// executable runs with that directory as its working directory. The child
/// process gets its own environment: `PATH`/`LD_LIBRARY_PATH` extended with
/// the configured ANTs directories and the ITK thread count from the
/// parameters. The calling process environment is never mutated.
///
/// There is no retry policy; the first failure is returned as an error.
pub fn register_image(
    moving: &Image,
    fixed: &Image,
    opts: &RegisterOptions,
) -> Result<RegistrationOutput> {
    let resolved = resolve_executable(opts)?;
    info!("Using antsRegistration from: {}", resolved.executable.display());

    let staging = tempfile::tempdir()?;

    let fixed_name = "fixed.nii.gz";
    let moving_name = "moving.nii.gz";
    atlasprep_io::write_nifti(staging.path().join(fixed_name), fixed)?;
    atlasprep_io::write_nifti(staging.path().join(moving_name), moving)?;

    let initial_fixed_name = opts
        .initial_fixed_transform
        .as_ref()
        .map(|transform| {
            let name = "initialfixedtrf.mat";
            atlasprep_io::write_itk_affine(staging.path().join(name), transform)?;
            Ok::<_, AntsError>(name)
        })
        .transpose()?;
    let initial_moving_name = opts
        .initial_moving_transform
        .as_ref()
        .map(|transform| {
            let name = "initialmovingtrf.mat";
            atlasprep_io::write_itk_affine(staging.path().join(name), transform)?;
            Ok::<_, AntsError>(name)
        })
        .transpose()?;

    let args = opts.params.command_args(
        fixed_name,
        moving_name,
        initial_fixed_name,
        initial_moving_name,
    );
    debug!("Executing: {} {}", resolved.executable.display(), args.join(" "));

    let mut command = Command::new(&resolved.executable);
    command
        .args(&args)
        .current_dir(staging.path())
        .env(
            "ITK_GLOBAL_DEFAULT_NUMBER_OF_THREADS",
            opts.params.num_threads.to_string(),
        );
    if let Some(path_value) = &resolved.child_path {
        command.env("PATH", path_value);
    }
    if let Some(ld_value) = &resolved.child_ld_library_path {
        command.env("LD_LIBRARY_PATH", ld_value);
    }

    let output = command.output()?;
    if !output.status.success() {
        return Err(AntsError::CommandFailed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let mut produced = Vec::new();
    for name in opts.params.kind.transform_outputs() {
        let path = staging.path().join(&name);
        if !path.is_file() {
            return Err(AntsError::MissingOutput { path });
        }
        produced.push(path);
    }
    let warped = staging.path().join(WARPED_IMAGE_NAME);
    if !warped.is_file() {
        return Err(AntsError::MissingOutput { path: warped });
    }

    match &opts.store_to {
        Some(store_dir) => {
            fs::create_dir_all(store_dir)?;
            let mut stored = Vec::with_capacity(produced.len());
            for path in &produced {
                let target = store_dir.join(path.file_name().expect("staged file name"));
                fs::copy(path, &target)?;
                stored.push(target);
            }
            let stored_warped = store_dir.join(WARPED_IMAGE_NAME);
            fs::copy(&warped, &stored_warped)?;
            info!(
                "Stored transform(s) to: {}",
                stored
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            Ok(RegistrationOutput {
                transforms: stored,
                warped_volume: stored_warped,
                _staging: None,
            })
        }
        None => Ok(RegistrationOutput {
            transforms: produced,
            warped_volume: warped,
            _staging: Some(staging),
        }),
    }
}

struct ResolvedExecutable {
    executable: PathBuf,
    child_path: Option<OsString>,
    child_ld_library_path: Option<OsString>,
}

/// Locate `antsRegistration` and assemble the child environment.
///
/// A configured ANTs directory takes precedence over `PATH`.
fn resolve_executable(opts: &RegisterOptions) -> Result<ResolvedExecutable> {
    if let Some(bin_dir) = &opts.ants_bin_dir {
        let candidate = bin_dir.join(EXECUTABLE_NAME);
        if candidate.is_file() {
            let child_path = Some(extend_path_list("PATH", bin_dir)?);
            let child_ld_library_path = opts
                .ants_lib_dir
                .as_ref()
                .map(|lib_dir| extend_path_list("LD_LIBRARY_PATH", lib_dir))
                .transpose()?;
            return Ok(ResolvedExecutable {
                executable: candidate,
                child_path,
                child_ld_library_path,
            });
        }
    }

    if let Some(found) = find_in_path(EXECUTABLE_NAME) {
        return Ok(ResolvedExecutable {
            executable: found,
            child_path: None,
            child_ld_library_path: None,
        });
    }

    Err(AntsError::ExecutableNotFound)
}

/// The current value of a path-list variable with one directory appended.
fn extend_path_list(variable: &'static str, dir: &Path) -> Result<OsString> {
    let mut parts: Vec<PathBuf> = env::var_os(variable)
        .map(|value| env::split_paths(&value).collect())
        .unwrap_or_default();
    parts.push(dir.to_path_buf());
    env::join_paths(parts).map_err(|source| AntsError::Environment { variable, source })
}

/// Search `PATH` for an executable, `which`-style.
fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable_with_empty_bin_dir() {
        // Deliberately point at a directory without the executable and make
        // sure resolution falls through to PATH (or fails cleanly).
        let empty = tempfile::tempdir().unwrap();
        let opts = RegisterOptions {
            ants_bin_dir: Some(empty.path().to_path_buf()),
            ..Default::default()
        };
        match resolve_executable(&opts) {
            // A system-wide installation may legitimately exist.
            Ok(resolved) => assert!(resolved.executable.ends_with(EXECUTABLE_NAME)),
            Err(err) => assert!(matches!(err, AntsError::ExecutableNotFound)),
        }
    }

    #[test]
    fn test_extend_path_list_appends_directory() {
        let value = extend_path_list("PATH", Path::new("/opt/ants/bin")).unwrap();
        let parts: Vec<PathBuf> = env::split_paths(&value).collect();
        assert_eq!(parts.last().unwrap(), Path::new("/opt/ants/bin"));
    }
}
