//! Error types for registration invocations.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Main error type for registration invocations.
#[derive(Error, Debug)]
pub enum AntsError {
    /// The registration executable could not be located.
    #[error("No executable \"antsRegistration\" on PATH or in the configured ANTs directory")]
    ExecutableNotFound,

    /// Unknown speed preset name.
    #[error("Parameter speed must be from the list: accurate, normal, fast, debug (got {0:?})")]
    InvalidSpeed(String),

    /// Unknown metric preset name.
    #[error("Parameter metric must be from the list: MI, CC (got {0:?})")]
    InvalidMetric(String),

    /// Unknown transform type name.
    #[error("Parameter type must be from the list: rigid, affine, deformable (got {0:?})")]
    InvalidTransformKind(String),

    /// The executable ran but exited with a failure status.
    #[error("antsRegistration failed with {status}: {stderr}")]
    CommandFailed { status: ExitStatus, stderr: String },

    /// An output file the invocation should have produced is missing.
    #[error("Registration did not produce expected output {path}")]
    MissingOutput { path: PathBuf },

    /// A child environment variable could not be assembled.
    #[error("Failed to extend {variable} for the registration process")]
    Environment {
        variable: &'static str,
        #[source]
        source: std::env::JoinPathsError,
    },

    /// Filesystem error while staging inputs or collecting outputs.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error while writing input volumes or transforms for the invocation.
    #[error(transparent)]
    Staging(#[from] anyhow::Error),
}

/// Result type for registration invocations.
pub type Result<T> = std::result::Result<T, AntsError>;
