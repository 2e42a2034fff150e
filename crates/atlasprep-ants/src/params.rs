//! Registration parameter presets and command-line marshaling.
//!
//! The preset tables mirror the iteration/smoothing schedules and metric
//! configurations the pipeline has always used; `command_args` flattens a
//! selection into the argument vector `antsRegistration` expects.

use std::fmt;
use std::str::FromStr;

use crate::error::AntsError;

/// Prefix for transform files written by the invocation.
pub const OUTPUT_PREFIX: &str = "output_";
/// Name of the warped moving volume written by the invocation.
pub const WARPED_IMAGE_NAME: &str = "moving_warped.nii.gz";

/// Convergence schedule preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Accurate,
    Normal,
    Fast,
    Debug,
}

impl Speed {
    /// Iterations per resolution level.
    pub fn iterations(&self) -> &'static [u32] {
        match self {
            Speed::Accurate => &[1000, 100, 50, 20],
            Speed::Normal => &[100, 50, 10],
            Speed::Fast => &[100, 50],
            Speed::Debug => &[10],
        }
    }

    /// Shrink factor per resolution level.
    pub fn shrink_factors(&self) -> &'static [u32] {
        match self {
            Speed::Accurate => &[8, 4, 3, 1],
            Speed::Normal => &[8, 4, 2],
            Speed::Fast => &[4, 3],
            Speed::Debug => &[4],
        }
    }

    /// Smoothing sigma (in voxels) per resolution level.
    pub fn smoothing_sigmas(&self) -> &'static [u32] {
        match self {
            Speed::Accurate => &[4, 3, 2, 1],
            Speed::Normal => &[3, 2, 1],
            Speed::Fast => &[3, 2],
            Speed::Debug => &[3],
        }
    }
}

impl FromStr for Speed {
    type Err = AntsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "accurate" => Ok(Speed::Accurate),
            "normal" => Ok(Speed::Normal),
            "fast" => Ok(Speed::Fast),
            "debug" => Ok(Speed::Debug),
            _ => Err(AntsError::InvalidSpeed(s.to_string())),
        }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Speed::Accurate => "accurate",
            Speed::Normal => "normal",
            Speed::Fast => "fast",
            Speed::Debug => "debug",
        };
        write!(f, "{name}")
    }
}

/// Similarity metric preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Mutual information, 32 bins, regular sampling of 25%.
    Mi,
    /// Cross correlation, radius 4, dense sampling of 10%.
    Cc,
}

impl Metric {
    /// The `--metric` argument value for a fixed/moving pair.
    pub fn argument(&self, fixed: &str, moving: &str) -> String {
        match self {
            Metric::Mi => format!("MI[{fixed},{moving},1,32,Regular,0.25]"),
            Metric::Cc => format!("CC[{fixed},{moving},1,4,None,0.1]"),
        }
    }
}

impl FromStr for Metric {
    type Err = AntsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MI" => Ok(Metric::Mi),
            "CC" => Ok(Metric::Cc),
            _ => Err(AntsError::InvalidMetric(s.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Mi => "MI",
            Metric::Cc => "CC",
        };
        write!(f, "{name}")
    }
}

/// Transform model to estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Rigid,
    Affine,
    Deformable,
}

impl TransformKind {
    /// The `--transform` argument value (model and gradient step).
    pub fn argument(&self) -> &'static str {
        match self {
            TransformKind::Rigid => "Rigid[0.1]",
            TransformKind::Affine => "Affine[0.1]",
            TransformKind::Deformable => "SyN[0.25]",
        }
    }

    /// File names of the transforms the invocation writes, forward first.
    pub fn transform_outputs(&self) -> Vec<String> {
        match self {
            TransformKind::Rigid => vec![format!("{OUTPUT_PREFIX}0Rigid.mat")],
            TransformKind::Affine => vec![format!("{OUTPUT_PREFIX}0Affine.mat")],
            TransformKind::Deformable => vec![
                format!("{OUTPUT_PREFIX}0Warp.nii.gz"),
                format!("{OUTPUT_PREFIX}0InverseWarp.nii.gz"),
            ],
        }
    }
}

impl FromStr for TransformKind {
    type Err = AntsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rigid" => Ok(TransformKind::Rigid),
            "affine" => Ok(TransformKind::Affine),
            "deformable" => Ok(TransformKind::Deformable),
            _ => Err(AntsError::InvalidTransformKind(s.to_string())),
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformKind::Rigid => "rigid",
            TransformKind::Affine => "affine",
            TransformKind::Deformable => "deformable",
        };
        write!(f, "{name}")
    }
}

/// Full parameter selection for one registration invocation.
#[derive(Debug, Clone)]
pub struct RegistrationParams {
    pub kind: TransformKind,
    pub metric: Metric,
    pub speed: Speed,
    /// Threads granted to ANTs via `ITK_GLOBAL_DEFAULT_NUMBER_OF_THREADS`.
    pub num_threads: usize,
    /// Forward `--verbose` to the executable.
    pub verbose: bool,
}

impl Default for RegistrationParams {
    fn default() -> Self {
        Self {
            kind: TransformKind::Affine,
            metric: Metric::Mi,
            speed: Speed::Fast,
            num_threads: 8,
            verbose: false,
        }
    }
}

impl RegistrationParams {
    /// Build the full `antsRegistration` argument vector.
    ///
    /// Paths are given as seen from the invocation's working directory.
    pub fn command_args(
        &self,
        fixed: &str,
        moving: &str,
        initial_fixed_transform: Option<&str>,
        initial_moving_transform: Option<&str>,
    ) -> Vec<String> {
        let mut args = vec![
            "--dimensionality".to_string(),
            "3".to_string(),
            "--float".to_string(),
            "0".to_string(),
            "--output".to_string(),
            format!("[{OUTPUT_PREFIX},{WARPED_IMAGE_NAME}]"),
            "--interpolation".to_string(),
            "Linear".to_string(),
            "--winsorize-image-intensities".to_string(),
            "[0.005,0.995]".to_string(),
            "--use-histogram-matching".to_string(),
            "0".to_string(),
            "--write-composite-transform".to_string(),
            "0".to_string(),
        ];

        if let Some(path) = initial_fixed_transform {
            args.push("--initial-fixed-transform".to_string());
            args.push(path.to_string());
        }
        if let Some(path) = initial_moving_transform {
            args.push("--initial-moving-transform".to_string());
            args.push(path.to_string());
        }

        args.push("--transform".to_string());
        args.push(self.kind.argument().to_string());
        args.push("--metric".to_string());
        args.push(self.metric.argument(fixed, moving));
        args.push("--convergence".to_string());
        args.push(format!("[{},1e-06,10]", join_levels(self.speed.iterations())));
        args.push("--shrink-factors".to_string());
        args.push(join_levels(self.speed.shrink_factors()));
        args.push("--smoothing-sigmas".to_string());
        args.push(format!("{}vox", join_levels(self.speed.smoothing_sigmas())));

        if self.verbose {
            args.push("--verbose".to_string());
        }

        args
    }
}

fn join_levels(levels: &[u32]) -> String {
    levels
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join("x")
}
