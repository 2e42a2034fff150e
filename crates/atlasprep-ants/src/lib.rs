//! Wrapper around the external `antsRegistration` executable.
//!
//! The actual transform estimation is performed entirely by ANTs; this crate
//! marshals parameter presets into a command line, stages input volumes in a
//! temporary directory, runs the executable with a child-scoped environment,
//! and collects the transform and warped-volume outputs.

pub mod error;
pub mod params;
pub mod registration;

pub use error::{AntsError, Result};
pub use params::{Metric, RegistrationParams, Speed, TransformKind};
pub use registration::{register_image, RegisterOptions, RegistrationOutput};
