pub mod prepare;

pub use prepare::{prepare_datasets, PrepareConfig, PrepareSummary};
