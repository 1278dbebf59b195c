//! High-level operations.

pub mod batch_build;
pub mod preflight;

pub use batch_build::{
    BatchBuilder, BatchReport, BuildOutcome, Collaborators, ProjectReport, Step,
};
pub use preflight::check_packaging_tool;
