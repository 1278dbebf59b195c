//! Build pipeline for a single project.
//!
//! - Release version normalization and comparison
//! - Running the build commands
//! - Packaging the result with nfpm

pub mod executor;
pub mod packager;
pub mod version;

pub use executor::{BuildExecutor, BuildStatus};
pub use packager::{
    target_filename, Nfpm, PackageArtifact, PackageRequest, Packager, PackagingTool,
};
