//! batch-nfpm - builds OS packages for upstream releases
//!
//! For each configured project the latest upstream release is compared with
//! the version published in a package repository. Newer releases are checked
//! out, built and packaged with nfpm.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Fakes for every external collaborator of a batch run.
#[cfg(test)]
pub mod test_support;

pub use core::{BatchConfig, BuildDefinition, Hoster, ProjectSpec};
pub use ops::{BatchBuilder, BatchReport, BuildOutcome, Collaborators};
