//! Core data structures for batch-nfpm.
//!
//! - Project and build definitions
//! - The validated batch configuration
//! - The error taxonomy shared by every stage

pub mod batch;
pub mod errors;
pub mod project;

pub use batch::{BatchConfig, PackagingConfigLocator};
pub use errors::{CheckoutError, ConfigError, LookupError, PreconditionError, VersionError};
pub use project::{BuildDefinition, Hoster, ProjectSpec, DEFAULT_CONFIG_FILE, DEFAULT_FORMAT};
