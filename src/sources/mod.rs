//! External sources a batch run talks to.
//!
//! Sources are responsible for fetching upstream code (git), release
//! information (hosting APIs) and published package versions (package
//! repositories).

pub mod checkout;
pub mod hosting;
pub mod release;
pub mod repository;

pub use checkout::{GitCheckout, SourceCheckout};
pub use hosting::{provider, GitHub, GitLab, HostingProvider};
pub use release::{HttpReleaseLookup, ReleaseLookup};
pub use repository::{PackageVersionLookup, RpmRepository};
