//! Test utilities and fakes for batch-nfpm unit tests.
//!
//! Every external collaborator of the batch pipeline has a fake here that
//! records how it was called and answers from canned data, so the pipeline
//! can be tested without network, git or nfpm.
//!
//! # Example
//!
//! ```rust,ignore
//! let releases = FakeReleases::new().with_tag("prometheus/prometheus", "v2.45.0");
//! let runner = FakeRunner::new().exit_with("make", 2);
//! ```

pub mod fixtures;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::packager::{PackageRequest, PackagingTool};
use crate::core::errors::{CheckoutError, LookupError};
use crate::core::Hoster;
use crate::sources::{PackageVersionLookup, ReleaseLookup, SourceCheckout};
use crate::util::process::{CommandRunner, ProcessBuilder, ProcessStatus};

pub use fixtures::*;

/// Command runner that records commands instead of running them.
///
/// Every command succeeds unless its program was configured otherwise.
#[derive(Debug, Default)]
pub struct FakeRunner {
    calls: RefCell<Vec<ProcessBuilder>>,
    exits: HashMap<String, i32>,
    unlaunchable: Vec<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        FakeRunner::default()
    }

    /// Make every invocation of `program` exit with `code`.
    pub fn exit_with(mut self, program: &str, code: i32) -> Self {
        self.exits.insert(program.to_string(), code);
        self
    }

    /// Make every invocation of `program` fail to launch.
    pub fn unlaunchable(mut self, program: &str) -> Self {
        self.unlaunchable.push(program.to_string());
        self
    }

    /// All recorded commands.
    pub fn calls(&self) -> Vec<ProcessBuilder> {
        self.calls.borrow().clone()
    }

    /// All recorded commands as display strings.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(ProcessBuilder::display_command)
            .collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessStatus> {
        self.calls.borrow_mut().push(cmd.clone());

        let program = cmd.get_program().to_string_lossy().into_owned();
        if self.unlaunchable.contains(&program) {
            bail!("failed to execute `{}`", cmd.display_command());
        }

        Ok(match self.exits.get(&program) {
            Some(code) => ProcessStatus::from_code(Some(*code)),
            None => ProcessStatus::success(),
        })
    }
}

/// Release lookup answering from a map keyed by `owner/project`.
#[derive(Debug, Default)]
pub struct FakeReleases {
    tags: HashMap<String, String>,
    failing: Vec<String>,
    queries: RefCell<Vec<(Hoster, String)>>,
}

impl FakeReleases {
    pub fn new() -> Self {
        FakeReleases::default()
    }

    pub fn with_tag(mut self, project: &str, tag: &str) -> Self {
        self.tags.insert(project.to_string(), tag.to_string());
        self
    }

    pub fn failing(mut self, project: &str) -> Self {
        self.failing.push(project.to_string());
        self
    }

    /// Projects queried so far, as `owner/project`.
    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().iter().map(|(_, p)| p.clone()).collect()
    }
}

impl ReleaseLookup for FakeReleases {
    fn latest_tag(
        &self,
        hoster: Hoster,
        owner: &str,
        project: &str,
    ) -> Result<Option<String>, LookupError> {
        let key = format!("{}/{}", owner, project);
        self.queries.borrow_mut().push((hoster, key.clone()));

        if self.failing.contains(&key) {
            return Err(LookupError::Decode {
                url: format!("fake://{}", key),
                reason: "lookup failed".to_string(),
            });
        }
        Ok(self.tags.get(&key).cloned())
    }
}

/// Package repository answering from a map keyed by package name.
#[derive(Debug, Default)]
pub struct FakePackageVersions {
    versions: HashMap<String, String>,
    failing: bool,
    queries: RefCell<Vec<String>>,
}

impl FakePackageVersions {
    pub fn new() -> Self {
        FakePackageVersions::default()
    }

    pub fn with_version(mut self, package: &str, version: &str) -> Self {
        self.versions.insert(package.to_string(), version.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }
}

impl PackageVersionLookup for FakePackageVersions {
    fn current_version(&self, package: &str) -> Result<Option<String>, LookupError> {
        self.queries.borrow_mut().push(package.to_string());

        if self.failing {
            return Err(LookupError::Decode {
                url: "fake://repository".to_string(),
                reason: "repository unavailable".to_string(),
            });
        }
        Ok(self.versions.get(package).cloned())
    }
}

/// A recorded checkout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCall {
    pub url: String,
    pub path: PathBuf,
    pub reference: Option<String>,
}

/// Checkout that only creates the target directory.
#[derive(Debug, Default)]
pub struct FakeCheckout {
    failing_urls: Vec<String>,
    calls: RefCell<Vec<CheckoutCall>>,
}

impl FakeCheckout {
    pub fn new() -> Self {
        FakeCheckout::default()
    }

    /// Make checkouts of `url` fail.
    pub fn failing(mut self, url: &str) -> Self {
        self.failing_urls.push(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CheckoutCall> {
        self.calls.borrow().clone()
    }
}

impl SourceCheckout for FakeCheckout {
    fn checkout(
        &self,
        url: &str,
        local_path: &Path,
        reference: Option<&str>,
    ) -> Result<PathBuf, CheckoutError> {
        self.calls.borrow_mut().push(CheckoutCall {
            url: url.to_string(),
            path: local_path.to_path_buf(),
            reference: reference.map(str::to_string),
        });

        if self.failing_urls.iter().any(|u| u == url) {
            return Err(CheckoutError::RefNotFound {
                url: url.to_string(),
                reference: reference.unwrap_or("HEAD").to_string(),
            });
        }

        std::fs::create_dir_all(local_path).map_err(|source| CheckoutError::Io {
            path: local_path.to_path_buf(),
            source,
        })?;
        Ok(local_path.to_path_buf())
    }
}

/// Packaging tool that records requests and exits with a fixed code.
#[derive(Debug, Default)]
pub struct FakePackagingTool {
    exit_code: i32,
    requests: RefCell<Vec<PackageRequest>>,
}

impl FakePackagingTool {
    pub fn new() -> Self {
        FakePackagingTool::default()
    }

    pub fn exit_with(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn requests(&self) -> Vec<PackageRequest> {
        self.requests.borrow().clone()
    }
}

impl PackagingTool for FakePackagingTool {
    fn invoke(&self, request: &PackageRequest) -> Result<ProcessStatus> {
        self.requests.borrow_mut().push(request.clone());
        Ok(ProcessStatus::from_code(Some(self.exit_code)))
    }
}
