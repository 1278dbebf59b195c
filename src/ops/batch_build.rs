//! Implementation of a batch run.
//!
//! For every configured project, in configuration order:
//!
//! ```text
//! release lookup ─┬─ none ──────────────────────────────► SkippedNoRelease
//!                 └─ tag ─► published version ─► compare ─┬─ not newer ─► SkippedUpToDate
//!                                                         └─ newer / force
//!   packaging spec ─┬─ missing ─────────────────────────► PackagingConfigMissing
//!                   └─ found ─► checkout ─► compile ─┬─ failed ─► BuildFailed
//!                                                    └─ ok ─► package ─► Built | PackagingFailed
//! ```
//!
//! Every error is contained at the project boundary: it becomes the outcome
//! of that project and the batch moves on to the next one.

use std::cell::Cell;
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use crate::builder::executor::{BuildExecutor, BuildStatus};
use crate::builder::packager::{Packager, PackagingTool};
use crate::builder::version;
use crate::core::errors::CheckoutError;
use crate::core::{BatchConfig, ProjectSpec};
use crate::sources::{PackageVersionLookup, ReleaseLookup, SourceCheckout};
use crate::util::process::{CommandRunner, ProcessStatus};

/// The pipeline step an unexpected error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ReleaseLookup,
    VersionLookup,
    VersionCompare,
    ConfigFetch,
    Checkout,
    Packaging,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::ReleaseLookup => "release lookup",
            Step::VersionLookup => "package version lookup",
            Step::VersionCompare => "version comparison",
            Step::ConfigFetch => "packaging config fetch",
            Step::Checkout => "checkout",
            Step::Packaging => "packaging",
        })
    }
}

/// What happened to one project during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The project has no published release.
    SkippedNoRelease,

    /// The published package is already at (or above) the latest release.
    SkippedUpToDate { tag: String, published: String },

    /// Packages were produced for every format.
    Built {
        version: String,
        artifacts: Vec<PathBuf>,
    },

    /// A build command failed.
    BuildFailed { reason: String },

    /// The packaging spec for the project does not exist.
    PackagingConfigMissing { path: PathBuf },

    /// The packaging tool exited unsuccessfully for a format.
    PackagingFailed { format: String, status: ProcessStatus },

    /// Any other error, contained at the project boundary.
    Errored { step: Step, reason: String },
}

impl BuildOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            BuildOutcome::SkippedNoRelease
                | BuildOutcome::SkippedUpToDate { .. }
                | BuildOutcome::Built { .. }
        )
    }

    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            BuildOutcome::SkippedNoRelease | BuildOutcome::SkippedUpToDate { .. }
        )
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildOutcome::SkippedNoRelease => f.write_str("skipped, no release"),
            BuildOutcome::SkippedUpToDate { tag, published } => {
                write!(f, "skipped, {} is not newer than {}", tag, published)
            }
            BuildOutcome::Built { version, artifacts } => {
                write!(f, "built {} ({} package(s))", version, artifacts.len())
            }
            BuildOutcome::BuildFailed { reason } => write!(f, "build failed: {}", reason),
            BuildOutcome::PackagingConfigMissing { path } => {
                write!(f, "packaging config missing: {}", path.display())
            }
            BuildOutcome::PackagingFailed { format, status } => {
                write!(f, "packaging {} failed with {}", format, status)
            }
            BuildOutcome::Errored { step, reason } => write!(f, "{} failed: {}", step, reason),
        }
    }
}

/// Outcome of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReport {
    /// `owner/project`
    pub project: String,
    pub outcome: BuildOutcome,
}

/// Outcomes of a whole run, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub projects: Vec<ProjectReport>,
}

impl BatchReport {
    pub fn push(&mut self, project: impl Into<String>, outcome: BuildOutcome) {
        self.projects.push(ProjectReport {
            project: project.into(),
            outcome,
        });
    }

    /// Outcome of `owner/project`, if it was part of the run.
    pub fn outcome(&self, project: &str) -> Option<&BuildOutcome> {
        self.projects
            .iter()
            .find(|r| r.project == project)
            .map(|r| &r.outcome)
    }

    pub fn built_count(&self) -> usize {
        self.projects
            .iter()
            .filter(|r| matches!(r.outcome, BuildOutcome::Built { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.projects.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.projects.iter().filter(|r| r.outcome.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} built, {} skipped, {} failed",
            self.built_count(),
            self.skipped_count(),
            self.failed_count()
        )
    }
}

/// The external collaborators of a batch run.
pub struct Collaborators<'a> {
    pub releases: &'a dyn ReleaseLookup,
    /// Consulted only when the config names a package repository.
    pub package_versions: Option<&'a dyn PackageVersionLookup>,
    pub checkout: &'a dyn SourceCheckout,
    pub runner: &'a dyn CommandRunner,
    pub packaging_tool: &'a dyn PackagingTool,
}

/// Drives one pass over all configured projects.
pub struct BatchBuilder<'a> {
    config: &'a BatchConfig,
    releases: &'a dyn ReleaseLookup,
    package_versions: Option<&'a dyn PackageVersionLookup>,
    checkout: &'a dyn SourceCheckout,
    executor: BuildExecutor<'a>,
    packager: Packager<'a>,
    specs_fetched: Cell<bool>,
}

impl<'a> BatchBuilder<'a> {
    pub fn new(config: &'a BatchConfig, collaborators: Collaborators<'a>) -> Self {
        match (config.package_repository(), collaborators.package_versions) {
            (Some(repository), Some(_)) => {
                tracing::info!("Using '{}' as remote package repository", repository)
            }
            _ => tracing::info!("No remote package repository defined"),
        }

        BatchBuilder {
            config,
            releases: collaborators.releases,
            package_versions: collaborators.package_versions,
            checkout: collaborators.checkout,
            executor: BuildExecutor::new(collaborators.runner),
            packager: Packager::new(config.artifacts_path(), collaborators.packaging_tool),
            specs_fetched: Cell::new(false),
        }
    }

    /// Process every project, strictly one after another.
    pub fn run(&self) -> BatchReport {
        let mut report = BatchReport::default();

        for project in self.config.projects() {
            let span = tracing::info_span!("project", name = %project);
            let _enter = span.enter();

            let outcome = self.build_project(project);
            if outcome.is_failure() {
                tracing::warn!("{}: {}", project, outcome);
            } else {
                tracing::info!("{}: {}", project, outcome);
            }
            report.push(project.to_string(), outcome);
        }

        tracing::info!("Batch finished: {}", report);
        report
    }

    fn build_project(&self, project: &ProjectSpec) -> BuildOutcome {
        tracing::info!("Checking build {} on {}", project, project.hoster());

        let tag = match self
            .releases
            .latest_tag(project.hoster(), project.owner(), project.project())
        {
            Ok(Some(tag)) => tag,
            Ok(None) => {
                tracing::warn!("No release found for {}", project);
                return BuildOutcome::SkippedNoRelease;
            }
            Err(e) => return errored(Step::ReleaseLookup, &e),
        };

        let published = match self.published_version(project) {
            Ok(published) => published,
            Err(e) => return errored(Step::VersionLookup, &e),
        };

        if !self.config.force() {
            match version::is_newer(&tag, published.as_deref()) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!("Not building package for git tag {}", tag);
                    return BuildOutcome::SkippedUpToDate {
                        tag,
                        published: published.unwrap_or_default(),
                    };
                }
                Err(e) => return errored(Step::VersionCompare, &e),
            }
        }
        tracing::info!("Building package from git tag {}", tag);

        let spec_path = match self.packaging_spec(project) {
            Ok(path) => path,
            Err(e) => return errored(Step::ConfigFetch, &e),
        };
        if !spec_path.is_file() {
            tracing::error!(
                "No nfpm file '{}' defined for {}",
                spec_path.display(),
                project
            );
            return BuildOutcome::PackagingConfigMissing { path: spec_path };
        }

        let working_dir = match self.checkout.checkout(
            &project.clone_url(),
            &self.config.checkout_path(project),
            Some(&tag),
        ) {
            Ok(dir) => dir,
            Err(e) => return errored(Step::Checkout, &e),
        };

        let version = version::normalize(&tag).to_string();

        let status = self.executor.compile(project.builds(), &working_dir);
        if let BuildStatus::Failed { .. } = status {
            return BuildOutcome::BuildFailed {
                reason: status.to_string(),
            };
        }

        let artifacts =
            match self
                .packager
                .build_package(project, &spec_path, Some(&version), &working_dir)
            {
                Ok(artifacts) => artifacts,
                Err(e) => return errored(Step::Packaging, &*e),
            };

        if let Some(failed) = artifacts.iter().find(|a| !a.status.is_success()) {
            return BuildOutcome::PackagingFailed {
                format: failed.format.clone(),
                status: failed.status,
            };
        }

        BuildOutcome::Built {
            version,
            artifacts: artifacts.into_iter().map(|a| a.path).collect(),
        }
    }

    /// Version currently published in the package repository, if one is
    /// configured.
    fn published_version(
        &self,
        project: &ProjectSpec,
    ) -> Result<Option<String>, crate::core::LookupError> {
        let lookup = match (self.config.package_repository(), self.package_versions) {
            (Some(_), Some(lookup)) => lookup,
            _ => return Ok(None),
        };

        let published = lookup.current_version(project.package_name())?;
        match &published {
            Some(v) => tracing::info!(
                "Comparing versions from git and package {} ({}) from repository",
                project.package_name(),
                v
            ),
            None => tracing::info!("No package version from package repository available"),
        }
        Ok(published)
    }

    /// Location of the project's packaging spec, fetching the spec
    /// repository first if one is configured.
    fn packaging_spec(&self, project: &ProjectSpec) -> Result<PathBuf, CheckoutError> {
        let locator = self.config.packaging_config();

        if let Some(url) = locator.fetch_resource() {
            if !self.specs_fetched.get() {
                self.checkout.checkout(url, locator.local_path(), None)?;
                self.specs_fetched.set(true);
            }
        }

        Ok(locator.spec_path(project))
    }
}

fn errored(step: Step, err: &dyn StdError) -> BuildOutcome {
    let mut reason = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }

    tracing::warn!("{} failed: {}", step, reason);
    BuildOutcome::Errored { step, reason }
}
