//! Batch configuration - the root of a run.

use std::path::{Path, PathBuf};

use crate::core::errors::ConfigError;
use crate::core::project::ProjectSpec;

/// Where packaging specs live, and optionally where to fetch them from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingConfigLocator {
    local_path: PathBuf,
    fetch_resource: Option<String>,
}

impl PackagingConfigLocator {
    pub fn new(
        local_path: impl Into<PathBuf>,
        fetch_resource: Option<String>,
    ) -> Result<Self, ConfigError> {
        let local_path = local_path.into();
        if local_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("nfpm_config.local_path"));
        }

        Ok(PackagingConfigLocator {
            local_path,
            fetch_resource: fetch_resource.filter(|r| !r.trim().is_empty()),
        })
    }

    /// Root directory holding the packaging specs.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Git URL the packaging specs are checked out from, if any.
    pub fn fetch_resource(&self) -> Option<&str> {
        self.fetch_resource.as_deref()
    }

    /// Path of a project's packaging spec below the local root.
    ///
    /// Layout: `{local_path}/{hostname}/{owner}/{project}/{config_file}`.
    pub fn spec_path(&self, project: &ProjectSpec) -> PathBuf {
        self.local_path
            .join(project.hostname())
            .join(project.owner())
            .join(project.project())
            .join(project.config_file())
    }
}

/// Validated configuration for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    projects: Vec<ProjectSpec>,
    artifacts_path: PathBuf,
    clone_path: PathBuf,
    packaging_config: PackagingConfigLocator,
    package_repository: Option<String>,
    force: bool,
}

impl BatchConfig {
    pub fn new(
        projects: Vec<ProjectSpec>,
        artifacts_path: impl Into<PathBuf>,
        clone_path: impl Into<PathBuf>,
        packaging_config: PackagingConfigLocator,
    ) -> Result<Self, ConfigError> {
        let artifacts_path = artifacts_path.into();
        let clone_path = clone_path.into();

        if projects.is_empty() {
            return Err(ConfigError::NoProjects);
        }
        if artifacts_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("artifacts_path"));
        }
        if clone_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("clone_path"));
        }

        Ok(BatchConfig {
            projects,
            artifacts_path,
            clone_path,
            packaging_config,
            package_repository: None,
            force: false,
        })
    }

    /// Set the package repository to compare published versions against.
    pub fn with_package_repository(mut self, repository: Option<String>) -> Self {
        self.package_repository = repository.filter(|r| !r.trim().is_empty());
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Replace the artifacts root. Empty paths are ignored.
    pub fn with_artifacts_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.as_os_str().is_empty() {
            self.artifacts_path = path;
        }
        self
    }

    /// Replace the clone root. Empty paths are ignored.
    pub fn with_clone_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.as_os_str().is_empty() {
            self.clone_path = path;
        }
        self
    }

    pub fn projects(&self) -> &[ProjectSpec] {
        &self.projects
    }

    pub fn artifacts_path(&self) -> &Path {
        &self.artifacts_path
    }

    pub fn clone_path(&self) -> &Path {
        &self.clone_path
    }

    pub fn packaging_config(&self) -> &PackagingConfigLocator {
        &self.packaging_config
    }

    pub fn package_repository(&self) -> Option<&str> {
        self.package_repository.as_deref()
    }

    pub fn force(&self) -> bool {
        self.force
    }

    /// Working copy location of a project: `{clone_path}/{owner}/{project}`.
    pub fn checkout_path(&self, project: &ProjectSpec) -> PathBuf {
        self.clone_path.join(project.owner()).join(project.project())
    }
}
