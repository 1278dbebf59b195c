//! Fixture builders for projects and batch configurations.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::core::{BatchConfig, BuildDefinition, Hoster, PackagingConfigLocator, ProjectSpec};

/// A GitHub project with a single `make build` step for amd64.
pub fn project(owner: &str, name: &str) -> ProjectSpec {
    let build = BuildDefinition::new("amd64", ["make build"], BTreeMap::new())
        .expect("valid build definition");
    ProjectSpec::new(owner, name, Hoster::GitHub, vec![build]).expect("valid project")
}

/// Temporary roots for artifacts, clones and packaging specs.
pub struct Sandbox {
    tmp: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Sandbox {
            tmp: TempDir::new().expect("temp dir"),
        }
    }

    pub fn artifacts(&self) -> PathBuf {
        self.tmp.path().join("artifacts")
    }

    pub fn clones(&self) -> PathBuf {
        self.tmp.path().join("clones")
    }

    pub fn specs(&self) -> PathBuf {
        self.tmp.path().join("nfpm")
    }

    /// A batch config over `projects` rooted in this sandbox.
    pub fn config(&self, projects: Vec<ProjectSpec>) -> BatchConfig {
        let locator = PackagingConfigLocator::new(self.specs(), None).expect("valid locator");
        BatchConfig::new(projects, self.artifacts(), self.clones(), locator).expect("valid config")
    }

    /// Same as [`Sandbox::config`] with packaging specs fetched from `url`.
    pub fn config_with_fetch(&self, projects: Vec<ProjectSpec>, url: &str) -> BatchConfig {
        let locator = PackagingConfigLocator::new(self.specs(), Some(url.to_string()))
            .expect("valid locator");
        BatchConfig::new(projects, self.artifacts(), self.clones(), locator).expect("valid config")
    }

    /// Create the packaging spec of `project` where the batch expects it.
    pub fn write_spec(&self, config: &BatchConfig, project: &ProjectSpec) -> PathBuf {
        let path = config.packaging_config().spec_path(project);
        std::fs::create_dir_all(path.parent().expect("spec has a parent")).expect("spec dir");
        std::fs::write(&path, "name: test\nversion: ${NFPM_APP_VERSION}\n").expect("spec file");
        path
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}
