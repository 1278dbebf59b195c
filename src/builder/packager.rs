//! Packaging - turns a built working copy into package files.
//!
//! The packaging itself is done by an external tool (nfpm). The version is
//! handed to the tool through its environment so that packaging specs can
//! reference it, e.g. `version: ${NFPM_APP_VERSION}`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::{ProjectSpec, DEFAULT_FORMAT};
use crate::util::fs::ensure_dir;
use crate::util::process::{ProcessBuilder, ProcessStatus};

/// Environment variable carrying the package version.
pub const VERSION_ENV_VAR: &str = "NFPM_APP_VERSION";

/// Older name of [`VERSION_ENV_VAR`], still used by existing packaging specs.
pub const LEGACY_VERSION_ENV_VAR: &str = "MY_APP_VERSION";

/// Default packaging tool binary.
pub const NFPM_BINARY: &str = "nfpm";

/// Everything the packaging tool needs for one package file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    pub spec_path: PathBuf,
    pub format: String,
    pub output_path: PathBuf,
    pub env: BTreeMap<String, String>,
    pub working_dir: PathBuf,
}

/// An external tool producing package files.
pub trait PackagingTool {
    /// Produce one package file and report how the tool exited.
    fn invoke(&self, request: &PackageRequest) -> Result<ProcessStatus>;
}

/// The nfpm packager.
#[derive(Debug, Clone)]
pub struct Nfpm {
    program: PathBuf,
}

impl Nfpm {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Nfpm {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// `nfpm -f <spec> pkg -p <format> -t <output>`
    pub fn command(&self, request: &PackageRequest) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
            .arg("-f")
            .arg(&request.spec_path)
            .arg("pkg")
            .arg("-p")
            .arg(&request.format)
            .arg("-t")
            .arg(&request.output_path)
            .envs(&request.env)
            .cwd(&request.working_dir)
    }
}

impl Default for Nfpm {
    fn default() -> Self {
        Nfpm::new(NFPM_BINARY)
    }
}

impl PackagingTool for Nfpm {
    fn invoke(&self, request: &PackageRequest) -> Result<ProcessStatus> {
        let cmd = self.command(request);
        tracing::info!("Packaging with '{}'", cmd.display_command());
        cmd.status()
    }
}

/// A package file produced (or attempted) for one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageArtifact {
    pub format: String,
    pub path: PathBuf,
    pub status: ProcessStatus,
}

/// File name of a package: `{project}[-{version}].{format}`.
pub fn target_filename(project: &str, format: &str, version: Option<&str>) -> String {
    let format = if format.is_empty() {
        DEFAULT_FORMAT
    } else {
        format
    };

    match version.filter(|v| !v.is_empty()) {
        Some(version) => format!("{}-{}.{}", project, version, format),
        None => format!("{}.{}", project, format),
    }
}

/// Environment for the packaging tool carrying `version`.
pub fn version_env(version: Option<&str>) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    if let Some(version) = version {
        env.insert(VERSION_ENV_VAR.to_string(), version.to_string());
        env.insert(LEGACY_VERSION_ENV_VAR.to_string(), version.to_string());
    }
    env
}

/// Produces one package per requested format below the artifacts root.
pub struct Packager<'a> {
    artifacts_root: &'a Path,
    tool: &'a dyn PackagingTool,
}

impl<'a> Packager<'a> {
    pub fn new(artifacts_root: &'a Path, tool: &'a dyn PackagingTool) -> Self {
        Packager {
            artifacts_root,
            tool,
        }
    }

    /// Output path of a package: `{artifacts}/{format}/{filename}`.
    pub fn package_path(&self, project: &str, format: &str, version: Option<&str>) -> PathBuf {
        self.artifacts_root
            .join(format)
            .join(target_filename(project, format, version))
    }

    /// Invoke the packaging tool once per format of `project`.
    ///
    /// `version` must already be normalized. The returned artifacts carry the
    /// tool's exit status; a non-zero status means that package is missing.
    /// `Err` is returned when an output directory cannot be created or the
    /// tool cannot be launched.
    pub fn build_package(
        &self,
        project: &ProjectSpec,
        spec_path: &Path,
        version: Option<&str>,
        working_dir: &Path,
    ) -> Result<Vec<PackageArtifact>> {
        let env = version_env(version);
        let mut artifacts = Vec::with_capacity(project.formats().len());

        for format in project.formats() {
            ensure_dir(&self.artifacts_root.join(format))?;

            let request = PackageRequest {
                spec_path: spec_path.to_path_buf(),
                format: format.clone(),
                output_path: self.package_path(project.project(), format, version),
                env: env.clone(),
                working_dir: working_dir.to_path_buf(),
            };

            let status = self.tool.invoke(&request)?;
            if !status.is_success() {
                tracing::error!(
                    "Packaging {} as {} failed with {}",
                    project,
                    format,
                    status
                );
            }

            artifacts.push(PackageArtifact {
                format: request.format,
                path: request.output_path,
                status,
            });
        }

        Ok(artifacts)
    }
}
