//! Configuration file support for batch-nfpm.
//!
//! The configuration is a TOML document with a single `[builds]` table. It is
//! read from, in order of precedence:
//! - the location given on the command line (a path or an http(s) URL)
//! - `./batch-nfpm.toml`
//! - the per-user config directory (`~/.config/batch-nfpm/config.toml`)
//! - `/etc/batch-nfpm/config.toml`
//!
//! Command line flags override individual values after loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{
    BatchConfig, BuildDefinition, ConfigError, Hoster, PackagingConfigLocator, ProjectSpec,
};

/// Name of the config file in the working directory.
pub const LOCAL_CONFIG_NAME: &str = "batch-nfpm.toml";

/// System-wide config location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/batch-nfpm/config.toml";

/// The parsed config file, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub builds: Option<BuildsSection>,
}

/// The `[builds]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildsSection {
    /// Projects to build, in build order
    pub build_configurations: Vec<ProjectEntry>,

    /// Where package files are written
    pub artifacts_path: Option<PathBuf>,

    /// Where upstream sources are checked out
    pub clone_path: Option<PathBuf>,

    /// Package repository to compare published versions against
    #[serde(alias = "dnf_repository")]
    pub package_repository: Option<String>,

    /// Where packaging specs are found
    pub nfpm_config: Option<NfpmConfigEntry>,

    /// Always rebuild, ignoring published versions
    pub force: bool,
}

/// `nfpm_config` is either a bare local path or a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NfpmConfigEntry {
    Path(PathBuf),
    Detailed {
        #[serde(default)]
        local_path: Option<PathBuf>,
        #[serde(default)]
        fetch_resource: Option<String>,
    },
}

/// One `[[builds.build_configurations]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    pub owner: String,
    pub project: String,
    /// `github` (default) or `gitlab`
    pub hoster: Option<String>,
    pub buildsteps: Vec<BuildEntry>,
    pub formats: Vec<String>,
    pub config_file: Option<String>,
    pub package_name: Option<String>,
}

/// One per-architecture build of a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildEntry {
    pub arch: String,
    pub buildsteps: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Parse a config document. `location` is only used in errors.
    pub fn parse(contents: &str, location: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            location: location.to_string(),
            source,
        })
    }

    /// Validate into a [`BatchConfig`].
    pub fn into_batch_config(self) -> Result<BatchConfig, ConfigError> {
        let builds = self.builds.ok_or(ConfigError::MissingField("builds"))?;

        let projects = builds
            .build_configurations
            .into_iter()
            .map(ProjectEntry::into_project)
            .collect::<Result<Vec<_>, _>>()?;

        let locator = match builds.nfpm_config {
            None => return Err(ConfigError::MissingField("nfpm_config")),
            Some(NfpmConfigEntry::Path(path)) => PackagingConfigLocator::new(path, None)?,
            Some(NfpmConfigEntry::Detailed {
                local_path,
                fetch_resource,
            }) => PackagingConfigLocator::new(local_path.unwrap_or_default(), fetch_resource)?,
        };

        let config = BatchConfig::new(
            projects,
            builds.artifacts_path.unwrap_or_default(),
            builds.clone_path.unwrap_or_default(),
            locator,
        )?
        .with_package_repository(builds.package_repository)
        .with_force(builds.force);

        Ok(config)
    }
}

impl ProjectEntry {
    fn into_project(self) -> Result<ProjectSpec, ConfigError> {
        let name = format!("{}/{}", self.owner, self.project);

        let hoster = match self.hoster.as_deref() {
            Some(h) if !h.trim().is_empty() => h.parse::<Hoster>()?,
            _ => Hoster::default(),
        };

        let builds = self
            .buildsteps
            .into_iter()
            .map(|b| BuildDefinition::new(b.arch, b.buildsteps, b.env))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| ConfigError::InvalidProject {
                project: name.clone(),
                reason,
            })?;

        let mut project = ProjectSpec::new(self.owner, self.project, hoster, builds)?
            .with_formats(self.formats)?;
        if let Some(config_file) = self.config_file.filter(|c| !c.trim().is_empty()) {
            project = project.with_config_file(config_file)?;
        }
        if let Some(package_name) = self.package_name.filter(|p| !p.trim().is_empty()) {
            project = project.with_package_name(package_name);
        }

        Ok(project)
    }
}

/// Values from the command line that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub force: bool,
    pub artifacts_path: Option<PathBuf>,
    pub clone_path: Option<PathBuf>,
    pub package_repository: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(self, mut config: BatchConfig) -> BatchConfig {
        if let Some(repository) = self.package_repository {
            config = config.with_package_repository(Some(repository));
        }
        if let Some(path) = self.clone_path {
            config = config.with_clone_path(path);
        }
        if let Some(path) = self.artifacts_path {
            config = config.with_artifacts_path(path);
        }
        if self.force {
            config = config.with_force(true);
        }
        config
    }
}

/// Config locations searched when none is given explicitly.
pub fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(LOCAL_CONFIG_NAME)];
    if let Some(dirs) = directories::ProjectDirs::from("", "", "batch-nfpm") {
        locations.push(dirs.config_dir().join("config.toml"));
    }
    locations.push(PathBuf::from(SYSTEM_CONFIG_PATH));
    locations
}

/// Read the raw config document.
///
/// Returns the resolved location together with the contents.
pub fn read_config(location: Option<&str>) -> Result<(String, String), ConfigError> {
    match location {
        Some(url) if is_remote(url) => Ok((url.to_string(), fetch_remote(url)?)),
        Some(path) => Ok((path.to_string(), read_local(Path::new(path))?)),
        None => {
            let searched = default_locations();
            let found = searched.iter().find(|p| p.is_file()).cloned();
            match found {
                Some(path) => {
                    let contents = read_local(&path)?;
                    Ok((path.display().to_string(), contents))
                }
                None => Err(ConfigError::NotFound { searched }),
            }
        }
    }
}

/// Read, parse and validate the config.
pub fn load_config(location: Option<&str>) -> Result<BatchConfig, ConfigError> {
    let (location, contents) = read_config(location)?;
    tracing::debug!("Reading config from {}", location);
    ConfigFile::parse(&contents, &location)?.into_batch_config()
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

fn read_local(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        location: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn fetch_remote(url: &str) -> Result<String, ConfigError> {
    let unreadable = |e: reqwest::Error| ConfigError::Unreadable {
        location: url.to_string(),
        reason: e.to_string(),
    };

    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .and_then(|client| client.get(url).send())
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(unreadable)
}
