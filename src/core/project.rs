//! Project definitions - what gets packaged.
//!
//! A [`ProjectSpec`] names one upstream repository together with the
//! per-architecture build steps and the package formats to produce.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::ConfigError;
use crate::sources::hosting;

/// Packaging spec file name looked up when a project does not override it.
pub const DEFAULT_CONFIG_FILE: &str = "nfpm.yaml";

/// Package format built when a project does not list any.
pub const DEFAULT_FORMAT: &str = "rpm";

/// The source hosting platform a project lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hoster {
    #[default]
    GitHub,
    GitLab,
}

impl Hoster {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hoster::GitHub => "github",
            Hoster::GitLab => "gitlab",
        }
    }
}

impl fmt::Display for Hoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hoster {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(Hoster::GitHub),
            "gitlab" => Ok(Hoster::GitLab),
            _ => Err(ConfigError::UnknownHoster(s.to_string())),
        }
    }
}

/// The build steps for a single architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDefinition {
    arch: String,
    commands: Vec<Vec<String>>,
    env: BTreeMap<String, String>,
}

impl BuildDefinition {
    /// Create a build definition from raw command lines.
    ///
    /// Each command line is split on whitespace into an argument vector.
    pub fn new<I, S>(
        arch: impl Into<String>,
        commands: I,
        env: BTreeMap<String, String>,
    ) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let arch = arch.into();
        if arch.trim().is_empty() {
            return Err("missing arch for build".to_string());
        }

        let mut split = Vec::new();
        for command in commands {
            let argv: Vec<String> = command
                .as_ref()
                .split_whitespace()
                .map(str::to_string)
                .collect();
            if argv.is_empty() {
                return Err(format!("empty build command for arch `{}`", arch));
            }
            split.push(argv);
        }

        if split.is_empty() {
            return Err(format!("missing buildsteps for arch `{}`", arch));
        }

        Ok(BuildDefinition {
            arch,
            commands: split,
            env,
        })
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Commands in execution order, each as an argument vector.
    pub fn commands(&self) -> &[Vec<String>] {
        &self.commands
    }

    /// Extra environment variables for every command of this build.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }
}

/// One buildable upstream project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSpec {
    owner: String,
    project: String,
    hoster: Hoster,
    builds: Vec<BuildDefinition>,
    formats: Vec<String>,
    config_file: String,
    package_name: String,
}

impl ProjectSpec {
    /// Create a project with default formats, packaging spec name and
    /// package name.
    pub fn new(
        owner: impl Into<String>,
        project: impl Into<String>,
        hoster: Hoster,
        builds: Vec<BuildDefinition>,
    ) -> Result<Self, ConfigError> {
        let owner = owner.into();
        let project = project.into();

        if owner.trim().is_empty() {
            return Err(ConfigError::MissingField("owner"));
        }
        if project.trim().is_empty() {
            return Err(ConfigError::MissingField("project"));
        }
        if builds.is_empty() {
            return Err(ConfigError::InvalidProject {
                project: format!("{}/{}", owner, project),
                reason: "no buildsteps defined".to_string(),
            });
        }

        Ok(ProjectSpec {
            package_name: project.clone(),
            owner,
            project,
            hoster,
            builds,
            formats: vec![DEFAULT_FORMAT.to_string()],
            config_file: DEFAULT_CONFIG_FILE.to_string(),
        })
    }

    /// Set the package formats to produce. An empty list keeps the default.
    ///
    /// Every format names a directory below the artifacts root, so it must be
    /// a non-empty single path component.
    pub fn with_formats(mut self, formats: Vec<String>) -> Result<Self, ConfigError> {
        for format in &formats {
            self.check_component("format", format)?;
        }
        if !formats.is_empty() {
            self.formats = formats;
        }
        Ok(self)
    }

    /// Override the packaging spec file name.
    pub fn with_config_file(
        mut self,
        config_file: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config_file = config_file.into();
        self.check_component("config_file", &config_file)?;
        self.config_file = config_file;
        Ok(self)
    }

    fn check_component(&self, field: &str, value: &str) -> Result<(), ConfigError> {
        let reason = if value.trim().is_empty() {
            format!("empty {}", field)
        } else if value != value.trim()
            || value.contains(['/', '\\'])
            || value == "."
            || value == ".."
        {
            format!("{} `{}` is not a plain name", field, value)
        } else {
            return Ok(());
        };

        Err(ConfigError::InvalidProject {
            project: self.to_string(),
            reason,
        })
    }

    /// Override the name used to look the package up in a package repository.
    pub fn with_package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = package_name.into();
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn hoster(&self) -> Hoster {
        self.hoster
    }

    pub fn builds(&self) -> &[BuildDefinition] {
        &self.builds
    }

    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Canonical clone URL on the project's hoster.
    pub fn clone_url(&self) -> String {
        hosting::provider(self.hoster).clone_url(&self.owner, &self.project)
    }

    /// Canonical hostname of the project's hoster.
    pub fn hostname(&self) -> &'static str {
        hosting::provider(self.hoster).hostname()
    }
}

impl fmt::Display for ProjectSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.project)
    }
}
