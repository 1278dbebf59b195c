//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use batch_nfpm::builder::packager::NFPM_BINARY;
use batch_nfpm::util::ConfigOverrides;

/// batch-nfpm - build OS packages for new upstream releases
#[derive(Parser, Debug)]
#[command(name = "batch-nfpm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Rebuild even if the published package is up to date
    #[arg(short, long, env = "NFPM_FORCE")]
    pub force: bool,

    /// Config file path or http(s) URL
    #[arg(short, long, env = "NFPM_CONFIG", value_name = "PATH|URL")]
    pub config: Option<String>,

    /// Override the artifacts output directory
    #[arg(long, env = "NFPM_ARTIFACTS_PATH", value_name = "DIR")]
    pub artifacts_path: Option<PathBuf>,

    /// Override the directory projects are cloned into
    #[arg(long, env = "NFPM_CLONE_PATH", value_name = "DIR")]
    pub clone_path: Option<PathBuf>,

    /// Override the package repository used for version comparison
    #[arg(long, env = "NFPM_PACKAGE_REPOSITORY", value_name = "URL")]
    pub package_repository: Option<String>,

    /// Packaging tool binary
    #[arg(long, env = "NFPM_BINARY", default_value = NFPM_BINARY)]
    pub nfpm: String,

    /// Enable debug output
    #[arg(short, long, env = "NFPM_VERBOSE")]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            force: self.force,
            artifacts_path: self.artifacts_path.clone(),
            clone_path: self.clone_path.clone(),
            package_repository: self.package_repository.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_from_flags() {
        let cli = Cli::try_parse_from([
            "batch-nfpm",
            "-f",
            "--artifacts-path",
            "/srv/art",
            "--package-repository",
            "https://repo.example.org/el9",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert!(overrides.force);
        assert_eq!(overrides.artifacts_path, Some(PathBuf::from("/srv/art")));
        assert_eq!(overrides.clone_path, None);
        assert_eq!(
            overrides.package_repository.as_deref(),
            Some("https://repo.example.org/el9")
        );
        assert_eq!(cli.nfpm, "nfpm");
    }
}
