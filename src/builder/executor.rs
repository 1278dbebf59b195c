//! Build executor - runs a project's build steps.

use std::fmt;
use std::path::Path;

use crate::core::BuildDefinition;
use crate::util::process::{CommandRunner, ProcessBuilder};

/// Result of compiling one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// Every command ran and exited with status 0.
    Success,

    /// A command could not be launched or exited unsuccessfully. Commands
    /// after it were not run.
    Failed {
        arch: String,
        command: String,
        reason: String,
    },
}

impl BuildStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStatus::Success => f.write_str("success"),
            BuildStatus::Failed {
                arch,
                command,
                reason,
            } => write!(f, "`{}` ({}) failed: {}", command, arch, reason),
        }
    }
}

/// Runs build commands one after another in a working directory.
pub struct BuildExecutor<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> BuildExecutor<'a> {
    /// Create a new build executor.
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        BuildExecutor { runner }
    }

    /// Run every command of every build definition, in order.
    ///
    /// Stops at the first command that fails to launch or exits non-zero.
    /// Failures are logged and reported through the returned status.
    pub fn compile(&self, builds: &[BuildDefinition], working_dir: &Path) -> BuildStatus {
        for build in builds {
            tracing::debug!("Building arch {} in {}", build.arch(), working_dir.display());

            for argv in build.commands() {
                let Some(cmd) = ProcessBuilder::from_argv(argv.as_slice()) else {
                    continue;
                };
                let cmd = cmd.envs(build.env()).cwd(working_dir);
                let command = cmd.display_command();

                tracing::info!("Executing build command '{}'", command);

                let reason = match self.runner.run(&cmd) {
                    Ok(status) if status.is_success() => continue,
                    Ok(status) => status.to_string(),
                    Err(e) => format!("{:#}", e),
                };

                tracing::error!("Could not build {}: `{}` {}", working_dir.display(), command, reason);

                return BuildStatus::Failed {
                    arch: build.arch().to_string(),
                    command,
                    reason,
                };
            }
        }

        BuildStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tempfile::TempDir;

    use super::*;
    use crate::test_support::FakeRunner;
    use crate::util::process::SystemRunner;

    fn build(arch: &str, commands: &[&str]) -> BuildDefinition {
        BuildDefinition::new(arch, commands.iter().copied(), BTreeMap::new()).unwrap()
    }

    #[test]
    fn test_compile_runs_all_commands_in_order() {
        let tmp = TempDir::new().unwrap();
        let runner = FakeRunner::new();
        let builds = vec![
            build("amd64", &["make build", "make test"]),
            build("arm64", &["make cross"]),
        ];

        let status = BuildExecutor::new(&runner).compile(&builds, tmp.path());

        assert!(status.is_success());
        assert_eq!(
            runner.commands(),
            vec!["make build", "make test", "make cross"]
        );
        for call in runner.calls() {
            assert_eq!(call.get_cwd(), Some(tmp.path()));
        }
    }

    #[test]
    fn test_compile_passes_build_env() {
        let tmp = TempDir::new().unwrap();
        let runner = FakeRunner::new();
        let mut env = BTreeMap::new();
        env.insert("GOARCH".to_string(), "arm64".to_string());
        let builds = vec![BuildDefinition::new("arm64", ["go build"], env).unwrap()];

        BuildExecutor::new(&runner).compile(&builds, tmp.path());

        let calls = runner.calls();
        assert_eq!(
            calls[0].get_env().get("GOARCH").map(String::as_str),
            Some("arm64")
        );
    }

    #[test]
    fn test_compile_stops_at_nonzero_exit() {
        let tmp = TempDir::new().unwrap();
        let runner = FakeRunner::new().exit_with("make", 2);
        let builds = vec![build("amd64", &["make build", "strip app"])];

        let status = BuildExecutor::new(&runner).compile(&builds, tmp.path());

        assert_eq!(
            status,
            BuildStatus::Failed {
                arch: "amd64".to_string(),
                command: "make build".to_string(),
                reason: "exit code 2".to_string(),
            }
        );
        assert_eq!(runner.commands(), vec!["make build"]);
    }

    #[test]
    fn test_compile_with_real_processes() {
        let tmp = TempDir::new().unwrap();
        let builds = vec![build("amd64", &["touch first", "false", "touch second"])];

        let status = BuildExecutor::new(&SystemRunner).compile(&builds, tmp.path());

        assert!(!status.is_success());
        assert!(tmp.path().join("first").exists());
        assert!(!tmp.path().join("second").exists());
    }

    #[test]
    fn test_compile_unlaunchable_command() {
        let tmp = TempDir::new().unwrap();
        let builds = vec![build(
            "amd64",
            &["definitely-not-a-real-program-7f3a", "touch after"],
        )];

        let status = BuildExecutor::new(&SystemRunner).compile(&builds, tmp.path());

        match status {
            BuildStatus::Failed { reason, .. } => assert!(reason.contains("failed to execute")),
            other => panic!("unexpected status: {:?}", other),
        }
        assert!(!tmp.path().join("after").exists());
    }
}
