//! Subprocess execution utilities.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Create a process builder from an argument vector (`argv[0]` is the
    /// program). Returns `None` for an empty vector.
    pub fn from_argv<S: AsRef<str>>(argv: &[S]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        let program: &str = program.as_ref();

        let mut builder = ProcessBuilder::new(program);
        for arg in args {
            let arg: &str = arg.as_ref();
            builder = builder.arg(arg);
        }
        Some(builder)
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable for the child only.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set several environment variables for the child only.
    pub fn envs<'a, I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in vars {
            self.env.insert(key.clone(), value.clone());
        }
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the extra environment.
    pub fn get_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Get the working directory.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Run the command with inherited stdio and wait for it to exit.
    pub fn status(&self) -> Result<ProcessStatus> {
        let status = self
            .build_command()
            .status()
            .with_context(|| format!("failed to execute `{}`", self.display_command()))?;

        Ok(ProcessStatus::from_code(status.code()))
    }

    /// Run the command with all output discarded.
    pub fn status_quiet(&self) -> Result<ProcessStatus> {
        let status = self
            .build_command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("failed to execute `{}`", self.display_command()))?;

        Ok(ProcessStatus::from_code(status.code()))
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// How a finished process exited.
///
/// `code` is `None` when the process was terminated by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStatus {
    code: Option<i32>,
}

impl ProcessStatus {
    pub fn from_code(code: Option<i32>) -> Self {
        ProcessStatus { code }
    }

    pub fn success() -> Self {
        ProcessStatus { code: Some(0) }
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Something that can run a prepared command to completion.
pub trait CommandRunner {
    /// Launch the command and wait for it. `Err` means it could not be
    /// launched at all.
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessStatus>;
}

/// Runs commands as real child processes with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessStatus> {
        cmd.status()
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_success_and_failure() {
        assert!(ProcessBuilder::new("true").status_quiet().unwrap().is_success());

        let status = ProcessBuilder::new("false").status_quiet().unwrap();
        assert!(!status.is_success());
        assert_eq!(status.code(), Some(1));
    }

    #[test]
    fn test_status_missing_program() {
        let err = ProcessBuilder::new("definitely-not-a-real-program-7f3a")
            .status_quiet()
            .unwrap_err();
        assert!(err.to_string().contains("failed to execute"));
    }

    #[test]
    fn test_env_and_cwd_reach_child() {
        let tmp = tempfile::TempDir::new().unwrap();
        let status = ProcessBuilder::new("sh")
            .args(["-c", "test \"$MARKER\" = yes && touch marker"])
            .env("MARKER", "yes")
            .cwd(tmp.path())
            .status_quiet()
            .unwrap();

        assert!(status.is_success());
        assert!(tmp.path().join("marker").exists());
    }

    #[test]
    fn test_from_argv() {
        let pb = ProcessBuilder::from_argv(&["make", "-j4", "build"]).unwrap();
        assert_eq!(pb.get_program(), Path::new("make"));
        assert_eq!(pb.get_args(), &["-j4".to_string(), "build".to_string()]);
        assert!(ProcessBuilder::from_argv::<&str>(&[]).is_none());
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("nfpm").args(["-f", "nfpm.yaml", "pkg"]);
        assert_eq!(pb.display_command(), "nfpm -f nfpm.yaml pkg");
    }

    #[test]
    fn test_process_status_display() {
        assert_eq!(ProcessStatus::from_code(Some(2)).to_string(), "exit code 2");
        assert_eq!(ProcessStatus::from_code(None).to_string(), "terminated by signal");
    }
}
