//! Checks run once before a batch starts.

use std::path::{Path, PathBuf};

use crate::core::PreconditionError;
use crate::util::process::{find_executable, ProcessBuilder};

/// Make sure the packaging tool `program` is on `PATH` and can be started.
///
/// Returns the resolved path of the tool. `program` may also be a path; it
/// is then checked as-is.
pub fn check_packaging_tool(program: &str) -> Result<PathBuf, PreconditionError> {
    let path = if Path::new(program).components().count() > 1 {
        let path = PathBuf::from(program);
        if !path.is_file() {
            return Err(PreconditionError::ToolNotFound {
                tool: program.to_string(),
            });
        }
        path
    } else {
        find_executable(program).ok_or_else(|| PreconditionError::ToolNotFound {
            tool: program.to_string(),
        })?
    };
    tracing::debug!("Found {} at {}", program, path.display());

    // The exit status of `--help` is not meaningful across versions; it only
    // has to start.
    ProcessBuilder::new(&path)
        .arg("--help")
        .status_quiet()
        .map_err(|e| PreconditionError::ToolNotLaunchable {
            tool: program.to_string(),
            reason: format!("{:#}", e),
        })?;

    Ok(path)
}
