//! Shared utilities

pub mod config;
pub mod fs;
pub mod process;

pub use config::{load_config, ConfigOverrides};
pub use process::{CommandRunner, ProcessBuilder, ProcessStatus, SystemRunner};
