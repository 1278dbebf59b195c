//! Error types shared across the batch pipeline.
//!
//! Only [`ConfigError`] and [`PreconditionError`] are fatal for a run. The
//! others are contained at the project boundary by the batch orchestrator
//! and turned into a per-project outcome.

use std::path::PathBuf;

use thiserror::Error;

/// Malformed, incomplete or unreachable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find a config file (searched: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("failed to read config from `{location}`: {reason}")]
    Unreadable { location: String, reason: String },

    #[error("failed to parse config from `{location}`")]
    Parse {
        location: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("no build configurations defined")]
    NoProjects,

    #[error("unknown hoster `{0}` (expected `github` or `gitlab`)")]
    UnknownHoster(String),

    #[error("invalid build configuration for `{project}`: {reason}")]
    InvalidProject { project: String, reason: String },
}

/// A required external tool is unavailable.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("`{tool}` was not found on PATH")]
    ToolNotFound { tool: String },

    #[error("`{tool}` could not be launched: {reason}")]
    ToolNotLaunchable { tool: String, reason: String },
}

/// A release or package-version query failed.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request to `{url}` failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from `{url}`: {reason}")]
    Decode { url: String, reason: String },
}

/// A source or packaging-config checkout failed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("git operation on `{url}` failed")]
    Git {
        url: String,
        #[source]
        source: git2::Error,
    },

    #[error("reference `{reference}` not found in `{url}`")]
    RefNotFound { url: String, reference: String },

    #[error("failed to prepare checkout directory `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A version string that cannot be ordered.
#[derive(Debug, Error)]
#[error("invalid version `{version}`: {reason}")]
pub struct VersionError {
    pub version: String,
    pub reason: String,
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
