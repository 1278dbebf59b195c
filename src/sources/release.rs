//! Release lookup - which upstream release is the newest.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::core::errors::LookupError;
use crate::core::Hoster;
use crate::sources::hosting;

/// Timeout applied to every hosting API request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Looks up the latest published release of a project.
pub trait ReleaseLookup {
    /// Tag of the latest release, or `None` if the project has none.
    fn latest_tag(
        &self,
        hoster: Hoster,
        owner: &str,
        project: &str,
    ) -> Result<Option<String>, LookupError>;
}

/// Release lookup against the hosting platforms' REST APIs.
pub struct HttpReleaseLookup {
    client: Client,
}

impl HttpReleaseLookup {
    /// Create a lookup with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(HttpReleaseLookup { client })
    }
}

impl ReleaseLookup for HttpReleaseLookup {
    fn latest_tag(
        &self,
        hoster: Hoster,
        owner: &str,
        project: &str,
    ) -> Result<Option<String>, LookupError> {
        hosting::provider(hoster).latest_release_tag(&self.client, owner, project)
    }
}
