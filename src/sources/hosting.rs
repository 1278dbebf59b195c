//! Source hosting providers.
//!
//! Each [`Hoster`] maps to one [`HostingProvider`] that knows the clone URL
//! layout and the release API of that platform.

use reqwest::blocking::Client;
use serde_json::Value;

use crate::core::errors::LookupError;
use crate::core::Hoster;

/// Per-platform URL construction and release lookup.
pub trait HostingProvider: Send + Sync {
    /// Canonical hostname, e.g. `github.com`.
    fn hostname(&self) -> &'static str;

    /// HTTPS clone URL for a repository.
    fn clone_url(&self, owner: &str, project: &str) -> String {
        format!("https://{}/{}/{}.git", self.hostname(), owner, project)
    }

    /// Tag of the latest published release, or `None` if there is none.
    fn latest_release_tag(
        &self,
        client: &Client,
        owner: &str,
        project: &str,
    ) -> Result<Option<String>, LookupError>;
}

/// github.com
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHub;

/// gitlab.com
#[derive(Debug, Clone, Copy, Default)]
pub struct GitLab;

static GITHUB: GitHub = GitHub;
static GITLAB: GitLab = GitLab;

/// Look up the provider for a hoster.
pub fn provider(hoster: Hoster) -> &'static dyn HostingProvider {
    match hoster {
        Hoster::GitHub => &GITHUB,
        Hoster::GitLab => &GITLAB,
    }
}

impl GitHub {
    pub fn latest_release_url(owner: &str, project: &str) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/releases/latest",
            owner, project
        )
    }
}

impl HostingProvider for GitHub {
    fn hostname(&self) -> &'static str {
        "github.com"
    }

    fn latest_release_tag(
        &self,
        client: &Client,
        owner: &str,
        project: &str,
    ) -> Result<Option<String>, LookupError> {
        let url = GitHub::latest_release_url(owner, project);
        Ok(get_json(client, &url)?.as_ref().and_then(tag_name))
    }
}

impl GitLab {
    pub fn project_url(owner: &str, project: &str) -> String {
        format!(
            "https://gitlab.com/api/v4/projects/{}%2F{}",
            owner, project
        )
    }

    pub fn releases_url(project_id: u64) -> String {
        format!("https://gitlab.com/api/v4/projects/{}/releases", project_id)
    }
}

impl HostingProvider for GitLab {
    fn hostname(&self) -> &'static str {
        "gitlab.com"
    }

    fn latest_release_tag(
        &self,
        client: &Client,
        owner: &str,
        project: &str,
    ) -> Result<Option<String>, LookupError> {
        let url = GitLab::project_url(owner, project);
        let project_id = match get_json(client, &url)?.as_ref().and_then(project_id) {
            Some(id) => id,
            None => return Ok(None),
        };

        let url = GitLab::releases_url(project_id);
        Ok(get_json(client, &url)?.as_ref().and_then(first_release_tag))
    }
}

/// GET a JSON document. Non-success statuses yield `Ok(None)`.
fn get_json(client: &Client, url: &str) -> Result<Option<Value>, LookupError> {
    tracing::debug!("GET {}", url);

    let response = client.get(url).send().map_err(|source| LookupError::Http {
        url: url.to_string(),
        source,
    })?;

    if !response.status().is_success() {
        tracing::debug!("{} answered {}", url, response.status());
        return Ok(None);
    }

    response
        .json::<Value>()
        .map(Some)
        .map_err(|e| LookupError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// `tag_name` of a single release object.
pub(crate) fn tag_name(release: &Value) -> Option<String> {
    release
        .get("tag_name")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Numeric `id` of a GitLab project object.
pub(crate) fn project_id(project: &Value) -> Option<u64> {
    project.get("id").and_then(Value::as_u64)
}

/// `tag_name` of the first (newest) entry of a GitLab release list.
pub(crate) fn first_release_tag(releases: &Value) -> Option<String> {
    releases.as_array()?.first().and_then(tag_name)
}
