//! Package repository metadata - which version is already published.
//!
//! Only RPM (`repodata/`) repositories are supported. The `primary` metadata
//! is fetched once per run and reduced to a `name -> version` index.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Read;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use regex::Regex;
use reqwest::blocking::Client;
use url::Url;

use crate::builder::version;
use crate::core::errors::LookupError;

/// Looks up the version of a package that is currently published.
pub trait PackageVersionLookup {
    /// Published version of `package`, or `None` if it is not published.
    fn current_version(&self, package: &str) -> Result<Option<String>, LookupError>;
}

static PRIMARY_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<data\s+type="primary">.*?<location\s+href="([^"]+)""#)
        .expect("valid regex")
});

static PACKAGE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<package\b[^>]*>(.*?)</package>").expect("valid regex"));

static PACKAGE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<name>\s*([^<\s]+)\s*</name>").expect("valid regex"));

static PACKAGE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<version\b[^>]*\bver="([^"]+)""#).expect("valid regex"));

/// An RPM repository reachable over HTTP(S).
pub struct RpmRepository {
    base: Url,
    client: Client,
    index: RefCell<Option<HashMap<String, String>>>,
}

impl RpmRepository {
    /// Create a client for the repository rooted at `base`.
    pub fn new(base: &str) -> Result<Self> {
        let mut base =
            Url::parse(base).with_context(|| format!("invalid package repository URL: {}", base))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build HTTP client")?;

        Ok(RpmRepository {
            base,
            client,
            index: RefCell::new(None),
        })
    }

    pub fn url(&self) -> &Url {
        &self.base
    }

    fn join(&self, path: &str) -> Result<Url, LookupError> {
        self.base.join(path).map_err(|e| LookupError::Decode {
            url: self.base.to_string(),
            reason: format!("invalid metadata location `{}`: {}", path, e),
        })
    }

    fn fetch(&self, url: &Url) -> Result<Vec<u8>, LookupError> {
        tracing::debug!("GET {}", url);

        let http_error = |source: reqwest::Error| LookupError::Http {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(http_error)?;

        Ok(response.bytes().map_err(http_error)?.to_vec())
    }

    fn load_index(&self) -> Result<HashMap<String, String>, LookupError> {
        let repomd_url = self.join("repodata/repomd.xml")?;
        let repomd = String::from_utf8_lossy(&self.fetch(&repomd_url)?).into_owned();

        let location = primary_location(&repomd).ok_or_else(|| LookupError::Decode {
            url: repomd_url.to_string(),
            reason: "no primary metadata listed".to_string(),
        })?;

        let primary_url = self.join(&location)?;
        let raw = self.fetch(&primary_url)?;
        let primary = decode_primary(&location, &raw).map_err(|reason| LookupError::Decode {
            url: primary_url.to_string(),
            reason,
        })?;

        let index = parse_primary(&primary);
        tracing::info!(
            "Loaded {} package(s) from repository {}",
            index.len(),
            self.base
        );
        Ok(index)
    }
}

impl std::fmt::Display for RpmRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base)
    }
}

impl PackageVersionLookup for RpmRepository {
    fn current_version(&self, package: &str) -> Result<Option<String>, LookupError> {
        if self.index.borrow().is_none() {
            let index = self.load_index()?;
            *self.index.borrow_mut() = Some(index);
        }

        Ok(self
            .index
            .borrow()
            .as_ref()
            .and_then(|index| index.get(package).cloned()))
    }
}

/// `href` of the primary metadata in a `repomd.xml` document.
fn primary_location(repomd: &str) -> Option<String> {
    PRIMARY_LOCATION
        .captures(repomd)
        .map(|caps| caps[1].to_string())
}

/// Decompress primary metadata according to its file extension.
fn decode_primary(location: &str, raw: &[u8]) -> Result<String, String> {
    if location.ends_with(".gz") {
        let mut out = String::new();
        GzDecoder::new(raw)
            .read_to_string(&mut out)
            .map_err(|e| format!("failed to decompress: {}", e))?;
        Ok(out)
    } else if location.ends_with(".xml") {
        Ok(String::from_utf8_lossy(raw).into_owned())
    } else {
        Err(format!("unsupported metadata compression: {}", location))
    }
}

/// Build a `name -> version` index from primary metadata.
///
/// When a package is listed more than once the highest version wins.
fn parse_primary(primary: &str) -> HashMap<String, String> {
    let mut index: HashMap<String, String> = HashMap::new();

    for block in PACKAGE_BLOCK.captures_iter(primary) {
        let body = &block[1];
        let (Some(name), Some(ver)) = (PACKAGE_NAME.captures(body), PACKAGE_VERSION.captures(body))
        else {
            continue;
        };
        let (name, ver) = (name[1].to_string(), ver[1].to_string());

        match index.get(&name) {
            Some(existing) if !version::is_newer(&ver, Some(existing.as_str())).unwrap_or(false) => {}
            _ => {
                index.insert(name, ver);
            }
        }
    }

    index
}
