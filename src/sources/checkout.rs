//! Git checkouts of upstream sources and packaging specs.

use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{Commit, Repository};

use crate::core::errors::CheckoutError;

/// Clone-or-update a working copy at a given reference.
pub trait SourceCheckout {
    /// Make `local_path` a working copy of `url` at `reference`.
    ///
    /// Clones when `local_path` does not exist, otherwise fetches and switches
    /// the existing copy. `None` selects the remote's default branch.
    fn checkout(
        &self,
        url: &str,
        local_path: &Path,
        reference: Option<&str>,
    ) -> Result<PathBuf, CheckoutError>;
}

/// [`SourceCheckout`] backed by libgit2.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCheckout;

impl GitCheckout {
    pub fn new() -> Self {
        GitCheckout
    }

    fn clone_fresh(&self, url: &str, local_path: &Path) -> Result<Repository, CheckoutError> {
        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CheckoutError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        Repository::clone(url, local_path).map_err(git_error(url))
    }

    fn update(&self, url: &str, local_path: &Path) -> Result<Repository, CheckoutError> {
        let repo = Repository::open(local_path).map_err(git_error(url))?;

        {
            let mut remote = repo.find_remote("origin").map_err(git_error(url))?;
            remote
                .fetch(
                    &[
                        "+refs/heads/*:refs/remotes/origin/*",
                        "+refs/tags/*:refs/tags/*",
                    ],
                    None,
                    None,
                )
                .map_err(git_error(url))?;
        }

        Ok(repo)
    }
}

impl SourceCheckout for GitCheckout {
    fn checkout(
        &self,
        url: &str,
        local_path: &Path,
        reference: Option<&str>,
    ) -> Result<PathBuf, CheckoutError> {
        let repo = if local_path.is_dir() {
            tracing::info!(
                "Checking out `{}` for {}",
                reference.unwrap_or("default branch"),
                url
            );
            self.update(url, local_path)?
        } else {
            tracing::info!(
                "Cloning {} at `{}` to {}",
                url,
                reference.unwrap_or("default branch"),
                local_path.display()
            );
            self.clone_fresh(url, local_path)?
        };

        let commit = resolve(&repo, url, reference)?;

        repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))
            .map_err(git_error(url))?;
        repo.set_head_detached(commit.id()).map_err(git_error(url))?;

        tracing::debug!("{} is at {}", local_path.display(), commit.id());

        Ok(local_path.to_path_buf())
    }
}

/// Resolve a reference to a commit.
///
/// Named references are tried as tag, remote branch and local branch, then
/// as a revspec. Without a reference the remote default branch is used.
fn resolve<'r>(
    repo: &'r Repository,
    url: &str,
    reference: Option<&str>,
) -> Result<Commit<'r>, CheckoutError> {
    let candidates: Vec<String> = match reference {
        Some(r) => vec![
            format!("refs/tags/{}", r),
            format!("refs/remotes/origin/{}", r),
            format!("refs/heads/{}", r),
        ],
        None => vec![
            "refs/remotes/origin/HEAD".to_string(),
            "refs/remotes/origin/main".to_string(),
            "refs/remotes/origin/master".to_string(),
        ],
    };

    for name in &candidates {
        if let Ok(found) = repo.find_reference(name) {
            return found.peel_to_commit().map_err(git_error(url));
        }
    }

    let fallback = match reference {
        Some(r) => repo.revparse_single(r).and_then(|obj| obj.peel_to_commit()),
        None => repo.head().and_then(|head| head.peel_to_commit()),
    };

    fallback.map_err(|_| CheckoutError::RefNotFound {
        url: url.to_string(),
        reference: reference.unwrap_or("HEAD").to_string(),
    })
}

fn git_error(url: &str) -> impl Fn(git2::Error) -> CheckoutError + '_ {
    move |source| CheckoutError::Git {
        url: url.to_string(),
        source,
    }
}
