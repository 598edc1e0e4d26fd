//! Lookups on the source project, the repository being published from.

use std::path::{Path, PathBuf};

use git2::Repository;

use crate::common::error::PublisherError;
use crate::common::result::PublisherResult;

/// Work tree root of the repository containing `start`
pub fn project_root(start: &Path) -> PublisherResult<PathBuf> {
    let repo = Repository::discover(start).map_err(|e| {
        PublisherError::git_error_with_source(
            format!("{} is not inside a git repository", start.display()),
            e,
        )
    })?;

    repo.workdir()
        .map(Path::to_path_buf)
        .ok_or_else(|| PublisherError::git_error("bare repositories cannot be published from"))
}

/// Full hex id of the commit HEAD points to
pub fn head_sha(root: &Path) -> PublisherResult<String> {
    let repo = Repository::open(root)
        .map_err(|e| PublisherError::git_error_with_source("could not open project repository", e))?;
    let commit = repo
        .revparse_single("HEAD")
        .and_then(|object| object.peel_to_commit())
        .map_err(|e| PublisherError::git_error_with_source("could not resolve HEAD", e))?;
    Ok(commit.id().to_string())
}
