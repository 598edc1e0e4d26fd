use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while parsing an `owner/name` repository identifier
#[derive(Debug, Error, PartialEq)]
pub enum GithubRepoError {
    #[error("Empty repository identifier")]
    Empty,

    #[error("Repository must be in the form owner/name: {0}")]
    InvalidFormat(String),

    #[error("Invalid characters in repository identifier: {0}")]
    InvalidCharacters(String),

    #[error("Path traversal in repository identifier: {0}")]
    PathTraversal(String),
}

/// Where target repositories are fetched from and pushed to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RemoteBase {
    /// `git@github.com:owner/name.git`
    #[default]
    GithubSsh,
    /// `<base>/owner/name.git`, e.g. `https://git.example.com` or a local directory
    Custom(String),
}

impl RemoteBase {
    /// Build from an optional override; blank overrides fall back to GitHub over SSH.
    pub fn from_override(base: Option<&str>) -> Self {
        match base.map(str::trim) {
            Some(base) if !base.is_empty() => Self::Custom(base.to_string()),
            _ => Self::GithubSsh,
        }
    }
}

/// A GitHub style `owner/name` repository identifier.
///
/// The identifier doubles as the relative location of the local clone inside
/// the cache, so anything that could escape that directory is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GithubRepo {
    owner: String,
    name: String,
}

impl GithubRepo {
    pub fn new(identifier: &str) -> Result<Self, GithubRepoError> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return Err(GithubRepoError::Empty);
        }

        let parts: Vec<&str> = trimmed.split('/').collect();
        let (owner, name) = match parts.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => (*owner, *name),
            _ => return Err(GithubRepoError::InvalidFormat(trimmed.to_string())),
        };

        for part in [owner, name] {
            if part == "." || part == ".." {
                return Err(GithubRepoError::PathTraversal(trimmed.to_string()));
            }
            if !part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            {
                return Err(GithubRepoError::InvalidCharacters(trimmed.to_string()));
            }
        }

        // `name.git` and `name` address the same repository
        let name = name.strip_suffix(".git").unwrap_or(name);
        if name.is_empty() {
            return Err(GithubRepoError::InvalidFormat(trimmed.to_string()));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// SSH remote on github.com
    pub fn to_ssh_url(&self) -> String {
        format!("git@github.com:{}/{}.git", self.owner, self.name)
    }

    /// Remote URL for the given base
    pub fn remote_url(&self, base: &RemoteBase) -> String {
        match base {
            RemoteBase::GithubSsh => self.to_ssh_url(),
            RemoteBase::Custom(base) => format!(
                "{}/{}/{}.git",
                base.trim_end_matches('/'),
                self.owner,
                self.name
            ),
        }
    }

    /// Location of the local clone below `repos_dir`
    pub fn local_path(&self, repos_dir: &Path) -> PathBuf {
        repos_dir.join(&self.owner).join(&self.name)
    }
}

impl fmt::Display for GithubRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl TryFrom<&str> for GithubRepo {
    type Error = GithubRepoError;

    fn try_from(identifier: &str) -> Result<Self, Self::Error> {
        GithubRepo::new(identifier)
    }
}

impl TryFrom<String> for GithubRepo {
    type Error = GithubRepoError;

    fn try_from(identifier: String) -> Result<Self, Self::Error> {
        GithubRepo::new(&identifier)
    }
}

impl From<GithubRepo> for String {
    fn from(repo: GithubRepo) -> Self {
        repo.to_string()
    }
}
