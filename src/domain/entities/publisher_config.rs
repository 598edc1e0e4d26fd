use crate::common::error::PublisherError;
use crate::common::result::{OptionExt, PublisherResult};
use crate::domain::value_objects::github_repo::GithubRepo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// A named place to publish to: one branch of one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DeploymentTarget {
    /// Remote branch receiving the published files
    #[validate(length(min = 1, message = "branch must not be empty"))]
    pub branch: String,

    /// `owner/name` of the target repository
    #[serde(rename = "repo")]
    pub github_repo: GithubRepo,

    /// Custom domain written to `CNAME`
    #[serde(rename = "url", default, skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
}

impl DeploymentTarget {
    pub fn new(branch: impl Into<String>, github_repo: GithubRepo) -> Self {
        Self {
            branch: branch.into(),
            github_repo,
            custom_url: None,
        }
    }

    pub fn with_custom_url(mut self, url: impl Into<String>) -> Self {
        self.custom_url = Some(url.into());
        self
    }

    /// The custom domain, if one is configured and not blank
    pub fn custom_domain(&self) -> Option<&str> {
        self.custom_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Contents of `publisher.yml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PublisherConfig {
    /// Commit message template, `${SHA}`, `${TAG}` and `${DATE}` are expanded
    #[serde(rename = "message", default)]
    #[validate(length(min = 1, message = "commit message must not be empty"))]
    pub commit_message: String,

    /// Globs of project files that are never published
    #[serde(rename = "exclude", default)]
    pub excluded_files: Vec<String>,

    /// Globs of project files to publish, relative to the project root
    #[serde(default)]
    pub files: Vec<String>,

    /// Command run in the project root before files are copied
    #[serde(rename = "preRun", default, skip_serializing_if = "Option::is_none")]
    pub pre_run_script: Option<String>,

    #[serde(default)]
    pub targets: BTreeMap<String, DeploymentTarget>,
}

impl PublisherConfig {
    pub fn new(commit_message: impl Into<String>) -> Self {
        Self {
            commit_message: commit_message.into(),
            excluded_files: Vec::new(),
            files: Vec::new(),
            pre_run_script: None,
            targets: BTreeMap::new(),
        }
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    pub fn with_excluded_files(mut self, excluded_files: Vec<String>) -> Self {
        self.excluded_files = excluded_files;
        self
    }

    pub fn with_pre_run_script(mut self, script: impl Into<String>) -> Self {
        self.pre_run_script = Some(script.into());
        self
    }

    pub fn with_target(mut self, name: impl Into<String>, target: DeploymentTarget) -> Self {
        self.targets.insert(name.into(), target);
        self
    }

    /// Look up a target by the name given on the command line
    pub fn resolve_target(&self, name: &str) -> PublisherResult<&DeploymentTarget> {
        self.targets
            .get(name)
            .ok_or_config_error(format!("{} is not a valid deployment target", name))
    }

    /// The pre-run command, unless it is missing or blank
    pub fn pre_run_command(&self) -> Option<&str> {
        self.pre_run_script
            .as_deref()
            .map(str::trim)
            .filter(|script| !script.is_empty())
    }

    /// Validate the config and every target in it
    pub fn validate_all(&self) -> PublisherResult<()> {
        self.validate().map_err(|e| {
            PublisherError::validation_error("message", e.to_string(), None)
        })?;

        for (name, target) in &self.targets {
            target.validate().map_err(|e| {
                PublisherError::validation_error(
                    format!("targets.{}", name),
                    e.to_string(),
                    Some(target.branch.clone()),
                )
            })?;
        }

        Ok(())
    }
}
